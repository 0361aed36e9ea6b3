use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::data::loader::LoadError;
use crate::processing::filter::FilterError;
use crate::render::chart::RenderError;
use crate::web::store::StoreError;

/// Everything a handler can answer with besides success.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("No file part")]
    NoFilePart,
    #[error("No selected file")]
    NoSelectedFile,
    #[error("Invalid file format, only CSV files are allowed.")]
    InvalidFileFormat,
    #[error("Invalid upload: {0}")]
    Multipart(String),
    #[error("No file uploaded yet")]
    NoFileUploaded,
    #[error("The uploaded file could not be read: {0}")]
    Unreadable(LoadError),
    #[error("No valid timestamps found in the uploaded file.")]
    NoTimestamps,
    #[error("Please select all parameters and provide valid time range.")]
    MissingParameters,
    #[error("Invalid date/time format. Please use YYYY-MM-DDTHH:MM")]
    InvalidDateFormat,
    #[error("No data available for the selected time range.")]
    EmptyRange,
    #[error("Unknown column(s): {}", .0.join(", "))]
    UnknownColumns(Vec<String>),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {self:#}");
            return (status, "Internal server error").into_response();
        }
        tracing::info!("rejected request: {self}");
        (status, self.to_string()).into_response()
    }
}

impl From<LoadError> for ServiceError {
    fn from(e: LoadError) -> Self {
        match e {
            LoadError::NotFound(_) => ServiceError::NoFileUploaded,
            LoadError::Io(e) => ServiceError::Internal(e.into()),
            other => ServiceError::Unreadable(other),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Missing => ServiceError::NoFileUploaded,
            other => ServiceError::Internal(other.into()),
        }
    }
}

impl From<FilterError> for ServiceError {
    fn from(e: FilterError) -> Self {
        match e {
            FilterError::EmptyRange => ServiceError::EmptyRange,
        }
    }
}

impl From<RenderError> for ServiceError {
    fn from(e: RenderError) -> Self {
        ServiceError::Internal(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests() {
        for e in [
            ServiceError::InvalidFileFormat,
            ServiceError::NoFileUploaded,
            ServiceError::EmptyRange,
            ServiceError::UnknownColumns(vec!["X".into()]),
        ] {
            assert_eq!(e.into_response().status(), StatusCode::BAD_REQUEST);
        }
        let internal = ServiceError::Internal(anyhow::anyhow!("boom"));
        assert_eq!(internal.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unknown_columns_message_lists_names() {
        let e = ServiceError::UnknownColumns(vec!["X".into(), "Y".into()]);
        assert_eq!(e.to_string(), "Unknown column(s): X, Y");
    }

    #[test]
    fn missing_file_maps_to_no_file_uploaded() {
        assert!(matches!(
            ServiceError::from(LoadError::NotFound("x".into())),
            ServiceError::NoFileUploaded
        ));
        assert!(matches!(
            ServiceError::from(StoreError::Missing),
            ServiceError::NoFileUploaded
        ));
    }
}
