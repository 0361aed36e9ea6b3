use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::Html;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use crate::data::datetime::{ceil_to_minute, format_picker, parse_picker};
use crate::data::loader;
use crate::data::table::LogTable;
use crate::processing::filter::{filter, TimeRange};
use crate::processing::statistics::ColumnSummary;
use crate::render::{chart, table_html};
use crate::web::error::ServiceError;
use crate::web::templates;
use crate::web::AppContext;

type Ctx = State<Arc<AppContext>>;

pub async fn index() -> Html<String> {
    Html(templates::index())
}

/// Only `.csv` names, extension compared case-insensitively.
pub fn allowed_file(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("csv"))
}

pub async fn upload(State(ctx): Ctx, mut multipart: Multipart) -> Result<Html<String>, ServiceError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::Multipart(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(ServiceError::NoSelectedFile);
        }
        if !allowed_file(&file_name) {
            return Err(ServiceError::InvalidFileFormat);
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServiceError::Multipart(e.to_string()))?;
        tracing::info!("received {file_name:?} ({} bytes)", bytes.len());
        ctx.store.save(&bytes).await?;
        return Ok(Html(templates::uploaded()));
    }
    Err(ServiceError::NoFilePart)
}

/// Time span and plottable columns of the stored file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeInfo {
    pub min: String,
    pub max: String,
    pub columns: Vec<String>,
    pub rows: usize,
    pub generation: u64,
}

/// Load the current snapshot of the stored file off the async threads.
async fn load_stored(ctx: &Arc<AppContext>) -> Result<(LogTable, u64), ServiceError> {
    let snapshot = ctx.store.snapshot().await?;
    let time_column = ctx.config.time_column.clone();
    let table = tokio::task::spawn_blocking(move || loader::from_bytes(&snapshot.bytes, &time_column))
        .await
        .map_err(anyhow::Error::from)??;
    Ok((table, snapshot.generation))
}

async fn available_range(ctx: &Arc<AppContext>) -> Result<RangeInfo, ServiceError> {
    let (table, generation) = load_stored(ctx).await?;
    let (min, max) = table.time_bounds().ok_or(ServiceError::NoTimestamps)?;
    let numeric = table.numeric_columns();
    let columns = if numeric.is_empty() {
        table.columns.clone()
    } else {
        numeric.into_iter().map(str::to_string).collect()
    };
    Ok(RangeInfo {
        min: format_picker(&min),
        max: format_picker(&ceil_to_minute(&max)),
        columns,
        rows: table.len(),
        generation,
    })
}

pub async fn dropdown(State(ctx): Ctx) -> Result<Html<String>, ServiceError> {
    let info = available_range(&ctx).await?;
    let columns: Vec<&str> = info.columns.iter().map(String::as_str).collect();
    Ok(Html(templates::dropdown(&info.min, &info.max, &columns)))
}

pub async fn range(State(ctx): Ctx) -> Result<Json<RangeInfo>, ServiceError> {
    Ok(Json(available_range(&ctx).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct PlotForm {
    pub parameters1: Option<String>,
    pub parameters2: Option<String>,
    pub parameters3: Option<String>,
    pub fromtime: Option<String>,
    pub totime: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotRequest {
    pub columns: [String; 3],
    pub range: TimeRange,
}

impl TryFrom<PlotForm> for PlotRequest {
    type Error = ServiceError;

    fn try_from(form: PlotForm) -> Result<Self, Self::Error> {
        fn present(v: Option<String>) -> Result<String, ServiceError> {
            v.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .ok_or(ServiceError::MissingParameters)
        }
        let columns = [
            present(form.parameters1)?,
            present(form.parameters2)?,
            present(form.parameters3)?,
        ];
        let from = parse_picker(&present(form.fromtime)?).ok_or(ServiceError::InvalidDateFormat)?;
        let to = parse_picker(&present(form.totime)?).ok_or(ServiceError::InvalidDateFormat)?;
        Ok(PlotRequest {
            columns,
            range: TimeRange::new(from, to),
        })
    }
}

pub async fn plot(State(ctx): Ctx, Form(form): Form<PlotForm>) -> Result<Html<String>, ServiceError> {
    let snapshot = ctx.store.snapshot().await?;
    let request = PlotRequest::try_from(form)?;
    tracing::info!(
        "plot {:?} from {} to {} (generation {})",
        request.columns,
        request.range.from,
        request.range.to,
        snapshot.generation
    );
    let page = tokio::task::spawn_blocking(move || build_plot(&ctx, &snapshot.bytes, &request))
        .await
        .map_err(anyhow::Error::from)??;
    Ok(Html(page))
}

fn build_plot(ctx: &AppContext, bytes: &[u8], request: &PlotRequest) -> Result<String, ServiceError> {
    let table = loader::from_bytes(bytes, &ctx.config.time_column)?;
    let columns: Vec<&str> = request.columns.iter().map(String::as_str).collect();

    if !ctx.config.lenient_columns {
        let unknown = table.unknown_columns(&columns);
        if !unknown.is_empty() {
            return Err(ServiceError::UnknownColumns(
                unknown.into_iter().map(str::to_string).collect(),
            ));
        }
    }

    let filtered = filter(&table, &request.range)?;
    let rendered = chart::render(&filtered, &columns)?;
    let stats: Vec<(String, Option<ColumnSummary>)> = rendered
        .legend
        .iter()
        .map(|name| (name.clone(), ColumnSummary::of(&filtered, name)))
        .collect();
    let table_html = table_html::to_html(&filtered, &columns, ctx.config.max_table_rows);

    Ok(templates::plots(&templates::PlotPage {
        plots: &[rendered.to_base64()],
        stats: &stats,
        skipped: &rendered.skipped,
        table: &table_html,
    }))
}
