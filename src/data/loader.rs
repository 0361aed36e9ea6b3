use std::path::Path;

use crate::data::datetime::parse_timestamp;
use crate::data::table::{CellValue, LogRow, LogTable};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a readable CSV file: {0}")]
    Csv(#[from] csv::Error),
    #[error("file has no header row")]
    Empty,
    #[error("time column {0:?} not found")]
    MissingTimeColumn(String),
}

/// Load the CSV at `path`, parsing `time_column` with the shared timestamp policy.
pub fn load(path: &Path, time_column: &str) -> Result<LogTable, LoadError> {
    let content = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LoadError::NotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    from_bytes(&content, time_column)
}

/// Parse CSV content held in memory. Rows whose timestamp does not parse are dropped.
pub fn from_bytes(content: &[u8], time_column: &str) -> Result<LogTable, LoadError> {
    // Fallback: treat as latin1 (each byte maps to same Unicode code point)
    let text = match std::str::from_utf8(content) {
        Ok(s) => s.to_string(),
        Err(_) => content.iter().map(|&b| b as char).collect(),
    };
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Err(LoadError::Empty),
    };
    let header: Vec<String> = header.iter().map(|s| s.trim().to_string()).collect();
    if header.iter().all(|h| h.is_empty()) {
        return Err(LoadError::Empty);
    }

    let time_idx = find_time_column(&header, time_column)
        .ok_or_else(|| LoadError::MissingTimeColumn(time_column.to_string()))?;

    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != time_idx)
        .map(|(_, name)| name.clone())
        .collect();
    let mut table = LogTable::new(header[time_idx].clone(), columns);

    let mut total = 0usize;
    for result in records {
        let record = result?;
        total += 1;
        let Some(time) = record.get(time_idx).and_then(parse_timestamp) else {
            continue;
        };
        let values = (0..header.len())
            .filter(|i| *i != time_idx)
            .map(|i| record.get(i).map_or(CellValue::Empty, CellValue::parse))
            .collect();
        table.rows.push(LogRow { time, values });
    }

    let dropped = total - table.len();
    if dropped > 0 {
        tracing::debug!("dropped {dropped} of {total} rows with unparseable {time_column:?} values");
    }
    tracing::info!(
        "loaded {} rows, {} columns besides {:?}",
        table.len(),
        table.columns.len(),
        table.time_column
    );
    Ok(table)
}

fn find_time_column(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|h| h == name).or_else(|| {
        let wanted = name.trim().to_lowercase();
        header.iter().position(|h| h.to_lowercase() == wanted)
    })
}
