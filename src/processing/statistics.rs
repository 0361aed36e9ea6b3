use chrono::NaiveDateTime;

use crate::data::table::{CellValue, LogTable};

/// One logged value and the row time it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub time: NaiveDateTime,
    pub value: f64,
}

/// What happened to one column over a (filtered) log.
///
/// `gaps` counts rows whose cell is empty, text or not finite. `low` and
/// `high` keep the first row reaching the extreme; `latest` is the reading
/// with the newest timestamp, the later row winning a tie.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub samples: usize,
    pub gaps: usize,
    pub low: Reading,
    pub high: Reading,
    pub latest: Reading,
    pub mean: f64,
}

impl ColumnSummary {
    /// `None` when `column` is not in the table or has no numeric cell.
    pub fn of(table: &LogTable, column: &str) -> Option<Self> {
        let idx = table.column_index(column)?;
        let mut acc: Option<(ColumnSummary, f64)> = None;
        let mut gaps = 0;

        for row in &table.rows {
            let value = match row.values.get(idx) {
                Some(CellValue::Number(v)) if v.is_finite() => *v,
                _ => {
                    gaps += 1;
                    continue;
                }
            };
            let reading = Reading { time: row.time, value };
            match acc.as_mut() {
                None => {
                    acc = Some((
                        ColumnSummary {
                            samples: 1,
                            gaps: 0,
                            low: reading,
                            high: reading,
                            latest: reading,
                            mean: 0.0,
                        },
                        value,
                    ))
                }
                Some((s, sum)) => {
                    s.samples += 1;
                    *sum += value;
                    if value < s.low.value {
                        s.low = reading;
                    }
                    if value > s.high.value {
                        s.high = reading;
                    }
                    if reading.time >= s.latest.time {
                        s.latest = reading;
                    }
                }
            }
        }

        let (mut summary, sum) = acc?;
        summary.gaps = gaps;
        summary.mean = sum / summary.samples as f64;
        Some(summary)
    }
}
