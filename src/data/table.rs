use chrono::NaiveDateTime;
use std::fmt;

/// One cell of a non-time column.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    /// Classify a raw CSV cell. Blank cells are `Empty`, anything `f64` accepts is a number.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            CellValue::Empty
        } else if let Ok(v) = trimmed.parse::<f64>() {
            CellValue::Number(v)
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    /// Numeric view used for plotting; text and empty cells are NaN.
    pub fn as_f64(&self) -> f64 {
        match self {
            CellValue::Number(v) => *v,
            _ => f64::NAN,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(v) if v.is_nan() => write!(f, "NaN"),
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Empty => write!(f, "NaN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub time: NaiveDateTime,
    /// One value per entry of `LogTable::columns`, same order.
    pub values: Vec<CellValue>,
}

/// A loaded log: every row has a timestamp, rows stay in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogTable {
    pub time_column: String,
    /// Non-time columns in file order.
    pub columns: Vec<String>,
    pub rows: Vec<LogRow>,
}

impl LogTable {
    pub fn new(time_column: String, columns: Vec<String>) -> Self {
        Self {
            time_column,
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Earliest and latest timestamp, independent of row order.
    pub fn time_bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let mut iter = self.rows.iter().map(|r| r.time);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }

    pub fn times(&self) -> Vec<NaiveDateTime> {
        self.rows.iter().map(|r| r.time).collect()
    }

    /// Numeric values of `name`, NaN where the cell is not a number.
    pub fn series(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|r| r.values.get(idx).map_or(f64::NAN, CellValue::as_f64))
                .collect(),
        )
    }

    /// Names from `requested` that are not columns of this table, first occurrence only.
    pub fn unknown_columns<'a>(&self, requested: &[&'a str]) -> Vec<&'a str> {
        let mut unknown: Vec<&'a str> = Vec::new();
        for name in requested {
            if !self.has_column(name) && !unknown.contains(name) {
                unknown.push(name);
            }
        }
        unknown
    }

    /// Columns whose every non-empty cell is numeric and that have at least one number.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(idx, _)| {
                let mut any = false;
                for row in &self.rows {
                    match row.values.get(*idx) {
                        Some(CellValue::Number(_)) => any = true,
                        Some(CellValue::Text(_)) => return false,
                        _ => {}
                    }
                }
                any
            })
            .map(|(_, name)| name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn sample() -> LogTable {
        let mut t = LogTable::new("Time".into(), vec!["A".into(), "Mode".into()]);
        t.rows.push(LogRow {
            time: at(12),
            values: vec![CellValue::parse("1.5"), CellValue::parse("idle")],
        });
        t.rows.push(LogRow {
            time: at(9),
            values: vec![CellValue::parse(""), CellValue::parse("run")],
        });
        t
    }

    #[test]
    fn cell_classification() {
        assert_eq!(CellValue::parse(" 3 "), CellValue::Number(3.0));
        assert_eq!(CellValue::parse("-1e3"), CellValue::Number(-1000.0));
        assert_eq!(CellValue::parse("abc"), CellValue::Text("abc".into()));
        assert_eq!(CellValue::parse("  "), CellValue::Empty);
        assert_eq!(CellValue::Number(4.0).to_string(), "4");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Empty.to_string(), "NaN");
    }

    #[test]
    fn bounds_ignore_row_order() {
        assert_eq!(sample().time_bounds(), Some((at(9), at(12))));
        assert_eq!(LogTable::default().time_bounds(), None);
    }

    #[test]
    fn series_maps_non_numbers_to_nan() {
        let s = sample().series("A").unwrap();
        assert_eq!(s[0], 1.5);
        assert!(s[1].is_nan());
        assert!(sample().series("missing").is_none());
    }

    #[test]
    fn unknown_columns_are_deduplicated() {
        let t = sample();
        assert_eq!(t.unknown_columns(&["A", "X", "X", "Y"]), vec!["X", "Y"]);
        assert!(t.unknown_columns(&["A", "Mode"]).is_empty());
    }

    #[test]
    fn numeric_columns_skip_text() {
        assert_eq!(sample().numeric_columns(), vec!["A"]);
    }
}
