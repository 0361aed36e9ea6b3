use chrono::NaiveDateTime;

use crate::data::table::LogTable;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("no data available for the selected time range")]
    EmptyRange,
}

/// Inclusive time window. An inverted window (`from > to`) matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl TimeRange {
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        Self { from, to }
    }

    pub fn is_inverted(&self) -> bool {
        self.from > self.to
    }

    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        self.from <= *ts && *ts <= self.to
    }
}

/// Rows of `table` inside `range`, in file order.
pub fn filter(table: &LogTable, range: &TimeRange) -> Result<LogTable, FilterError> {
    if range.is_inverted() {
        return Err(FilterError::EmptyRange);
    }
    let rows: Vec<_> = table
        .rows
        .iter()
        .filter(|r| range.contains(&r.time))
        .cloned()
        .collect();
    if rows.is_empty() {
        return Err(FilterError::EmptyRange);
    }
    tracing::debug!("{} of {} rows within {:?}", rows.len(), table.len(), range);
    Ok(LogTable {
        time_column: table.time_column.clone(),
        columns: table.columns.clone(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::from_bytes;
    use crate::data::datetime::parse_timestamp;

    fn table() -> LogTable {
        let csv = "Time,A\n\
                   01-06-24 10:00,1\n\
                   01-06-24 11:00,2\n\
                   01-06-24 09:30,3\n\
                   01-06-24 12:00,4\n";
        from_bytes(csv.as_bytes(), "Time").unwrap()
    }

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn bounds_are_inclusive() {
        let range = TimeRange::new(ts("01-06-24 10:00"), ts("01-06-24 11:00"));
        let out = filter(&table(), &range).unwrap();
        assert_eq!(out.series("A").unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn only_rows_in_range_survive() {
        let t = table();
        let range = TimeRange::new(ts("01-06-24 09:45"), ts("01-06-24 11:59"));
        let out = filter(&t, &range).unwrap();
        assert!(out.rows.iter().all(|r| range.contains(&r.time)));
        let expected = t.rows.iter().filter(|r| range.contains(&r.time)).count();
        assert_eq!(out.len(), expected);
        assert_eq!(out.columns, t.columns);
    }

    #[test]
    fn point_range_matches_single_row() {
        let at = ts("01-06-24 12:00");
        let out = filter(&table(), &TimeRange::new(at, at)).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn empty_intersection_is_an_error() {
        let range = TimeRange::new(ts("02-06-24 00:00"), ts("03-06-24 00:00"));
        assert_eq!(filter(&table(), &range), Err(FilterError::EmptyRange));
    }

    #[test]
    fn inverted_range_is_an_error() {
        let range = TimeRange::new(ts("01-06-24 12:00"), ts("01-06-24 09:00"));
        assert!(range.is_inverted());
        assert_eq!(filter(&table(), &range), Err(FilterError::EmptyRange));
    }
}
