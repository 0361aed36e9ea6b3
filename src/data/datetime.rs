use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use std::sync::LazyLock;

/// Layout used by the range picker (`<input type="datetime-local">`) in both directions.
pub const PICKER_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Tick label layout on the chart's time axis.
pub const TICK_FORMAT: &str = "%d-%m-%y %H:%M";

/// Timestamp layout in the preview table.
pub const TABLE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SEPARATORS: [char; 3] = ['-', '/', '.'];

// Month names may also be separated by plain spaces ("01 Jun 2024").
const NAME_SEPARATORS: [char; 4] = ['-', '/', '.', ' '];

const TIME_FORMATS: &[&str] = &[
    "%H:%M:%S%.f",
    "%H:%M",
    "%I:%M:%S%.f %p",
    "%I:%M %p",
];

// Two-digit years come first: chrono's %Y happily reads "24" as year 24.
const DAY_FIRST: &[&str] = &["%d{s}%m{s}%y", "%d{s}%m{s}%Y"];
const MONTH_NAME: &[&str] = &["%d{s}%b{s}%y", "%d{s}%b{s}%Y"];
const MONTH_FIRST: &[&str] = &["%m{s}%d{s}%y", "%m{s}%d{s}%Y"];
const YEAR_FIRST: &[&str] = &["%Y{s}%m{s}%d"];

/// Date layouts with their separator filled in, in the order they are tried.
struct FormatTable {
    year_first: Vec<String>,
    day_first: Vec<String>,
    month_first: Vec<String>,
}

static FORMATS: LazyLock<FormatTable> = LazyLock::new(|| FormatTable {
    year_first: expand(YEAR_FIRST, &SEPARATORS),
    day_first: expand(DAY_FIRST, &SEPARATORS)
        .into_iter()
        .chain(expand(MONTH_NAME, &NAME_SEPARATORS))
        .collect(),
    month_first: expand(MONTH_FIRST, &SEPARATORS),
});

fn expand(templates: &[&str], separators: &[char]) -> Vec<String> {
    let mut out = Vec::with_capacity(templates.len() * separators.len());
    for sep in separators {
        for t in templates {
            out.push(t.replace("{s}", &sep.to_string()));
        }
    }
    out
}

/// The single timestamp policy for uploaded logs.
///
/// Mixed layouts are accepted cell by cell. A value starting with a four-digit
/// year is read year-first (RFC 3339 included). Anything else is read
/// day-first, and month-first only when the day-first reading is not a valid
/// date. The time of day may be `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fff`; a bare
/// date means midnight. Twelve-hour times with AM/PM and abbreviated month
/// names (`01-Jun-2024`) are accepted too, and date and time may be joined by
/// a space or `T`. Offsets on RFC 3339 values are dropped, keeping the wall
/// clock time the logger wrote, like every other cell. Returns `None` for
/// anything else so the caller can drop the row.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if leading_digits(value) == 4 {
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
            return Some(dt.naive_local());
        }
        return parse_with(value, &FORMATS.year_first, &[' ', 'T']);
    }

    parse_with(value, &FORMATS.day_first, &[' ', 'T'])
        .or_else(|| parse_with(value, &FORMATS.month_first, &[' ', 'T']))
}

/// Parse a `YYYY-MM-DDTHH:MM` value coming back from the range picker.
pub fn parse_picker(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), PICKER_FORMAT).ok()
}

pub fn format_picker(ts: &NaiveDateTime) -> String {
    ts.format(PICKER_FORMAT).to_string()
}

/// Round up to a whole minute, so a picker bound covers the last row's seconds.
pub fn ceil_to_minute(ts: &NaiveDateTime) -> NaiveDateTime {
    let floor = ts.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(*ts);
    if floor == *ts {
        floor
    } else {
        floor + Duration::minutes(1)
    }
}

fn parse_with(value: &str, dates: &[String], joins: &[char]) -> Option<NaiveDateTime> {
    for date in dates {
        if let Ok(d) = NaiveDate::parse_from_str(value, date) {
            return d.and_hms_opt(0, 0, 0);
        }
        for join in joins {
            for time in TIME_FORMATS {
                let fmt = format!("{date}{join}{time}");
                if let Ok(dt) = NaiveDateTime::parse_from_str(value, &fmt) {
                    return Some(dt);
                }
            }
        }
    }
    None
}

fn leading_digits(s: &str) -> usize {
    s.chars().take_while(|c| c.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn day_first_two_digit_year() {
        assert_eq!(parse_timestamp("01-06-24 10:00"), Some(dt(2024, 6, 1, 10, 0, 0)));
        assert_eq!(parse_timestamp("01/06/24 10:00:30"), Some(dt(2024, 6, 1, 10, 0, 30)));
    }

    #[test]
    fn day_first_four_digit_year() {
        assert_eq!(parse_timestamp("02.03.2024 7:05"), Some(dt(2024, 3, 2, 7, 5, 0)));
        assert_eq!(parse_timestamp("02-03-2024"), Some(dt(2024, 3, 2, 0, 0, 0)));
    }

    #[test]
    fn falls_back_to_month_first_when_day_first_is_invalid() {
        assert_eq!(parse_timestamp("12/25/2024 08:15"), Some(dt(2024, 12, 25, 8, 15, 0)));
    }

    #[test]
    fn year_first_layouts() {
        assert_eq!(parse_timestamp("2024-06-01 10:00:00"), Some(dt(2024, 6, 1, 10, 0, 0)));
        assert_eq!(parse_timestamp("2024-06-01T10:00"), Some(dt(2024, 6, 1, 10, 0, 0)));
        assert_eq!(parse_timestamp("2024/06/01"), Some(dt(2024, 6, 1, 0, 0, 0)));
        assert_eq!(
            parse_timestamp("2024-06-01T10:00:00Z"),
            Some(dt(2024, 6, 1, 10, 0, 0))
        );
    }

    #[test]
    fn offsets_keep_wall_clock_time() {
        assert_eq!(
            parse_timestamp("2024-06-01T10:00:00+02:00"),
            Some(dt(2024, 6, 1, 10, 0, 0))
        );
        assert_eq!(
            parse_timestamp("2024-06-01T10:30:00-05:00"),
            parse_timestamp("01-06-2024 10:30")
        );
    }

    #[test]
    fn twelve_hour_clock() {
        assert_eq!(parse_timestamp("01-06-2024 10:00:00 AM"), Some(dt(2024, 6, 1, 10, 0, 0)));
        assert_eq!(parse_timestamp("01-06-24 10:00 PM"), Some(dt(2024, 6, 1, 22, 0, 0)));
        assert_eq!(parse_timestamp("01/06/2024 12:15 am"), Some(dt(2024, 6, 1, 0, 15, 0)));
        assert_eq!(parse_timestamp("2024-06-01 12:30:00 PM"), Some(dt(2024, 6, 1, 12, 30, 0)));
        assert_eq!(parse_timestamp("01-06-24 13:00 PM"), None);
    }

    #[test]
    fn month_names() {
        assert_eq!(parse_timestamp("01-Jun-2024 10:00"), Some(dt(2024, 6, 1, 10, 0, 0)));
        assert_eq!(parse_timestamp("01 Jun 2024 10:00:30"), Some(dt(2024, 6, 1, 10, 0, 30)));
        assert_eq!(parse_timestamp("01-Jun-24"), Some(dt(2024, 6, 1, 0, 0, 0)));
    }

    #[test]
    fn day_first_with_t_separator() {
        assert_eq!(parse_timestamp("01-06-24T10:00"), Some(dt(2024, 6, 1, 10, 0, 0)));
        assert_eq!(parse_timestamp("01/06/2024T10:00:30"), Some(dt(2024, 6, 1, 10, 0, 30)));
    }

    #[test]
    fn fractional_seconds() {
        let parsed = parse_timestamp("2024-06-01 10:00:00.250").unwrap();
        assert_eq!(parsed.and_utc().timestamp_subsec_millis(), 250);
    }

    #[test]
    fn mixed_layouts_agree() {
        let a = parse_timestamp("01-06-2024 10:00");
        let b = parse_timestamp("2024-06-01 10:00");
        let c = parse_timestamp("01/06/24 10:00");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp("32-13-24 10:00"), None);
        assert_eq!(parse_timestamp("01-06-24 25:00"), None);
    }

    #[test]
    fn ceil_to_minute_only_moves_partial_minutes() {
        assert_eq!(ceil_to_minute(&dt(2024, 6, 1, 11, 0, 0)), dt(2024, 6, 1, 11, 0, 0));
        assert_eq!(ceil_to_minute(&dt(2024, 6, 1, 11, 0, 30)), dt(2024, 6, 1, 11, 1, 0));
        assert_eq!(ceil_to_minute(&dt(2024, 6, 1, 23, 59, 1)), dt(2024, 6, 2, 0, 0, 0));
    }

    #[test]
    fn picker_round_trip() {
        let ts = parse_picker("2024-06-01T10:00").unwrap();
        assert_eq!(ts, dt(2024, 6, 1, 10, 0, 0));
        assert_eq!(format_picker(&ts), "2024-06-01T10:00");
        assert!(parse_picker("01-06-24 10:00").is_none());
    }
}
