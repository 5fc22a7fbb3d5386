// 📅 Date Parsing - lenient, day-first
// Values that cannot be read as a date yield None, never an error.

use crate::table::Cell;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};

/// Parse a date or date-time written by a human.
///
/// Accepted shapes:
/// - `DD/MM/YYYY`, `DD-MM-YYYY`, `DD.MM.YYYY` and the same with a two-digit year
/// - `YYYY-MM-DD` (and `/` or `.` separators)
/// - any of the above followed by ` HH:MM`, ` HH:MM:SS` or `THH:MM:SS[.fff]`
/// - RFC 3339 timestamps (offset dropped, local wall time kept)
///
/// Ambiguous day/month pairs are read day first. When the day-first reading
/// is impossible (`12/25/2024`) the month-first reading is used instead.
/// Two-digit years follow chrono's `%y`: 00-69 is 20xx, 70-99 is 19xx.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    let (date_part, time_part) = match s.find([' ', 'T']) {
        Some(pos) => (&s[..pos], Some(s[pos + 1..].trim())),
        None => (s, None),
    };

    let date = parse_date_part(date_part)?;
    let time = match time_part {
        None => NaiveTime::from_hms_opt(0, 0, 0)?,
        Some(t) => parse_time_part(t)?,
    };

    Some(date.and_time(time))
}

/// Date of a cell: dates pass through, text is parsed, anything else is invalid
pub fn parse_cell(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Text(s) => parse_date(s),
        _ => None,
    }
}

// Two-digit years come first: %Y would also read "24" as the year 24
const DAY_FIRST_FORMATS: &[&str] = &[
    "%d/%m/%y", "%d-%m-%y", "%d.%m.%y",
    "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y",
    "%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d",
];

const MONTH_FIRST_FORMATS: &[&str] = &[
    "%m/%d/%y", "%m-%d-%y", "%m.%d.%y",
    "%m/%d/%Y", "%m-%d-%Y", "%m.%d.%Y",
];

fn parse_date_part(s: &str) -> Option<NaiveDate> {
    DAY_FIRST_FORMATS
        .iter()
        .chain(MONTH_FIRST_FORMATS)
        .filter_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        // %Y takes any number of digits
        .find(|date| (1..=9999).contains(&date.year()))
}

fn parse_time_part(s: &str) -> Option<NaiveTime> {
    // Try HH:MM:SS with fractional seconds
    if let Ok(time) = NaiveTime::parse_from_str(s, "%H:%M:%S%.f") {
        return Some(time);
    }

    if let Ok(time) = NaiveTime::parse_from_str(s, "%H:%M:%S") {
        return Some(time);
    }

    // Try HH:MM
    if let Ok(time) = NaiveTime::parse_from_str(s, "%H:%M") {
        return Some(time);
    }

    None
}

// ============================================================================
// TESTS
// ============================================================================
