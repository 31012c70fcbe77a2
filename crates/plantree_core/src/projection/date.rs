//! Textual date contract for plan fields.
//!
//! # Responsibility
//! - Parse `dd-mm-yyyy` and `yyyy-mm-dd` inputs.
//! - Render every date as `dd-mm-yyyy`.
//!
//! # Invariants
//! - Unparseable text is "absent", never an error.
//! - A four-digit first component selects ISO order.

use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_PARTS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{1,4})[-/.](\d{1,2})[-/.](\d{1,4})\s*$").expect("valid date regex")
});

/// Output format for every normalized date.
pub const DISPLAY_FORMAT: &str = "%d-%m-%Y";

/// Parses a plan date in regional or ISO order.
///
/// Returns `None` for anything that is not three numeric components forming
/// a real calendar day.
pub fn parse_plan_date(input: &str) -> Option<NaiveDate> {
    let captures = DATE_PARTS_RE.captures(input)?;
    let first = captures.get(1)?.as_str();
    let month: u32 = captures.get(2)?.as_str().parse().ok()?;
    let last = captures.get(3)?.as_str();

    let (year, day) = if first.len() == 4 {
        (first.parse::<i32>().ok()?, last.parse::<u32>().ok()?)
    } else {
        (last.parse::<i32>().ok()?, first.parse::<u32>().ok()?)
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses an optional stored field.
pub fn parse_optional(input: Option<&str>) -> Option<NaiveDate> {
    input.and_then(parse_plan_date)
}

pub fn format_plan_date(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

/// Re-renders a stored date in display form, or `None` when unparseable.
pub fn normalize_plan_date(input: &str) -> Option<String> {
    parse_plan_date(input).map(format_plan_date)
}

/// `start + days`, saturating to `None` on calendar overflow.
pub fn add_days(start: NaiveDate, days: u32) -> Option<NaiveDate> {
    start.checked_add_days(Days::new(u64::from(days)))
}

/// Whole days from `start` to `end`; zero when `end` precedes `start`.
pub fn day_span(start: NaiveDate, end: NaiveDate) -> u32 {
    let days = (end - start).num_days();
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}
