//! Formatting and parsing of the date/time input field.
//!
//! The input holds a local date/time with minute precision and no offset,
//! e.g. `2025-03-08T05:08`. Seconds are accepted on input so values copied
//! from the service's ISO output still parse.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

/// `strftime` pattern of the date/time input
pub const DATETIME_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

const DATETIME_INPUT_FORMAT_SECS: &str = "%Y-%m-%dT%H:%M:%S";

/// Format an instant as a date/time input value in that instant's zone.
#[must_use]
pub fn format_datetime_input<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(DATETIME_INPUT_FORMAT).to_string()
}

/// The current local time as a date/time input value.
#[must_use]
pub fn datetime_input_now() -> String {
    format_datetime_input(&Local::now())
}

/// Parse a date/time input value, with or without seconds.
#[must_use]
pub fn parse_datetime_input(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, DATETIME_INPUT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, DATETIME_INPUT_FORMAT_SECS))
        .ok()
}
