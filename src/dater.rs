// used for the instants that datetime columns format
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;

use lazy_static::lazy_static;
use regex::Regex;

use crate::datatype::to_float;

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

lazy_static! {
    static ref UNIX: Regex = Regex::new(r"^@?-?\d+(\.\d+)?$").unwrap();
}

const DATETIME_PATTERNS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Permissive date helper handed to datetime column hooks.
///
/// Anything that cannot be understood as an instant resolves to now, so
/// formatting never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateFormatter;

impl DateFormatter {
    pub fn new() -> Self {
        Self
    }
    pub fn to_datetime(&self, value: &Value) -> NaiveDateTime {
        self.parse(value).unwrap_or_else(|| Utc::now().naive_utc())
    }
    /// Returns `None` where `to_datetime` would fall back to now.
    pub fn parse(&self, value: &Value) -> Option<NaiveDateTime> {
        match value {
            Value::Number(_) => from_unix(to_float(value)),
            Value::String(s) => parse_str(s.trim()),
            _ => None,
        }
    }
    /// Formats the value with a strftime pattern.
    pub fn format(&self, value: &Value, pattern: &str) -> String {
        self.to_datetime(value).format(pattern).to_string()
    }
    pub fn timestamp(&self, value: &Value) -> i64 {
        self.to_datetime(value).and_utc().timestamp()
    }
}

fn from_unix(seconds: f64) -> Option<NaiveDateTime> {
    if !seconds.is_finite() {
        return None;
    }
    // fractions count forward from the floor, also before the epoch
    let whole = seconds.floor();
    let nanos = (((seconds - whole) * 1e9) as u32).min(999_999_999);
    let whole = whole as i64;
    DateTime::from_timestamp(whole, nanos).map(|instant| instant.naive_utc())
}

fn parse_str(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    if UNIX.is_match(s) {
        return s.trim_start_matches('@').parse::<f64>().ok().and_then(from_unix);
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
        return Some(instant.naive_utc());
    }
    for pattern in DATETIME_PATTERNS {
        if let Ok(instant) = NaiveDateTime::parse_from_str(s, pattern) {
            return Some(instant);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return date.and_hms_opt(0, 0, 0);
    }
    // a bare time is taken as that time today
    if let Ok(time) = NaiveTime::parse_from_str(s, TIME_FORMAT) {
        return Some(Utc::now().date_naive().and_time(time));
    }
    None
}
