use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::QueryError;
use crate::record::Fields;

/// Inclusive range of UTC calendar days. Either side may be open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self, QueryError> {
        let range = Self { from, to };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(QueryError::InvertedRange { from, to }),
            _ => Ok(()),
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let after_start = self.from.map_or(true, |from| date >= from);
        let before_end = self.to.map_or(true, |to| date <= to);
        after_start && before_end
    }
}

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Extracts the UTC calendar day from a backend date string.
///
/// Offsets in RFC 3339 timestamps are applied before the day is taken; naive
/// timestamps are read as UTC.
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    // "2024-01-05T10:30", "2024-01-05 extra" and similar partial stamps
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Whether the record's `field` falls inside `range`.
///
/// Records without the field, with a non-string value or with a date that
/// does not parse are kept.
pub fn record_in_range<R: Fields + ?Sized>(record: &R, field: &str, range: &DateRange) -> bool {
    if !range.is_bounded() {
        return true;
    }
    let raw = match record.field(field) {
        Some(Value::String(s)) => s,
        _ => return true,
    };
    match parse_record_date(raw) {
        Some(date) => range.contains(date),
        None => {
            tracing::trace!(field, value = %raw, "unparseable record date, keeping record");
            true
        }
    }
}
