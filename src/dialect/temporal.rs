//! Date/time value formatting for `INSERT` and `UPDATE`.
//!
//! Values of `datetime`, `date` and `time` properties are rendered to the
//! canonical text form of the target engine before they are bound.

use crate::mapper::error::MapperError;
use crate::query::property::PropertyType;
use crate::query::value::{is_null, value_to_sql_string};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use sea_query::Value;
use std::fmt;

/// Formats a temporal value for a column of the given type
pub trait TemporalFormatter: Send + Sync + fmt::Debug {
    /// Render `value` for a column of type `kind`
    ///
    /// `NULL` always passes through unchanged.
    ///
    /// # Errors
    ///
    /// Returns `MapperError::InvalidArgument` when the value cannot be
    /// interpreted as a date/time.
    fn format_temporal(&self, kind: PropertyType, value: &Value) -> Result<Value, MapperError>;
}

/// Output patterns (chrono `strftime` syntax) per column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalFormats {
    pub datetime: &'static str,
    pub date: &'static str,
    pub time: &'static str,
}

impl TemporalFormats {
    pub const STANDARD: TemporalFormats = TemporalFormats {
        datetime: "%Y-%m-%d %H:%M:%S",
        date: "%Y-%m-%d",
        time: "%H:%M:%S",
    };

    /// Keeps fractional seconds when present
    pub const FRACTIONAL: TemporalFormats = TemporalFormats {
        datetime: "%Y-%m-%d %H:%M:%S%.f",
        date: "%Y-%m-%d",
        time: "%H:%M:%S%.f",
    };
}

impl Default for TemporalFormats {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// An interpreted temporal input
#[derive(Debug, Clone, Copy, PartialEq)]
enum Temporal {
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

fn from_structured(value: &Value) -> Option<Temporal> {
    match value {
        Value::ChronoDate(Some(d)) => {
            let d: &NaiveDate = d;
            Some(Temporal::Date(*d))
        }
        Value::ChronoTime(Some(t)) => {
            let t: &NaiveTime = t;
            Some(Temporal::Time(*t))
        }
        Value::ChronoDateTime(Some(dt)) => Some(Temporal::DateTime(NaiveDateTime::new(dt.date(), dt.time()))),
        Value::ChronoDateTimeUtc(Some(dt)) => Some(Temporal::DateTime(dt.naive_utc())),
        Value::ChronoDateTimeLocal(Some(dt)) => Some(Temporal::DateTime(dt.naive_local())),
        Value::ChronoDateTimeWithTimeZone(Some(dt)) => Some(Temporal::DateTime(dt.naive_local())),
        _ => None,
    }
}

fn render(kind: PropertyType, temporal: Temporal, formats: &TemporalFormats) -> Result<Value, MapperError> {
    let text = match (kind, temporal) {
        (PropertyType::DateTime, Temporal::DateTime(dt)) => dt.format(formats.datetime).to_string(),
        (PropertyType::DateTime, Temporal::Date(d)) => d.and_time(NaiveTime::MIN).format(formats.datetime).to_string(),
        (PropertyType::Date, Temporal::DateTime(dt)) => dt.date().format(formats.date).to_string(),
        (PropertyType::Date, Temporal::Date(d)) => d.format(formats.date).to_string(),
        (PropertyType::Time, Temporal::DateTime(dt)) => dt.time().format(formats.time).to_string(),
        (PropertyType::Time, Temporal::Time(t)) => t.format(formats.time).to_string(),
        (kind, other) => {
            return Err(MapperError::InvalidArgument(format!(
                "cannot store {:?} in a {} column",
                other, kind
            )))
        }
    };
    Ok(Value::String(Some(text)))
}

fn unrecognized(kind: PropertyType, value: &Value) -> MapperError {
    MapperError::InvalidArgument(format!(
        "unrecognized {} value {}",
        kind,
        value_to_sql_string(value)
    ))
}

/// Accepts only structured chrono values (the generic behaviour)
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredTemporal {
    pub formats: TemporalFormats,
}

impl TemporalFormatter for StructuredTemporal {
    fn format_temporal(&self, kind: PropertyType, value: &Value) -> Result<Value, MapperError> {
        if is_null(value) {
            return Ok(value.clone());
        }
        match from_structured(value) {
            Some(temporal) => render(kind, temporal, &self.formats),
            None => Err(unrecognized(kind, value)),
        }
    }
}

const DATETIME_PATTERNS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d-%b-%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

const DATE_PATTERNS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%b-%Y", "%d.%m.%Y", "%Y%m%d"];

const TIME_PATTERNS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

fn parse_text(text: &str) -> Option<Temporal> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(Temporal::DateTime(dt.naive_local()));
    }
    if let Some(dt) = DATETIME_PATTERNS
        .iter()
        .find_map(|p| NaiveDateTime::parse_from_str(text, p).ok())
    {
        return Some(Temporal::DateTime(dt));
    }
    if let Some(d) = DATE_PATTERNS.iter().find_map(|p| NaiveDate::parse_from_str(text, p).ok()) {
        return Some(Temporal::Date(d));
    }
    TIME_PATTERNS
        .iter()
        .find_map(|p| NaiveTime::parse_from_str(text, p).ok())
        .map(Temporal::Time)
}

/// Accepts structured values and common textual forms (Postgres, Oracle)
///
/// Recognized text: RFC 3339, `YYYY-MM-DD[ T]HH:MM[:SS[.fff]]`,
/// `YYYY/MM/DD HH:MM:SS`, `DD-Mon-YYYY[ HH:MM:SS]`, `DD.MM.YYYY[ HH:MM:SS]`,
/// `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYYMMDD`, `HH:MM[:SS[.fff]]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientTemporal {
    pub formats: TemporalFormats,
}

impl TemporalFormatter for LenientTemporal {
    fn format_temporal(&self, kind: PropertyType, value: &Value) -> Result<Value, MapperError> {
        if is_null(value) {
            return Ok(value.clone());
        }
        let temporal = match value {
            Value::String(Some(text)) => parse_text(text),
            other => from_structured(other),
        };
        match temporal {
            Some(temporal) => render(kind, temporal, &self.formats),
            None => Err(unrecognized(kind, value)),
        }
    }
}
