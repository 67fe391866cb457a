//! Helpers over `sea_query::Value`, the value currency of parameters and rows.

use sea_query::Value;

/// `true` when the value is SQL `NULL`
pub fn is_null(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Char(None)
            | Value::Bytes(None)
            | Value::Json(None)
            | Value::ChronoDate(None)
            | Value::ChronoTime(None)
            | Value::ChronoDateTime(None)
            | Value::ChronoDateTimeUtc(None)
            | Value::ChronoDateTimeLocal(None)
            | Value::ChronoDateTimeWithTimeZone(None)
            | Value::Uuid(None)
            | Value::Decimal(None)
    )
}

/// `true` for an id that has not been assigned yet: `NULL`, `0` or an empty string
pub fn is_unassigned_id(value: &Value) -> bool {
    if is_null(value) {
        return true;
    }
    match value {
        Value::TinyInt(Some(0))
        | Value::SmallInt(Some(0))
        | Value::Int(Some(0))
        | Value::BigInt(Some(0))
        | Value::TinyUnsigned(Some(0))
        | Value::SmallUnsigned(Some(0))
        | Value::Unsigned(Some(0))
        | Value::BigUnsigned(Some(0)) => true,
        Value::String(Some(s)) => s.is_empty() || s == "0",
        _ => false,
    }
}

/// Non-negative integer held by `value`, whatever its integer width
///
/// Counts come back as `BIGINT`, `NUMERIC` or text depending on the engine.
pub fn value_to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::TinyInt(Some(i)) => u64::try_from(*i).ok(),
        Value::SmallInt(Some(i)) => u64::try_from(*i).ok(),
        Value::Int(Some(i)) => u64::try_from(*i).ok(),
        Value::BigInt(Some(i)) => u64::try_from(*i).ok(),
        Value::TinyUnsigned(Some(u)) => Some(u64::from(*u)),
        Value::SmallUnsigned(Some(u)) => Some(u64::from(*u)),
        Value::Unsigned(Some(u)) => Some(u64::from(*u)),
        Value::BigUnsigned(Some(u)) => Some(*u),
        Value::Decimal(Some(d)) => d.to_string().parse().ok(),
        Value::String(Some(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::TinyInt(Some(i)) => Some(i64::from(*i)),
        Value::SmallInt(Some(i)) => Some(i64::from(*i)),
        Value::Int(Some(i)) => Some(i64::from(*i)),
        Value::BigInt(Some(i)) => Some(*i),
        Value::TinyUnsigned(Some(u)) => Some(i64::from(*u)),
        Value::SmallUnsigned(Some(u)) => Some(i64::from(*u)),
        Value::Unsigned(Some(u)) => Some(i64::from(*u)),
        Value::BigUnsigned(Some(u)) => i64::try_from(*u).ok(),
        _ => None,
    }
}

/// Convert an integer `value` to the variant of `template`
///
/// Drivers report generated ids in their widest integer type; the entity
/// keeps the variant its id was declared with. Non-integer values, other
/// templates and values that do not fit are returned unchanged.
pub fn coerce_integer_like(template: &Value, value: Value) -> Value {
    let Some(n) = value_to_i64(&value) else {
        return value;
    };
    let converted = match template {
        Value::TinyInt(_) => i8::try_from(n).ok().map(|n| Value::TinyInt(Some(n))),
        Value::SmallInt(_) => i16::try_from(n).ok().map(|n| Value::SmallInt(Some(n))),
        Value::Int(_) => i32::try_from(n).ok().map(|n| Value::Int(Some(n))),
        Value::BigInt(_) => Some(Value::BigInt(Some(n))),
        Value::TinyUnsigned(_) => u8::try_from(n).ok().map(|n| Value::TinyUnsigned(Some(n))),
        Value::SmallUnsigned(_) => u16::try_from(n).ok().map(|n| Value::SmallUnsigned(Some(n))),
        Value::Unsigned(_) => u32::try_from(n).ok().map(|n| Value::Unsigned(Some(n))),
        Value::BigUnsigned(_) => u64::try_from(n).ok().map(|n| Value::BigUnsigned(Some(n))),
        Value::String(_) => Some(Value::from(n.to_string())),
        _ => None,
    };
    converted.unwrap_or(value)
}

/// Render a value as an inline SQL literal
///
/// Only used to log a readable form of a statement; compiled statements
/// always bind values as parameters.
pub fn value_to_sql_string(value: &Value) -> String {
    if is_null(value) {
        return "NULL".to_string();
    }
    match value {
        Value::Bool(Some(b)) => b.to_string(),
        Value::TinyInt(Some(i)) => i.to_string(),
        Value::SmallInt(Some(i)) => i.to_string(),
        Value::Int(Some(i)) => i.to_string(),
        Value::BigInt(Some(i)) => i.to_string(),
        Value::TinyUnsigned(Some(u)) => u.to_string(),
        Value::SmallUnsigned(Some(u)) => u.to_string(),
        Value::Unsigned(Some(u)) => u.to_string(),
        Value::BigUnsigned(Some(u)) => u.to_string(),
        Value::Float(Some(f)) => f.to_string(),
        Value::Double(Some(d)) => d.to_string(),
        Value::String(Some(s)) => format!("'{}'", s.replace('\'', "''")),
        Value::Char(Some(c)) => format!("'{}'", c.to_string().replace('\'', "''")),
        Value::Bytes(Some(b)) => {
            let hex: String = b.iter().map(|byte| format!("{:02x}", byte)).collect();
            format!("X'{}'", hex)
        }
        Value::Json(Some(j)) => format!("'{}'", j.to_string().replace('\'', "''")),
        Value::ChronoDate(Some(d)) => format!("'{}'", d.format("%Y-%m-%d")),
        Value::ChronoTime(Some(t)) => format!("'{}'", t.format("%H:%M:%S")),
        Value::ChronoDateTime(Some(dt)) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S")),
        Value::ChronoDateTimeUtc(Some(dt)) => format!("'{}'", dt.to_rfc3339()),
        Value::ChronoDateTimeLocal(Some(dt)) => format!("'{}'", dt.to_rfc3339()),
        Value::ChronoDateTimeWithTimeZone(Some(dt)) => format!("'{}'", dt.to_rfc3339()),
        Value::Uuid(Some(u)) => format!("'{}'", u),
        Value::Decimal(Some(d)) => d.to_string(),
        other => format!("{:?}", other),
    }
}
