//! Conversion of raw client tokens into typed clause values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::error::{QueryError, Result};
use crate::value::{ClauseValue, Number, Timestamp, ValueType};

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Converts one raw token into a value of the target type.
///
/// A `None` token converts to [`ClauseValue::Null`] when the property can
/// hold null (optional properties and text); otherwise it is an error.
pub fn convert(token: Option<&str>, target: ValueType, nullable: bool) -> Result<ClauseValue> {
    let Some(raw) = token else {
        return if nullable || target == ValueType::Text {
            Ok(ClauseValue::Null)
        } else {
            Err(QueryError::conversion(None, target))
        };
    };

    let fail = || QueryError::conversion(Some(raw), target);
    let trimmed = raw.trim();

    let value = match target {
        ValueType::Text => ClauseValue::String(raw.to_string()),
        ValueType::Integer => {
            ClauseValue::Number(Number::I64(trimmed.parse().map_err(|_| fail())?))
        }
        ValueType::Unsigned => {
            ClauseValue::Number(Number::U64(trimmed.parse().map_err(|_| fail())?))
        }
        ValueType::Float => {
            let n: f64 = trimmed.parse().map_err(|_| fail())?;
            if n.is_nan() {
                return Err(fail());
            }
            ClauseValue::Number(Number::F64(n))
        }
        ValueType::Bool => ClauseValue::Bool(parse_bool(trimmed).ok_or_else(fail)?),
        ValueType::Timestamp => ClauseValue::Timestamp(parse_timestamp(trimmed).ok_or_else(fail)?),
        ValueType::Date => ClauseValue::Date(
            NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| fail())?,
        ),
        ValueType::Uuid => ClauseValue::Uuid(Uuid::parse_str(trimmed).map_err(|_| fail())?),
        ValueType::Enum(info) => {
            let d = match info.discriminant_of(trimmed) {
                Some(d) => d,
                None => trimmed
                    .parse::<u32>()
                    .ok()
                    .filter(|d| info.has_discriminant(*d))
                    .ok_or_else(fail)?,
            };
            ClauseValue::Enum(d)
        }
    };
    Ok(value)
}

/// Converts every token of a list, stopping at the first failure.
pub fn convert_all(
    tokens: &[Option<String>],
    target: ValueType,
    nullable: bool,
) -> Result<Vec<ClauseValue>> {
    tokens
        .iter()
        .map(|t| convert(t.as_deref(), target, nullable))
        .collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") || s == "1" {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") || s == "0" {
        Some(false)
    } else {
        None
    }
}

fn parse_timestamp(s: &str) -> Option<Timestamp> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(Timestamp::from(dt.with_timezone(&Utc)));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Timestamp::from(dt));
        }
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(Timestamp::from)
}
