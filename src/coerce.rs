//! Field coercion: converting raw JSON values to their declared field type.
//!
//! | Declared type | Already matching | Otherwise |
//! |---------------|------------------|-----------|
//! | `Boolean` | kept | truthiness (`""`, `0`, `[]`, `{}`, `null` are false) |
//! | `Number` | kept | string form parsed as a base-10 integer |
//! | `Date` | - | string form parsed by a permissive date parser |
//! | `Object` | kept | relaxed map literal parsed from a string |
//! | `Text`, `Symbol` | kept | string representation |
//! | `List`, `MultipleAssets`, `MultipleEntries` | kept | wrapped in a one-element list |
//! | `Link`, `Location` | kept | kept |

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::error::FormatError;
use crate::literal::parse_map_literal;
use crate::render::render_value;
use crate::resource::FieldValue;
use crate::types::{json_type_name, FieldType};

/// Date-time layouts carrying an explicit offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
];

/// Date-time layouts without an offset; read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
];

/// Convert a raw JSON value to the representation of `field_type`.
///
/// Never touches links: callers hand placeholders to [`coerce`] instead.
///
/// # Errors
///
/// Returns `FormatError` when a string is not an integer literal (`Number`),
/// not a map literal (`Object`), or not a recognizable date (`Date`).
pub fn convert(value: &Value, field_type: FieldType) -> Result<FieldValue, FormatError> {
    let converted = match field_type {
        FieldType::Boolean => match value {
            Value::Bool(_) => value.clone(),
            other => Value::Bool(is_truthy(other)),
        },
        FieldType::Number => Value::Number(to_integer(value)?.into_number()),
        FieldType::Date => return parse_date(&string_form(value)).map(FieldValue::Date),
        FieldType::Object => match value {
            Value::Object(_) => value.clone(),
            Value::String(s) => parse_map_literal(s)
                .map(Value::Object)
                .map_err(|message| FormatError::InvalidObject {
                    value: s.clone(),
                    message,
                })?,
            other => {
                return Err(FormatError::Incompatible {
                    expected: FieldType::Object,
                    actual: json_type_name(other),
                })
            }
        },
        FieldType::Text | FieldType::Symbol => match value {
            Value::String(_) => value.clone(),
            other => Value::String(string_form(other)),
        },
        FieldType::List | FieldType::MultipleAssets | FieldType::MultipleEntries => match value {
            Value::Array(_) => value.clone(),
            other => Value::Array(vec![other.clone()]),
        },
        FieldType::Link | FieldType::Location => value.clone(),
    };
    Ok(FieldValue::Json(converted))
}

/// Coerce an already decoded field value.
///
/// Placeholders and resolved references pass through whatever the declared
/// type. Sequences holding links are kept for list types, count as `true`
/// for `Boolean`, become their JSON text for `Text` and `Symbol`, and fail
/// for every other type.
///
/// # Errors
///
/// Returns `FormatError` as [`convert`] does, or `Incompatible` when a
/// sequence or date cannot take the declared type.
pub fn coerce(value: FieldValue, field_type: FieldType) -> Result<FieldValue, FormatError> {
    match value {
        FieldValue::Json(raw) => convert(&raw, field_type),
        FieldValue::Link(_) | FieldValue::Resolved(_) => Ok(value),
        FieldValue::Date(date) => match field_type {
            FieldType::Date | FieldType::Link | FieldType::Location => Ok(FieldValue::Date(date)),
            FieldType::Text | FieldType::Symbol => {
                Ok(FieldValue::Json(Value::String(date.to_rfc3339())))
            }
            FieldType::Boolean => Ok(FieldValue::Json(Value::Bool(true))),
            ty if ty.is_sequence() => Ok(FieldValue::Sequence(vec![FieldValue::Date(date)])),
            expected => Err(FormatError::Incompatible {
                expected,
                actual: "date",
            }),
        },
        FieldValue::Sequence(items) => match field_type {
            ty if ty.is_sequence() => Ok(FieldValue::Sequence(items)),
            FieldType::Link | FieldType::Location => Ok(FieldValue::Sequence(items)),
            FieldType::Boolean => Ok(FieldValue::Json(Value::Bool(!items.is_empty()))),
            FieldType::Text | FieldType::Symbol => {
                let text = render_value(&FieldValue::Sequence(items), None).to_string();
                Ok(FieldValue::Json(Value::String(text)))
            }
            expected => Err(FormatError::Incompatible {
                expected,
                actual: "array",
            }),
        },
    }
}

/// Truthiness of a JSON value: empty and zero values are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Parse a date or date-time in any of the common layouts.
///
/// Strings without an offset are read as UTC.
///
/// # Errors
///
/// Returns `FormatError::InvalidDate` if no layout matches.
pub fn parse_date(input: &str) -> Result<DateTime<FixedOffset>, FormatError> {
    let s = input.trim();
    let invalid = || FormatError::InvalidDate {
        value: input.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }

    let naive_part = s.strip_suffix(['Z', 'z']).unwrap_or(s);
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(naive_part, format) {
            return Ok(as_utc(naive));
        }
    }

    // Compact YYYYMMDD, including integers stringified by the caller
    if naive_part.len() == 8 && naive_part.bytes().all(|b| b.is_ascii_digit()) {
        let date = compact_date(naive_part).ok_or_else(invalid)?;
        return date.and_hms_opt(0, 0, 0).map(as_utc).ok_or_else(invalid);
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(naive_part, format) {
            return date.and_hms_opt(0, 0, 0).map(as_utc).ok_or_else(invalid);
        }
    }

    Err(invalid())
}

fn compact_date(digits: &str) -> Option<NaiveDate> {
    let year = digits[0..4].parse().ok()?;
    let month = digits[4..6].parse().ok()?;
    let day = digits[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn as_utc(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(&naive).into()
}

/// String form used before parsing: strings as-is, everything else as JSON text.
fn string_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Integer produced by `Number` coercion.
enum Integer {
    Signed(i64),
    Unsigned(u64),
}

impl Integer {
    fn into_number(self) -> serde_json::Number {
        match self {
            Integer::Signed(n) => n.into(),
            Integer::Unsigned(n) => n.into(),
        }
    }
}

fn to_integer(value: &Value) -> Result<Integer, FormatError> {
    let invalid = || FormatError::InvalidNumber {
        value: string_form(value),
    };

    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Integer::Signed(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Integer::Unsigned(u))
            } else {
                // Fractional input truncates toward zero
                let f = n.as_f64().filter(|f| f.is_finite()).ok_or_else(invalid)?;
                let truncated = f.trunc();
                if truncated >= i64::MIN as f64 && truncated <= i64::MAX as f64 {
                    Ok(Integer::Signed(truncated as i64))
                } else {
                    Err(invalid())
                }
            }
        }
        Value::Bool(b) => Ok(Integer::Signed(i64::from(*b))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Integer::Signed)
            .map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}
