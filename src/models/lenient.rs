//! Deserializers for the loosely typed values the remote endpoint returns.
//!
//! The backend is a spreadsheet script, so a cell that should hold a number can
//! come back as a string, a date can come back as a full timestamp and a list can
//! come back JSON-encoded inside a string.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// Number, numeric string, null or junk. Anything non-numeric reads as zero.
pub fn amount<'de, D>(de: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(value.as_ref().map_or(Decimal::ZERO, decimal_from_value))
}

pub fn decimal_from_value(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => Decimal::ZERO,
    }
}

fn parse_decimal(s: &str) -> Decimal {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .unwrap_or(Decimal::ZERO)
}

/// Whole amounts go out as integers, the rest as floats.
pub fn serialize_amount<S>(value: &Decimal, ser: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.fract().is_zero() {
        if let Some(whole) = value.to_i64() {
            return ser.serialize_i64(whole);
        }
    }
    ser.serialize_f64(value.to_f64().unwrap_or_default())
}

pub fn id<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    opt_id(de).map(Option::unwrap_or_default)
}

pub fn opt_id<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Text cells that may hold numbers.
pub fn text<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

pub fn date<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    text(de).map(|s| day_prefix(&s))
}

/// Cuts `2024-05-01T03:00:00.000Z` down to `2024-05-01`. Other input is kept.
pub fn day_prefix(raw: &str) -> String {
    let raw = raw.trim();
    match raw.get(..10) {
        Some(head) if raw.len() > 10 && NaiveDate::parse_from_str(head, "%Y-%m-%d").is_ok() => {
            head.to_string()
        }
        _ => raw.to_string(),
    }
}

/// A list, a JSON-encoded list inside a string, or nothing.
pub fn list<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(de)?;
    match value {
        Some(items @ Value::Array(_)) => serde_json::from_value(items).map_err(D::Error::custom),
        Some(Value::String(s)) if !s.trim().is_empty() => {
            serde_json::from_str(&s).map_err(D::Error::custom)
        }
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_and_numeric_strings_become_decimals() {
        assert_eq!(decimal_from_value(&json!(1500)), Decimal::from(1500));
        assert_eq!(decimal_from_value(&json!(10.5)), Decimal::new(105, 1));
        assert_eq!(decimal_from_value(&json!(" 250 ")), Decimal::from(250));
    }

    #[test]
    fn junk_amounts_read_as_zero() {
        assert_eq!(decimal_from_value(&json!(null)), Decimal::ZERO);
        assert_eq!(decimal_from_value(&json!("abc")), Decimal::ZERO);
        assert_eq!(decimal_from_value(&json!({"x": 1})), Decimal::ZERO);
    }

    #[test]
    fn timestamps_are_cut_to_the_day() {
        assert_eq!(day_prefix("2024-05-01T03:00:00.000Z"), "2024-05-01");
        assert_eq!(day_prefix("2024-05-01"), "2024-05-01");
        assert_eq!(day_prefix("not a date at all"), "not a date at all");
    }
}
