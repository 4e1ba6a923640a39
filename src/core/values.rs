//! Coercion of loosely-typed document values.
//!
//! Historical documents store amounts as numbers or numeric strings, and
//! timestamps as RFC 3339 strings or exported `{_seconds, _nanoseconds}`
//! objects. These helpers turn them into Rust values with fixed fallbacks.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Coerces an amount to `f64`.
///
/// Numbers are used as is and strings are parsed after trimming. Anything
/// else, including non-finite results, becomes `0.0`.
#[must_use]
pub fn coerce_amount(value: Option<&Value>) -> f64 {
    let amount = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if amount.is_finite() { amount } else { 0.0 }
}

/// Parses a timestamp from an RFC 3339 string or a `{_seconds, _nanoseconds}` object.
#[must_use]
pub fn coerce_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Object(map) => {
            let seconds = map
                .get("_seconds")
                .or_else(|| map.get("seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("_nanoseconds")
                .or_else(|| map.get("nanoseconds"))
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0);
            DateTime::from_timestamp(seconds, nanos)
        }
        _ => None,
    }
}

/// Trimmed string value of a field, `None` when absent, not a string, or blank.
#[must_use]
pub fn non_blank(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_amount_numbers_and_strings() {
        assert_eq!(coerce_amount(Some(&json!(25000))), 25000.0);
        assert_eq!(coerce_amount(Some(&json!(12.5))), 12.5);
        assert_eq!(coerce_amount(Some(&json!(" 5000 "))), 5000.0);
    }

    #[test]
    fn test_coerce_amount_invalid_is_zero() {
        assert_eq!(coerce_amount(None), 0.0);
        assert_eq!(coerce_amount(Some(&Value::Null)), 0.0);
        assert_eq!(coerce_amount(Some(&json!("abc"))), 0.0);
        assert_eq!(coerce_amount(Some(&json!("NaN"))), 0.0);
        assert_eq!(coerce_amount(Some(&json!([1, 2]))), 0.0);
    }

    #[test]
    fn test_coerce_timestamp_formats() {
        let from_string = coerce_timestamp(Some(&json!("2024-03-01T10:00:00Z"))).unwrap();
        let from_export =
            coerce_timestamp(Some(&json!({"_seconds": 1_709_287_200, "_nanoseconds": 0})))
                .unwrap();
        assert_eq!(from_string, from_export);
        assert!(coerce_timestamp(Some(&json!("yesterday"))).is_none());
        assert!(coerce_timestamp(None).is_none());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some(&json!("  Ana "))), Some("Ana".to_string()));
        assert_eq!(non_blank(Some(&json!("   "))), None);
        assert_eq!(non_blank(Some(&json!(3))), None);
    }
}
