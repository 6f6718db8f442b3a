//! FILENAME: pivot-engine/src/value.rs
//! Tagged scalar values shared by raw records, filters and exported rows.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::catalog::DataType;

/// Calendar format used for date values on the wire and in labels.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// SCALAR
// ============================================================================

/// A dynamically-typed field value, tagged according to the field's data type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Scalar {
    #[default]
    Null,
    Number(f64),
    Text(String),
    Date(NaiveDate),
    Boolean(bool),
}

impl Scalar {
    pub fn text(s: impl Into<String>) -> Self {
        Scalar::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Numeric view used by aggregation.
    /// Anything that is not a finite number is absent.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Tags a JSON value according to the declared data type of its field.
    ///
    /// Values that do not fit their declared type are kept as text, so they
    /// still count as present for `Count` but never feed numeric aggregates.
    /// A `None` data type (field unknown to the catalog) keeps the JSON shape.
    pub fn from_json(value: &JsonValue, data_type: Option<DataType>) -> Self {
        match (value, data_type) {
            (JsonValue::Null, _) => Scalar::Null,
            (JsonValue::Number(n), Some(DataType::Text | DataType::Date | DataType::Boolean)) => {
                Scalar::Text(n.to_string())
            }
            (JsonValue::Number(n), _) => n.as_f64().map(Scalar::Number).unwrap_or(Scalar::Null),
            (JsonValue::String(s), Some(DataType::Numeric)) => s
                .trim()
                .parse::<f64>()
                .map(Scalar::Number)
                .unwrap_or_else(|_| Scalar::Text(s.clone())),
            (JsonValue::String(s), Some(DataType::Date)) => {
                parse_date(s).map(Scalar::Date).unwrap_or_else(|| Scalar::Text(s.clone()))
            }
            (JsonValue::String(s), Some(DataType::Boolean)) => match s.trim() {
                "true" | "TRUE" => Scalar::Boolean(true),
                "false" | "FALSE" => Scalar::Boolean(false),
                _ => Scalar::Text(s.clone()),
            },
            (JsonValue::String(s), _) => Scalar::Text(s.clone()),
            (JsonValue::Bool(b), Some(DataType::Text | DataType::Numeric | DataType::Date)) => {
                Scalar::Text(b.to_string())
            }
            (JsonValue::Bool(b), _) => Scalar::Boolean(*b),
            (other, _) => Scalar::Text(other.to_string()),
        }
    }
}

/// Accepts plain dates and timestamps whose first ten characters are a date.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .or_else(|| s.get(..10).and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok()))
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
            Scalar::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Scalar::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value as f64)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<NaiveDate> for Scalar {
    fn from(value: NaiveDate) -> Self {
        Scalar::Date(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Boolean(value)
    }
}

impl From<Option<f64>> for Scalar {
    fn from(value: Option<f64>) -> Self {
        value.map(Scalar::Number).unwrap_or(Scalar::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_as_number_rejects_non_numeric() {
        assert_eq!(Scalar::Number(4.5).as_number(), Some(4.5));
        assert_eq!(Scalar::Number(f64::NAN).as_number(), None);
        assert_eq!(Scalar::text("12").as_number(), None);
        assert_eq!(Scalar::Null.as_number(), None);
    }

    #[test]
    fn test_from_json_follows_data_type() {
        assert_eq!(Scalar::from_json(&json!("42.5"), Some(DataType::Numeric)), Scalar::Number(42.5));
        assert_eq!(Scalar::from_json(&json!("n/a"), Some(DataType::Numeric)), Scalar::text("n/a"));
        assert_eq!(Scalar::from_json(&json!(7), Some(DataType::Text)), Scalar::text("7"));
        assert_eq!(
            Scalar::from_json(&json!("2024-03-01T00:00:00Z"), Some(DataType::Date)),
            Scalar::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert_eq!(Scalar::from_json(&json!(null), Some(DataType::Numeric)), Scalar::Null);
        assert_eq!(Scalar::from_json(&json!(true), None), Scalar::Boolean(true));
    }

    #[test]
    fn test_from_json_mismatched_type_keeps_raw_text() {
        assert_eq!(Scalar::from_json(&json!(20240101), Some(DataType::Date)), Scalar::text("20240101"));
        assert_eq!(Scalar::from_json(&json!(1), Some(DataType::Boolean)), Scalar::text("1"));
        assert_eq!(Scalar::from_json(&json!(true), Some(DataType::Numeric)), Scalar::text("true"));
        assert_eq!(Scalar::from_json(&json!(false), Some(DataType::Date)), Scalar::text("false"));
        assert_eq!(Scalar::from_json(&json!("TRUE"), Some(DataType::Boolean)), Scalar::Boolean(true));
        assert_eq!(Scalar::from_json(&json!("yes"), Some(DataType::Boolean)), Scalar::text("yes"));
        assert!(Scalar::from_json(&json!(true), Some(DataType::Numeric)).as_number().is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(Scalar::Number(2024.0).to_string(), "2024");
        assert_eq!(Scalar::Number(12.5).to_string(), "12.5");
        assert_eq!(Scalar::Boolean(false).to_string(), "FALSE");
        assert_eq!(Scalar::Null.to_string(), "");
    }
}
