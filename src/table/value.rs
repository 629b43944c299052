//! Cell values

use chrono::NaiveDate;
use std::hash::{Hash, Hasher};

/// Date format used when a date is written back out as text
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single cell in a [`Table`](super::Table)
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
}

impl Value {
    /// True for SQL/CSV missing values and NaN floats
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Render the value the way it is stored in a CSV cell
    pub fn to_cell(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => format_float(*f),
            Self::Date(d) => d.format(DATE_FORMAT).to_string(),
        }
    }

    /// Convert to a JSON value for indexing
    ///
    /// Non-finite floats have no JSON representation and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Date(d) => serde_json::Value::String(d.format(DATE_FORMAT).to_string()),
        }
    }
}

/// Floats with no fractional part keep a trailing `.0` so they read back as floats
fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

/// Bit pattern used to compare and hash a float
///
/// Every NaN shares one pattern and `-0.0` equals `0.0`.
fn float_key(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0.0f64.to_bits()
    } else {
        f.to_bits()
    }
}

// Floats compare by bit pattern so that rows can be hashed for de-duplication.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => float_key(*a) == float_key(*b),
            (Self::Date(a), Self::Date(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Text(s) => s.hash(state),
            Self::Integer(i) => i.hash(state),
            Self::Float(f) => float_key(*f).hash(state),
            Self::Date(d) => d.hash(state),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_cell())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_values() {
        assert!(Value::Null.is_missing());
        assert!(Value::Float(f64::NAN).is_missing());
        assert!(!Value::Float(0.0).is_missing());
        assert!(!Value::Text(String::new()).is_missing());
    }

    #[test]
    fn test_cell_rendering() {
        assert_eq!(Value::Float(3.0).to_cell(), "3.0");
        assert_eq!(Value::Float(1480000.5).to_cell(), "1480000.5");
        assert_eq!(Value::Integer(-4).to_cell(), "-4");
        assert_eq!(Value::Null.to_cell(), "");
        let date = NaiveDate::from_ymd_opt(2016, 12, 3).unwrap();
        assert_eq!(Value::Date(date).to_cell(), "2016-12-03");
    }

    #[test]
    fn test_json_rendering() {
        assert_eq!(Value::Integer(3).to_json(), json!(3));
        assert_eq!(Value::Float(2.5).to_json(), json!(2.5));
        assert_eq!(Value::Float(f64::INFINITY).to_json(), json!(null));
        assert_eq!(Value::Text("Abbotsford".into()).to_json(), json!("Abbotsford"));
    }

    #[test]
    fn test_float_equality_is_reflexive() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(1.0), Value::Integer(1));
    }

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_signed_zero_and_nan_payloads_are_equal() {
        assert_eq!(Value::Float(0.0), Value::Float(-0.0));
        assert_eq!(hash_of(&Value::Float(0.0)), hash_of(&Value::Float(-0.0)));

        let other_nan = f64::from_bits(f64::NAN.to_bits() | 1);
        assert!(other_nan.is_nan());
        assert_eq!(Value::Float(f64::NAN), Value::Float(other_nan));
        assert_eq!(hash_of(&Value::Float(f64::NAN)), hash_of(&Value::Float(-f64::NAN)));
        assert_ne!(Value::Float(0.0), Value::Float(f64::MIN_POSITIVE));
    }

    #[test]
    fn test_large_integral_floats_keep_fraction() {
        assert_eq!(Value::Float(1e16).to_cell(), "10000000000000000.0");
        assert_eq!(Value::Float(1e20).to_cell(), "100000000000000000000.0");
        assert_eq!(Value::Float(-2e17).to_cell(), "-200000000000000000.0");
        assert_eq!(Value::Float(f64::INFINITY).to_cell(), "inf");
    }
}
