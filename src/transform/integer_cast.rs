//! Integer caster
//!
//! Converts numeric columns to integers, truncating toward zero the way a
//! float-to-int cast does (`2.7` becomes `2`, `-2.7` becomes `-2`).

use crate::etl::Transformer;
use crate::table::{ColumnType, Table, Value};
use eyre::{Result, eyre};

/// The columns that hold whole numbers in the cleaned house sales data
pub const NUMERIC_COLUMNS: &[&str] = &[
    "postcode",
    "bedroom",
    "bathroom",
    "car",
    "yearbuilt",
    "propertycount",
];

/// Transformer that casts columns to integers
///
/// Text must hold a number. Missing, non-finite or out of range values are
/// errors, so missing values have to be dropped first.
pub struct IntegerCaster {
    columns: Vec<String>,
}

impl IntegerCaster {
    pub fn new(columns: Vec<&str>) -> Self {
        Self {
            columns: columns.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Casts [`NUMERIC_COLUMNS`]
    pub fn house_sales() -> Self {
        Self::new(NUMERIC_COLUMNS.to_vec())
    }
}

fn truncate(f: f64) -> Option<i64> {
    let t = f.trunc();
    // i64::MAX is not representable as f64; 2^63 is the first float past it
    if t.is_finite() && t >= i64::MIN as f64 && t < 9_223_372_036_854_775_808.0 {
        Some(t as i64)
    } else {
        None
    }
}

/// Cast a single value to an integer, truncating fractions
pub fn cast_to_integer(value: &Value) -> Result<i64> {
    match value {
        Value::Integer(i) => Ok(*i),
        Value::Float(f) => truncate(*f).ok_or_else(|| eyre!("{} is not a finite integer", f)),
        Value::Text(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Ok(i);
            }
            s.parse::<f64>()
                .ok()
                .and_then(truncate)
                .ok_or_else(|| eyre!("'{}' is not numeric", s))
        }
        Value::Null => Err(eyre!("missing value")),
        Value::Date(d) => Err(eyre!("date {} is not numeric", d)),
    }
}

impl Transformer for IntegerCaster {
    type Input = Table;
    type Output = Table;

    fn transform(&self, mut input: Self::Input) -> Result<Self::Output> {
        for column in &self.columns {
            input.map_column(column, ColumnType::Integer, |row, value| {
                cast_to_integer(value)
                    .map(Value::Integer)
                    .map_err(|e| eyre!("Row {}: cannot cast '{}' to integer: {}", row, column, e))
            })?;
        }
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, Schema};

    #[test]
    fn test_cast_truncates() {
        assert_eq!(cast_to_integer(&Value::Text("3.0".into())).unwrap(), 3);
        assert_eq!(cast_to_integer(&Value::Text(" 3 ".into())).unwrap(), 3);
        assert_eq!(cast_to_integer(&Value::Float(2.7)).unwrap(), 2);
        assert_eq!(cast_to_integer(&Value::Float(-2.7)).unwrap(), -2);
        assert_eq!(cast_to_integer(&Value::Integer(1900)).unwrap(), 1900);
    }

    #[test]
    fn test_cast_rejects_non_numeric() {
        assert!(cast_to_integer(&Value::Text("three".into())).is_err());
        assert!(cast_to_integer(&Value::Float(f64::NAN)).is_err());
        assert!(cast_to_integer(&Value::Float(f64::INFINITY)).is_err());
        assert!(cast_to_integer(&Value::Float(1e20)).is_err());
        assert!(cast_to_integer(&Value::Null).is_err());
    }

    #[test]
    fn test_casts_house_sales_columns() {
        let mut columns = vec![Column::new("suburb", ColumnType::Text)];
        columns.extend(NUMERIC_COLUMNS.iter().map(|c| Column::new(*c, ColumnType::Float)));
        let mut row = vec![Value::Text("Abbotsford".into())];
        row.extend([3067.0, 3.0, 1.0, 1.5, 1900.0, 4019.0].map(Value::Float));
        let table = Table::from_rows(Schema::new(columns), vec![row]).unwrap();

        let output = IntegerCaster::house_sales().transform(table).unwrap();

        for name in NUMERIC_COLUMNS {
            assert_eq!(output.schema().column(name).unwrap().ty, ColumnType::Integer);
        }
        assert_eq!(
            output.rows()[0][1..],
            [3067, 3, 1, 1, 1900, 4019].map(Value::Integer)
        );
        assert_eq!(output.rows()[0][0], Value::Text("Abbotsford".into()));
    }

    #[test]
    fn test_reports_row_and_column() {
        let table = Table::from_rows(
            Schema::new(vec![Column::new("car", ColumnType::Text)]),
            vec![vec![Value::Text("1".into())], vec![Value::Text("two".into())]],
        )
        .unwrap();

        let err = IntegerCaster::new(vec!["car"]).transform(table).unwrap_err();
        assert!(err.to_string().contains("Row 1: cannot cast 'car' to integer"));
    }
}
