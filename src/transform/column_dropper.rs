//! Column dropper transformer
//!
//! Removes named columns from a table, typically the positional index column
//! that the extract stage writes and that has no meaning as data.

use crate::etl::Transformer;
use crate::table::Table;
use eyre::{Context, Result};

/// Transformer that drops specified columns from a table
///
/// Every named column must exist; a missing one is an error.
///
/// # Example
/// ```
/// use house_sales_etl::transform::ColumnDropper;
/// use house_sales_etl::etl::Transformer;
/// use house_sales_etl::table::{Column, ColumnType, Schema, Table, Value};
///
/// let table = Table::from_rows(
///     Schema::new(vec![
///         Column::new("unnamed", ColumnType::Integer),
///         Column::new("suburb", ColumnType::Text),
///     ]),
///     vec![vec![Value::Integer(0), Value::Text("Abbotsford".into())]],
/// ).unwrap();
///
/// let output = ColumnDropper::new(vec!["unnamed"]).transform(table).unwrap();
/// assert_eq!(output.schema().names().collect::<Vec<_>>(), ["suburb"]);
/// ```
pub struct ColumnDropper {
    columns: Vec<String>,
}

impl ColumnDropper {
    /// Create a new column dropper with the specified columns to remove
    pub fn new(columns: Vec<&str>) -> Self {
        Self {
            columns: columns.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Drops the positional index column once its name has been normalized
    pub fn positional_index() -> Self {
        Self::new(vec!["unnamed"])
    }
}

impl Transformer for ColumnDropper {
    type Input = Table;
    type Output = Table;

    fn transform(&self, mut input: Self::Input) -> Result<Self::Output> {
        for column in &self.columns {
            input
                .drop_column(column)
                .with_context(|| format!("Cannot drop column '{}'", column))?;
        }
        Ok(input)
    }
}
