//! Sequential id assigner

use crate::etl::Transformer;
use crate::table::{Column, ColumnType, Table, Value};
use eyre::Result;

/// Transformer that numbers rows `0..n` in their current order
///
/// The id column is inserted first. A column of the same name that is
/// already present is replaced.
pub struct SequentialIdAssigner {
    column: String,
}

impl SequentialIdAssigner {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Default for SequentialIdAssigner {
    fn default() -> Self {
        Self::new("house_id")
    }
}

impl Transformer for SequentialIdAssigner {
    type Input = Table;
    type Output = Table;

    fn transform(&self, mut input: Self::Input) -> Result<Self::Output> {
        if input.schema().index_of(&self.column).is_some() {
            log::debug!("Replacing existing '{}' column", self.column);
            input.drop_column(&self.column)?;
        }
        let ids = (0..input.len() as i64).map(Value::Integer).collect();
        input.insert_column(0, Column::new(&self.column, ColumnType::Integer), ids)?;
        Ok(input)
    }
}
