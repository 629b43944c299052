//! In-memory tabular data
//!
//! A [`Table`] pairs an explicit [`Schema`] with rows of [`Value`]s. Every
//! row has exactly one value per schema column; the mutating helpers keep
//! that invariant.

mod schema;
mod value;

pub use schema::{Column, ColumnRequirement, ColumnType, Schema};
pub use value::{DATE_FORMAT, Value};

use eyre::{Result, eyre};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    schema: Schema,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given schema
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Create a table from rows, checking every row's width
    pub fn from_rows(schema: Schema, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut table = Self::new(schema);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.schema.len() {
            eyre::bail!(
                "Row has {} value(s), schema has {} column(s)",
                row.len(),
                self.schema.len()
            );
        }
        self.rows.push(row);
        Ok(())
    }

    /// Values of a single column, in row order
    pub fn column_values(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let idx = self.schema.index_of(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Keep only the rows for which `keep` returns true
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[Value]) -> bool) {
        self.rows.retain(|row| keep(row));
    }

    /// Rename every column; the new names must be unique
    pub fn rename_columns(&mut self, mut rename: impl FnMut(&str) -> Result<String>) -> Result<()> {
        let mut renamed: Vec<String> = Vec::with_capacity(self.schema.len());
        for col in self.schema.columns() {
            let name = rename(&col.name)?;
            if let Some(prev) = renamed.iter().position(|n| *n == name) {
                eyre::bail!(
                    "Columns '{}' and '{}' both map to '{}'",
                    self.schema.columns()[prev].name,
                    col.name,
                    name
                );
            }
            renamed.push(name);
        }
        for (col, name) in self.schema.columns_mut().iter_mut().zip(renamed) {
            col.name = name;
        }
        Ok(())
    }

    /// Replace every value of a column and set its new type
    ///
    /// The conversion sees the row index for error reporting.
    pub fn map_column(
        &mut self,
        name: &str,
        ty: ColumnType,
        mut convert: impl FnMut(usize, &Value) -> Result<Value>,
    ) -> Result<()> {
        let idx = self
            .schema
            .index_of(name)
            .ok_or_else(|| eyre!("Column '{}' not found", name))?;
        for (row_idx, row) in self.rows.iter_mut().enumerate() {
            row[idx] = convert(row_idx, &row[idx])?;
        }
        self.schema.columns_mut()[idx].ty = ty;
        Ok(())
    }

    /// Remove a column and its values
    pub fn drop_column(&mut self, name: &str) -> Result<()> {
        let idx = self
            .schema
            .index_of(name)
            .ok_or_else(|| eyre!("Column '{}' not found", name))?;
        self.schema.columns_mut().remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        Ok(())
    }

    /// Insert a column at `position`, one value per row
    pub fn insert_column(&mut self, position: usize, column: Column, values: Vec<Value>) -> Result<()> {
        if values.len() != self.rows.len() {
            eyre::bail!(
                "Column '{}' has {} value(s), table has {} row(s)",
                column.name,
                values.len(),
                self.rows.len()
            );
        }
        if self.schema.index_of(&column.name).is_some() {
            eyre::bail!("Column '{}' already exists", column.name);
        }
        let position = position.min(self.schema.len());
        self.schema.columns_mut().insert(position, column);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(position, value);
        }
        Ok(())
    }
}
