//! Duplicate row dropper
//!
//! Keeps the first occurrence of every distinct row.

use crate::etl::Transformer;
use crate::table::{Table, Value};
use eyre::Result;
use std::collections::HashSet;

/// Transformer that drops rows equal to an earlier row
///
/// Columns listed with [`DuplicateRowDropper::ignoring`] take no part in the
/// comparison. The extract stage's positional index is unique per row, so it
/// must be ignored for duplicates to be found at all.
#[derive(Default)]
pub struct DuplicateRowDropper {
    ignored: Vec<String>,
}

impl DuplicateRowDropper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave `column` out of the comparison (if the table has it)
    pub fn ignoring(mut self, column: impl Into<String>) -> Self {
        self.ignored.push(column.into());
        self
    }
}

impl Transformer for DuplicateRowDropper {
    type Input = Table;
    type Output = Table;

    fn transform(&self, mut input: Self::Input) -> Result<Self::Output> {
        let compared: Vec<usize> = input
            .schema()
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| !self.ignored.contains(&c.name))
            .map(|(i, _)| i)
            .collect();

        let mut seen: HashSet<Vec<Value>> = HashSet::with_capacity(input.len());
        input.retain_rows(|row| seen.insert(compared.iter().map(|&i| row[i].clone()).collect()));
        Ok(input)
    }
}
