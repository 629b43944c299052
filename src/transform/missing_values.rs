//! Missing value dropper

use crate::etl::Transformer;
use crate::table::{Table, Value};
use eyre::Result;

/// Transformer that drops every row with a missing value in any column
#[derive(Default)]
pub struct MissingValueDropper;

impl MissingValueDropper {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for MissingValueDropper {
    type Input = Table;
    type Output = Table;

    fn transform(&self, mut input: Self::Input) -> Result<Self::Output> {
        input.retain_rows(|row| !row.iter().any(Value::is_missing));
        Ok(input)
    }
}
