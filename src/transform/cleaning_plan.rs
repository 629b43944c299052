//! Ordered list of cleaning steps

use super::{
    ColumnDropper, ColumnNameNormalizer, DayFirstDateParser, DuplicateRowDropper, IntegerCaster,
    MissingValueDropper, SequentialIdAssigner,
};
use crate::etl::Transformer;
use crate::storage::RAW_INDEX_COLUMN;
use crate::table::Table;
use eyre::{Context, Result};

type Step = Box<dyn Transformer<Input = Table, Output = Table>>;

/// Named table transformers applied one after another
///
/// # Example
/// ```
/// use house_sales_etl::transform::{CleaningPlan, MissingValueDropper, SequentialIdAssigner};
///
/// let plan = CleaningPlan::new()
///     .step("drop missing", MissingValueDropper::new())
///     .step("assign ids", SequentialIdAssigner::default());
/// assert_eq!(plan.step_names().collect::<Vec<_>>(), ["drop missing", "assign ids"]);
/// ```
#[derive(Default)]
pub struct CleaningPlan {
    steps: Vec<(String, Step)>,
}

impl CleaningPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step
    pub fn step(
        mut self,
        name: impl Into<String>,
        transformer: impl Transformer<Input = Table, Output = Table> + 'static,
    ) -> Self {
        self.steps.push((name.into(), Box::new(transformer)));
        self
    }

    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|(name, _)| name.as_str())
    }

    /// The seven house sales cleaning rules, in the order they must run
    ///
    /// 1. Drop duplicate rows (ignoring the positional index)
    /// 2. Normalize column names
    /// 3. Parse `date` day first
    /// 4. Drop rows with any missing value
    /// 5. Cast the numeric columns to integers
    /// 6. Drop the positional index column
    /// 7. Number the rows as `house_id`
    pub fn house_sales() -> Self {
        Self::new()
            .step(
                "drop duplicate rows",
                DuplicateRowDropper::new().ignoring(RAW_INDEX_COLUMN),
            )
            .step("normalize column names", ColumnNameNormalizer::new())
            .step("parse dates day first", DayFirstDateParser::default())
            .step("drop rows with missing values", MissingValueDropper::new())
            .step("cast numeric columns", IntegerCaster::house_sales())
            .step("drop positional index", ColumnDropper::positional_index())
            .step("assign house_id", SequentialIdAssigner::default())
    }
}

impl Transformer for CleaningPlan {
    type Input = Table;
    type Output = Table;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        let mut table = input;
        for (name, step) in &self.steps {
            let before = table.len();
            table = step
                .transform(table)
                .with_context(|| format!("Cleaning step '{}' failed", name))?;
            log::debug!("{}: {} -> {} row(s)", name, before, table.len());
        }
        Ok(table)
    }
}
