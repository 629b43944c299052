//! Cleaning transformers for the house sales table
//!
//! Each rule is its own [`Transformer`](crate::etl::Transformer) over a
//! [`Table`](crate::table::Table); [`CleaningPlan`] runs them in order.

mod cleaning_plan;
mod column_dropper;
mod column_names;
mod dates;
mod duplicate_rows;
mod house_id;
mod integer_cast;
mod missing_values;

pub use cleaning_plan::CleaningPlan;
pub use column_dropper::ColumnDropper;
pub use column_names::{ColumnNameNormalizer, normalize_column_name};
pub use dates::{DayFirstDateParser, parse_day_first};
pub use duplicate_rows::DuplicateRowDropper;
pub use house_id::SequentialIdAssigner;
pub use integer_cast::{IntegerCaster, NUMERIC_COLUMNS, cast_to_integer};
pub use missing_values::MissingValueDropper;
