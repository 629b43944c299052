//! Core ETL (Extract, Transform, Load) abstractions
//!
//! This module provides the trait definitions every stage is built on, and
//! the pipeline descriptor that wires the stages together.

mod extract;
mod load;
mod pipeline;
mod schedule;
mod transform;

pub use extract::Extractor;
pub use load::Loader;
pub use pipeline::{Pipeline, PipelineBuilder, Stage, StageKind, house_sales_pipeline};
pub use schedule::{RetryPolicy, Trigger};
pub use transform::Transformer;
