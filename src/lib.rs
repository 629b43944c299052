//! House Sales ETL
//!
//! A daily batch job that copies a table of real-estate sales out of
//! PostgreSQL, cleans it through a CSV snapshot, and indexes every cleaned
//! row into Elasticsearch.

pub mod cli;
pub mod client;
pub mod config;
pub mod etl;
pub mod job;
pub mod stages;
pub mod storage;
pub mod table;
pub mod transform;

// Re-exports for convenience
pub use client::{Auth, DocumentIndex, ElasticsearchClient, PostgresClient};
pub use config::Settings;
pub use etl::{Extractor, Loader, Pipeline, Transformer, house_sales_pipeline};
pub use job::{Job, JobReport};
pub use storage::{Checkpoint, Snapshot};
pub use table::{Table, Value};
pub use transform::CleaningPlan;
