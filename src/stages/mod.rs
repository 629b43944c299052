//! The three stages of the house sales job
//!
//! Each stage reads its input through a [`Snapshot`](crate::storage::Snapshot)
//! handle (or a source) and returns the handle of what it wrote.

mod clean;
mod extract;
mod load;

pub use clean::run_clean;
pub use extract::{TableExtractor, run_extract};
pub use load::{DocumentLoader, rows_to_documents, run_load};
