//! File system storage operations
//!
//! This module handles the snapshot file the stages hand to each other:
//! - CSV reading/writing with type inference
//! - The typed [`Snapshot`] handle and its schema checkpoints

mod csv;
mod snapshot;

pub use self::csv::{CsvReader, CsvWriter, IndexColumn, RAW_INDEX_COLUMN};
pub use snapshot::{Checkpoint, Snapshot};
