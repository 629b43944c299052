use crate::client::DocumentIndex;
use crate::etl::Loader;
use crate::storage::{Checkpoint, Snapshot};
use crate::table::Table;
use eyre::{Context, Result, bail};
use owo_colors::OwoColorize;
use serde_json::{Map, Value};

/// One JSON object per row, keyed by column name
pub fn rows_to_documents(table: &Table) -> Vec<Map<String, Value>> {
    table
        .rows()
        .iter()
        .map(|row| {
            table
                .schema()
                .names()
                .zip(row)
                .map(|(name, value)| (name.to_string(), value.to_json()))
                .collect()
        })
        .collect()
}

/// Loader that indexes documents one request at a time
///
/// Responses are logged, not validated: an error status is a warning and
/// the next document is still sent. Only a failed request stops the load.
pub struct DocumentLoader<I> {
    index: I,
}

impl<I: DocumentIndex> DocumentLoader<I> {
    pub fn new(index: I) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &I {
        &self.index
    }
}

impl<I: DocumentIndex> Loader for DocumentLoader<I> {
    type Item = Map<String, Value>;

    async fn load(&self, items: Vec<Self::Item>) -> Result<usize> {
        let mut count = 0;
        for (row, document) in items.iter().enumerate() {
            let response = self
                .index
                .index_document(document)
                .await
                .with_context(|| format!("Failed to index row {}", row))?;
            count += 1;

            if response.is_success() {
                log::info!("Row {}: {}", row, response);
            } else {
                log::warn!("Row {}: {}", row, response.yellow());
            }
        }
        Ok(count)
    }
}

/// Load stage: every row of a cleaned snapshot becomes one document
///
/// Returns the number of index calls issued.
pub async fn run_load<I: DocumentIndex>(
    snapshot: &Snapshot,
    loader: &DocumentLoader<I>,
) -> Result<usize> {
    if snapshot.checkpoint() != Checkpoint::Cleaned {
        bail!(
            "Load stage needs a cleaned snapshot, {} is {}",
            snapshot.path().display(),
            snapshot.checkpoint()
        );
    }

    let table = snapshot.read()?;
    let count = loader.load(rows_to_documents(&table)).await?;
    log::info!(
        "✓ Sent {} document(s) from {}",
        count.cyan(),
        snapshot.path().display().bright_black()
    );
    Ok(count)
}
