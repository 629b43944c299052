use crate::client::PostgresClient;
use crate::etl::Extractor;
use crate::storage::{Checkpoint, Snapshot};
use crate::table::Table;
use eyre::Result;
use owo_colors::OwoColorize;
use std::path::Path;

/// Extractor reading one whole table from PostgreSQL
pub struct TableExtractor {
    client: PostgresClient,
    table: String,
}

impl TableExtractor {
    pub fn new(client: PostgresClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

impl Extractor for TableExtractor {
    type Output = Table;

    async fn extract(&self) -> Result<Self::Output> {
        log::info!("Fetching table '{}' from {}", self.table, self.client);
        self.client.fetch_table(&self.table).await
    }
}

/// Extract stage: source table to a fresh snapshot at `path`
///
/// Any previous content at `path` is replaced.
pub async fn run_extract<E>(extractor: &E, path: impl AsRef<Path>) -> Result<Snapshot>
where
    E: Extractor<Output = Table>,
{
    let path = path.as_ref();
    let table = extractor.extract().await?;
    let snapshot = Snapshot::write(path, &table, Checkpoint::Extracted)?;
    log::info!(
        "✓ Extracted {} row(s) to {}",
        snapshot.rows().cyan(),
        path.display().bright_black()
    );
    Ok(snapshot)
}
