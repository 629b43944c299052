//! Typed handle to the snapshot file shared between stages

use super::csv::{CsvReader, CsvWriter, IndexColumn, RAW_INDEX_COLUMN};
use crate::table::{Column, ColumnRequirement, ColumnType, Schema, Table};
use crate::transform::{NUMERIC_COLUMNS, normalize_column_name};

use eyre::{Context, Result};
use owo_colors::OwoColorize;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static CLEAN_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z_]+$").unwrap());

/// Point in the job a snapshot was written at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// Raw table plus a positional index column, written by the extract stage
    Extracted,
    /// Cleaned table, written by the clean stage
    Cleaned,
}

impl Checkpoint {
    /// Check that `schema` is what a snapshot at this checkpoint looks like
    ///
    /// Extracted snapshots are checked after column name normalization,
    /// since that is how the clean stage will address them.
    pub fn verify(&self, schema: &Schema) -> Result<()> {
        self.verify_with(schema, true)
    }

    /// Like [`Checkpoint::verify`], but an empty table read back from CSV has
    /// no cells to infer types from, so only its column names are checked.
    fn verify_table(&self, table: &Table) -> Result<()> {
        self.verify_with(table.schema(), !table.is_empty())
    }

    fn verify_with(&self, schema: &Schema, typed: bool) -> Result<()> {
        match self {
            Self::Extracted => {
                let normalized = Schema::new(
                    schema
                        .columns()
                        .iter()
                        .map(|c| Column::new(normalize_column_name(&c.name), c.ty))
                        .collect(),
                );
                let mut required = vec![
                    ColumnRequirement::named("unnamed"),
                    ColumnRequirement::named("date"),
                ];
                required.extend(NUMERIC_COLUMNS.iter().map(|c| ColumnRequirement::named(*c)));
                normalized
                    .check(&required)
                    .with_context(|| "Snapshot does not look like an extracted table")
            }
            Self::Cleaned => {
                let requirement = |name: &'static str, ty: ColumnType| ColumnRequirement {
                    name,
                    ty: typed.then_some(ty),
                };
                let mut required = vec![
                    requirement("house_id", ColumnType::Integer),
                    requirement("date", ColumnType::Date),
                ];
                required.extend(
                    NUMERIC_COLUMNS
                        .iter()
                        .map(|c| requirement(*c, ColumnType::Integer)),
                );
                schema
                    .check(&required)
                    .with_context(|| "Snapshot does not look like a cleaned table")?;

                if let Some(bad) = schema.names().find(|n| !CLEAN_NAME.is_match(n)) {
                    eyre::bail!("Cleaned snapshot has an unnormalized column name '{}'", bad);
                }
                if schema.index_of("unnamed").is_some() {
                    eyre::bail!("Cleaned snapshot still has the positional 'unnamed' column");
                }
                Ok(())
            }
        }
    }

    fn index_column(&self) -> IndexColumn {
        match self {
            Self::Extracted => IndexColumn::Include,
            Self::Cleaned => IndexColumn::Omit,
        }
    }
}

impl std::fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extracted => write!(f, "extracted"),
            Self::Cleaned => write!(f, "cleaned"),
        }
    }
}

/// Reference to "the current snapshot"
///
/// Stages hand these to each other instead of agreeing on a global path. The
/// schema is the one the next reader will see; column types are inferred again
/// on every read, so only column names are compared against the file.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    path: PathBuf,
    schema: Schema,
    rows: usize,
    checkpoint: Checkpoint,
}

impl Snapshot {
    /// Write `table` to `path` as a snapshot at `checkpoint`, replacing the file
    ///
    /// Extracted snapshots gain a leading positional index column, cleaned
    /// snapshots are written as-is.
    pub fn write(path: impl AsRef<Path>, table: &Table, checkpoint: Checkpoint) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut columns = Vec::with_capacity(table.schema().len() + 1);
        if checkpoint == Checkpoint::Extracted {
            columns.push(Column::new(RAW_INDEX_COLUMN, ColumnType::Integer));
        }
        columns.extend(table.schema().columns().iter().cloned());
        let schema = Schema::new(columns);

        if checkpoint == Checkpoint::Cleaned {
            checkpoint.verify(&schema)?;
        }

        CsvWriter::new(&path).write(table, checkpoint.index_column())?;
        log::debug!(
            "Wrote {} snapshot with {} row(s) to {}",
            checkpoint,
            table.len(),
            path.display().bright_black()
        );

        Ok(Self {
            path,
            schema,
            rows: table.len(),
            checkpoint,
        })
    }

    /// Open an existing snapshot file that was written at `checkpoint`
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or its schema does not fit
    /// the checkpoint.
    pub fn open(path: impl AsRef<Path>, checkpoint: Checkpoint) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let table = CsvReader::new(&path).read()?;
        checkpoint
            .verify_table(&table)
            .with_context(|| format!("Invalid snapshot: {}", path.display()))?;
        Ok(Self {
            path,
            schema: table.schema().clone(),
            rows: table.len(),
            checkpoint,
        })
    }

    /// Read the snapshot's table
    ///
    /// # Errors
    /// Returns an error if the file has changed columns since this handle was
    /// created.
    pub fn read(&self) -> Result<Table> {
        let table = CsvReader::new(&self.path).read()?;
        if !table.schema().names().eq(self.schema.names()) {
            eyre::bail!(
                "Snapshot {} changed underneath its handle: expected columns [{}], found [{}]",
                self.path.display(),
                self.schema.names().collect::<Vec<_>>().join(", "),
                table.schema().names().collect::<Vec<_>>().join(", ")
            );
        }
        self.checkpoint
            .verify_table(&table)
            .with_context(|| format!("Invalid snapshot: {}", self.path.display()))?;
        Ok(table)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of rows when the handle was created
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.checkpoint
    }
}
