//! CSV snapshot file operations
//!
//! Reading infers one type per column from the cell text, the same way
//! the snapshot was typed before it was written. Missing cells are written as
//! empty strings and several common NA spellings are read back as missing.

use crate::etl::Extractor;
use crate::table::{Column, ColumnType, DATE_FORMAT, Schema, Table, Value};

use chrono::NaiveDate;
use eyre::{Context, Result};
use std::path::{Path, PathBuf};

/// Header of the positional index column once it has been read back
pub const RAW_INDEX_COLUMN: &str = "Unnamed: 0";

/// Cell contents read as missing values
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a leading positional index column is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexColumn {
    Include,
    Omit,
}

/// Read a CSV file into a typed [`Table`]
pub struct CsvReader {
    path: PathBuf,
}

impl CsvReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read the whole file
    ///
    /// Blank headers become `Unnamed: {position}`.
    pub fn read(&self) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .with_context(|| format!("Failed to open CSV file: {}", self.path.display()))?;

        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("Failed to read CSV header: {}", self.path.display()))?
            .iter()
            .enumerate()
            .map(|(i, h)| match h.trim() {
                "" => format!("Unnamed: {}", i),
                _ => h.to_string(),
            })
            .collect();

        let mut cells: Vec<Vec<Option<String>>> = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| {
                format!(
                    "Failed to parse CSV record {} in {}",
                    line + 1,
                    self.path.display()
                )
            })?;
            cells.push(record.iter().map(parse_cell).collect());
        }

        let types: Vec<ColumnType> = (0..headers.len())
            .map(|col| infer_type(cells.iter().map(|row| row[col].as_deref())))
            .collect();

        let schema = Schema::new(
            headers
                .into_iter()
                .zip(types.iter())
                .map(|(name, ty)| Column::new(name, *ty))
                .collect(),
        );

        let rows = cells
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(types.iter())
                    .map(|(cell, ty)| typed_value(cell, *ty))
                    .collect()
            })
            .collect();

        Table::from_rows(schema, rows)
    }
}

impl Extractor for CsvReader {
    type Output = Table;

    async fn extract(&self) -> Result<Self::Output> {
        self.read()
    }
}

/// Write a [`Table`] to a CSV file, replacing any previous content
pub struct CsvWriter {
    path: PathBuf,
}

impl CsvWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn write(&self, table: &Table, index: IndexColumn) -> Result<()> {
        let mut writer = csv::Writer::from_path(&self.path)
            .with_context(|| format!("Failed to create CSV file: {}", self.path.display()))?;

        let mut header: Vec<&str> = Vec::with_capacity(table.schema().len() + 1);
        if index == IndexColumn::Include {
            header.push("");
        }
        header.extend(table.schema().names());
        writer.write_record(&header)?;

        for (position, row) in table.rows().iter().enumerate() {
            let mut record: Vec<String> = Vec::with_capacity(row.len() + 1);
            if index == IndexColumn::Include {
                record.push(position.to_string());
            }
            record.extend(row.iter().map(Value::to_cell));
            writer.write_record(&record)?;
        }

        writer
            .flush()
            .with_context(|| format!("Failed to write CSV file: {}", self.path.display()))?;
        Ok(())
    }
}

fn parse_cell(cell: &str) -> Option<String> {
    if NA_TOKENS.contains(&cell.trim()) {
        None
    } else {
        Some(cell.to_string())
    }
}

/// Narrowest type that fits every present cell; all-missing columns are text
fn infer_type<'a>(cells: impl Iterator<Item = Option<&'a str>>) -> ColumnType {
    let present: Vec<&str> = cells.flatten().map(str::trim).collect();
    if present.is_empty() {
        return ColumnType::Text;
    }

    if present.iter().all(|c| c.parse::<i64>().is_ok()) {
        ColumnType::Integer
    } else if present.iter().all(|c| c.parse::<f64>().is_ok()) {
        ColumnType::Float
    } else if present
        .iter()
        .all(|c| NaiveDate::parse_from_str(c, DATE_FORMAT).is_ok())
    {
        ColumnType::Date
    } else {
        ColumnType::Text
    }
}

fn typed_value(cell: Option<String>, ty: ColumnType) -> Value {
    let Some(cell) = cell else {
        return Value::Null;
    };
    let trimmed = cell.trim();
    // The inferred type fits every present cell, so these parses only fall
    // back to text if inference and parsing ever disagree.
    match ty {
        ColumnType::Integer => trimmed.parse().map(Value::Integer).unwrap_or(Value::Text(cell)),
        ColumnType::Float => trimmed.parse().map(Value::Float).unwrap_or(Value::Text(cell)),
        ColumnType::Date => NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .map(Value::Date)
            .unwrap_or(Value::Text(cell)),
        ColumnType::Text => Value::Text(cell),
    }
}
