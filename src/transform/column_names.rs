//! Column name normalizer
//!
//! `Bedroom2` becomes `bedroom`, `Year Built` becomes `year_built`.

use crate::etl::Transformer;
use crate::table::Table;
use eyre::Result;
use regex::Regex;
use std::sync::LazyLock;

static NOT_LETTER_OR_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z ]+").unwrap());

/// Normalize a raw column name
///
/// Strips everything but ASCII letters and spaces, lower-cases, trims, and
/// turns the remaining spaces into underscores.
pub fn normalize_column_name(raw: &str) -> String {
    NOT_LETTER_OR_SPACE
        .replace_all(raw, "")
        .to_lowercase()
        .trim()
        .replace(' ', "_")
}

/// Transformer that normalizes every column name
///
/// Fails if a name normalizes to nothing, or if two columns end up with the
/// same name.
#[derive(Default)]
pub struct ColumnNameNormalizer;

impl ColumnNameNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for ColumnNameNormalizer {
    type Input = Table;
    type Output = Table;

    fn transform(&self, mut input: Self::Input) -> Result<Self::Output> {
        input.rename_columns(|raw| {
            let name = normalize_column_name(raw);
            if name.is_empty() {
                eyre::bail!("Column '{}' has no letters left after normalization", raw);
            }
            Ok(name)
        })?;
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, ColumnType, Schema};

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("Unnamed: 0"), "unnamed");
        assert_eq!(normalize_column_name("Bedroom2"), "bedroom");
        assert_eq!(normalize_column_name("YearBuilt"), "yearbuilt");
        assert_eq!(normalize_column_name("  Council Area "), "council_area");
        assert_eq!(normalize_column_name("Land-size (m2)"), "landsize_m");
        assert_eq!(normalize_column_name("Sale  Date"), "sale__date");
    }

    fn table(names: &[&str]) -> Table {
        Table::new(Schema::new(
            names.iter().map(|n| Column::new(*n, ColumnType::Text)).collect(),
        ))
    }

    #[test]
    fn test_normalizes_every_column() {
        let output = ColumnNameNormalizer::new()
            .transform(table(&["Unnamed: 0", "Suburb", "Regionname", "Car"]))
            .unwrap();
        assert_eq!(
            output.schema().names().collect::<Vec<_>>(),
            ["unnamed", "suburb", "regionname", "car"]
        );
    }

    #[test]
    fn test_collision_is_an_error() {
        let err = ColumnNameNormalizer::new()
            .transform(table(&["Bedroom", "Bedroom2"]))
            .unwrap_err();
        assert!(err.to_string().contains("both map to 'bedroom'"));
    }

    #[test]
    fn test_empty_name_is_an_error() {
        let err = ColumnNameNormalizer::new()
            .transform(table(&["2020"]))
            .unwrap_err();
        assert!(err.to_string().contains("no letters left"));
    }
}
