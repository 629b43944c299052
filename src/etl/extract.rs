//! Extractor trait for data extraction from various sources

use eyre::Result;

/// Extractor trait for extracting data from a source
///
/// Implementors define how to pull a complete dataset out of:
/// - Relational databases
/// - Snapshot files
///
/// # Example
/// ```no_run
/// use house_sales_etl::etl::Extractor;
/// use house_sales_etl::table::{Schema, Table};
/// use eyre::Result;
///
/// struct EmptySource;
///
/// impl Extractor for EmptySource {
///     type Output = Table;
///
///     async fn extract(&self) -> Result<Self::Output> {
///         Ok(Table::new(Schema::default()))
///     }
/// }
/// ```
pub trait Extractor: Send + Sync {
    /// The type of data extracted
    type Output: Send;

    /// Extract everything from the source
    ///
    /// # Errors
    /// Returns an error if extraction fails (network, I/O, parsing, etc.)
    fn extract(&self) -> impl std::future::Future<Output = Result<Self::Output>> + Send;
}
