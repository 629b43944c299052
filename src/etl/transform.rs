//! Transformer trait for data transformation

use eyre::Result;

/// Transformer trait for transforming data
///
/// Implementors define a single cleaning step:
/// - Dropping rows or columns
/// - Renaming columns
/// - Type conversion
///
/// # Example
/// ```
/// use house_sales_etl::etl::Transformer;
/// use house_sales_etl::table::Table;
/// use eyre::Result;
///
/// struct DropEverything;
///
/// impl Transformer for DropEverything {
///     type Input = Table;
///     type Output = Table;
///
///     fn transform(&self, mut input: Self::Input) -> Result<Self::Output> {
///         input.retain_rows(|_| false);
///         Ok(input)
///     }
/// }
/// ```
pub trait Transformer: Send + Sync {
    /// Input type
    type Input: Send;

    /// Output type after transformation
    type Output: Send;

    /// Transform the input
    ///
    /// # Errors
    /// Returns an error if transformation fails (validation, conversion, etc.)
    fn transform(&self, input: Self::Input) -> Result<Self::Output>;
}
