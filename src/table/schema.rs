//! Table schemas and column requirements

use eyre::Result;

/// The type of every value in a column (missing values aside)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    Date,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Date => write!(f, "date"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A column a stage expects to find in its input
///
/// `ty: None` accepts any column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRequirement {
    pub name: &'static str,
    pub ty: Option<ColumnType>,
}

impl ColumnRequirement {
    pub const fn named(name: &'static str) -> Self {
        Self { name, ty: None }
    }

    pub const fn typed(name: &'static str, ty: ColumnType) -> Self {
        Self { name, ty: Some(ty) }
    }
}

/// Ordered list of named, typed columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub(crate) fn columns_mut(&mut self) -> &mut Vec<Column> {
        &mut self.columns
    }

    /// Check that every requirement is met
    ///
    /// # Errors
    /// Lists every missing or mistyped column in a single error.
    pub fn check(&self, requirements: &[ColumnRequirement]) -> Result<()> {
        let problems: Vec<String> = requirements
            .iter()
            .filter_map(|req| match (self.column(req.name), req.ty) {
                (None, _) => Some(format!("missing column '{}'", req.name)),
                (Some(col), Some(ty)) if col.ty != ty => Some(format!(
                    "column '{}' is {}, expected {}",
                    req.name, col.ty, ty
                )),
                _ => None,
            })
            .collect();

        if !problems.is_empty() {
            eyre::bail!("Schema check failed: {}", problems.join(", "));
        }
        Ok(())
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cols: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{}: {}", c.name, c.ty))
            .collect();
        write!(f, "[{}]", cols.join(", "))
    }
}
