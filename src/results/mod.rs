//! Generic result rows and the `FromRow` mapping used for typed fetches.

mod result_set;
mod row;

pub use result_set::ResultSet;
pub use row::CustomDbRow;

use crate::error::SqlRecordsError;

/// Build a caller-chosen type from one generic row.
///
/// ```rust
/// use sql_records::prelude::*;
///
/// struct Name(String);
///
/// impl FromRow for Name {
///     fn from_row(row: &CustomDbRow) -> Result<Self, SqlRecordsError> {
///         row.get("name")
///             .and_then(RowValues::as_text)
///             .map(|s| Name(s.to_string()))
///             .ok_or_else(|| SqlRecordsError::ValidationError("missing name".into()))
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// # Errors
    /// Implementations return `SqlRecordsError` when the row cannot be converted.
    fn from_row(row: &CustomDbRow) -> Result<Self, SqlRecordsError>;
}

impl FromRow for CustomDbRow {
    fn from_row(row: &CustomDbRow) -> Result<Self, SqlRecordsError> {
        Ok(row.clone())
    }
}

impl FromRow for indexmap::IndexMap<String, crate::types::RowValues> {
    fn from_row(row: &CustomDbRow) -> Result<Self, SqlRecordsError> {
        Ok(row
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect())
    }
}
