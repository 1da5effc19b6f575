use tracing::debug;

use super::column::ColumnDescriptor;
use super::definition::TableDefinition;
use crate::error::SqlRecordsError;
use crate::executor::Executor;

/// Reads table and column metadata through an [`Executor`].
#[derive(Clone, Copy)]
pub struct Introspector<'db> {
    db: &'db Executor,
}

impl<'db> Introspector<'db> {
    #[must_use]
    pub fn new(db: &'db Executor) -> Self {
        Self { db }
    }

    /// Table names in catalogue order.
    ///
    /// # Errors
    /// Propagates connection and statement failures from the executor.
    pub fn tables(&self) -> Result<Vec<String>, SqlRecordsError> {
        self.db.list_tables()
    }

    /// Columns of `table` in declaration order.
    ///
    /// # Errors
    /// Propagates connection and statement failures from the executor.
    pub fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, SqlRecordsError> {
        self.db.describe_table(table)
    }

    /// Describe and classify `table`.
    ///
    /// # Errors
    /// Returns `SqlRecordsError::SchemaError` when the table has no columns or a column
    /// cannot be classified.
    pub fn definition(&self, table: &str) -> Result<TableDefinition, SqlRecordsError> {
        let columns = self.columns(table)?;
        if columns.is_empty() {
            return Err(SqlRecordsError::SchemaError(format!(
                "table `{table}` has no columns or does not exist"
            )));
        }
        debug!(table, columns = columns.len(), "introspected table");
        TableDefinition::from_columns(table, &columns)
    }
}
