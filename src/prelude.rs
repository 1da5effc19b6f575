//! Convenient imports for common functionality.
//!
//! `use sql_records::prelude::*;` brings in the executor, parameters, rows, the query
//! builder and the record traits generated code relies on.

pub use crate::driver::{Credentials, DriverKind};
pub use crate::error::SqlRecordsError;
pub use crate::executor::{Executor, ExecutorConfig};
pub use crate::params::Params;
pub use crate::query_builder::{
    DeleteQuery, InsertQuery, Operator, SelectQuery, UpdateQuery, Where, WhereValue,
};
pub use crate::record::{Record, SaveOutcome, TableRecord};
pub use crate::results::{CustomDbRow, FromRow, ResultSet};
pub use crate::types::RowValues;

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteConnection, SqliteOptions};
