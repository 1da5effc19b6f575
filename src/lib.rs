//! Synchronous data-access layer with a schema-driven record generator.
//!
//! An [`Executor`] owns a lazily opened read connection and an optional write connection,
//! caches result sets and offers small CRUD helpers. The [`codegen`] module introspects a
//! database and writes one Rust module per table; each generated type wraps a [`Record`]
//! which loads large columns on demand and validates every assignment.
//!
//! ```rust,no_run
//! use sql_records::prelude::*;
//!
//! # fn main() -> Result<(), SqlRecordsError> {
//! let db = Executor::new(Credentials::sqlite("app.db"), Some(Credentials::sqlite("app.db")));
//! let rows = db.get_list("SELECT id, name FROM users WHERE id > :id", Params::named([("id", 10)]))?;
//! for row in &rows {
//!     println!("{:?}", row.get("name"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod codegen;
pub mod driver;
pub mod error;
pub mod executor;
pub mod params;
pub mod prelude;
pub mod query_builder;
pub mod record;
pub mod results;
mod sanitize;
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod types;

pub use chrono;

pub use driver::{Connection, Connector, Credentials, DriverKind};
pub use error::{DriverError, SqlRecordsError};
pub use executor::{ErrorHandler, Executor, ExecutorConfig, MappedQuery};
pub use params::Params;
pub use query_builder::{DeleteQuery, InsertQuery, Operator, SelectQuery, UpdateQuery, Where};
pub use record::{Record, SaveOutcome, TableRecord};
pub use results::{CustomDbRow, FromRow, ResultSet};
pub use types::RowValues;
