//! Driver contract between the executor and a database engine.
//!
//! The executor only ever talks to a boxed [`Connection`]; the engine behind it is opaque.
//! Drivers report failures as [`DriverError`] and the executor attaches query context.

use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{DriverError, SqlRecordsError};
use crate::params::BoundParams;
use crate::results::ResultSet;
use crate::schema::ColumnDescriptor;

/// Engine behind a set of credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Bundled `SQLite` through rusqlite
    #[cfg(feature = "sqlite")]
    Sqlite,
    /// Connection supplied by a caller-provided connector
    Custom,
}

/// Connection settings for one role (read or write).
///
/// ```rust
/// use sql_records::prelude::*;
///
/// let creds: Credentials = serde_json::from_str(
///     r#"{ "driver": "sqlite", "dsn": "app.db", "options": { "busy_timeout_ms": "2000" } }"#,
/// ).unwrap();
/// assert_eq!(creds.option("busy_timeout_ms"), Some("2000"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub driver: DriverKind,
    /// Engine specific location, a file path for `SQLite`.
    pub dsn: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Free-form driver options.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl Credentials {
    #[cfg(feature = "sqlite")]
    #[must_use]
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self::new(DriverKind::Sqlite, path)
    }

    #[must_use]
    pub fn new(driver: DriverKind, dsn: impl Into<String>) -> Self {
        Self {
            driver,
            dsn: dsn.into(),
            user: None,
            password: None,
            options: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Load credentials from a JSON file.
    ///
    /// # Errors
    /// Returns `SqlRecordsError::Io` if the file cannot be read and
    /// `SqlRecordsError::ConfigError` if it is not valid credentials JSON.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self, SqlRecordsError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// One live connection to the engine.
///
/// Named parameters arrive already normalised to `:name`.
pub trait Connection {
    /// Run a statement that returns rows.
    fn query(&mut self, sql: &str, params: &BoundParams) -> Result<ResultSet, DriverError>;

    /// Run a statement and return the number of affected rows.
    fn execute(&mut self, sql: &str, params: &BoundParams) -> Result<usize, DriverError>;

    /// Run one or more statements without parameters.
    fn execute_batch(&mut self, sql: &str) -> Result<(), DriverError>;

    /// Key generated by the most recent successful INSERT on this connection.
    fn last_insert_id(&self) -> i64;

    fn begin(&mut self) -> Result<(), DriverError>;

    fn commit(&mut self) -> Result<(), DriverError>;

    fn rollback(&mut self) -> Result<(), DriverError>;

    /// Schema command: table names in catalogue order.
    fn list_tables(&mut self) -> Result<Vec<String>, DriverError>;

    /// Schema command: columns of `table` in declaration order.
    fn describe_table(&mut self, table: &str) -> Result<Vec<ColumnDescriptor>, DriverError>;
}

/// Opens connections for the executor.
pub type Connector = Box<dyn Fn(&Credentials) -> Result<Box<dyn Connection>, SqlRecordsError>>;

/// Open a connection with the driver named by `creds.driver`.
///
/// # Errors
/// Returns `SqlRecordsError::ConnectionError` if the engine refuses the connection and
/// `SqlRecordsError::ConfigError` for [`DriverKind::Custom`], which needs a connector.
pub fn connect(creds: &Credentials) -> Result<Box<dyn Connection>, SqlRecordsError> {
    match creds.driver {
        #[cfg(feature = "sqlite")]
        DriverKind::Sqlite => {
            let conn = crate::sqlite::SqliteConnection::open(&creds.try_into()?)
                .map_err(|e| SqlRecordsError::ConnectionError(e.detail().to_string()))?;
            Ok(Box::new(conn))
        }
        DriverKind::Custom => Err(SqlRecordsError::ConfigError(
            "custom credentials need a connector (Executor::with_connector)".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_driver_needs_connector() {
        let creds = Credentials::new(DriverKind::Custom, "anything");
        assert!(matches!(
            connect(&creds),
            Err(SqlRecordsError::ConfigError(_))
        ));
    }

    #[test]
    fn credentials_from_json() {
        let creds: Credentials = serde_json::from_str(
            r#"{ "driver": "custom", "dsn": "x", "user": "root", "password": "secret" }"#,
        )
        .unwrap();
        assert_eq!(creds.driver, DriverKind::Custom);
        assert_eq!(creds.user.as_deref(), Some("root"));
        assert!(creds.options.is_empty());
    }
}
