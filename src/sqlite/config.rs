use std::time::Duration;

use crate::driver::{Credentials, DriverKind};
use crate::error::SqlRecordsError;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);
const IN_MEMORY: &str = ":memory:";

/// Options for opening a `SQLite` connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteOptions {
    pub db_path: String,
    pub busy_timeout: Duration,
    pub read_only: bool,
    /// `PRAGMA journal_mode` applied after opening; `None` keeps the engine default.
    pub journal_mode: Option<String>,
}

impl SqliteOptions {
    /// File databases default to WAL so a read and a write connection can coexist.
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        let db_path = db_path.into();
        let journal_mode = (db_path != IN_MEMORY).then(|| "WAL".to_string());
        Self {
            db_path,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            read_only: false,
            journal_mode,
        }
    }

    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.db_path == IN_MEMORY
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout = timeout;
        self
    }

    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.opts.read_only = read_only;
        self
    }

    #[must_use]
    pub fn journal_mode(mut self, mode: Option<&str>) -> Self {
        self.opts.journal_mode = mode.map(str::to_string);
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }
}

/// Reads the `busy_timeout_ms`, `read_only` and `journal_mode` options.
impl TryFrom<&Credentials> for SqliteOptions {
    type Error = SqlRecordsError;

    fn try_from(creds: &Credentials) -> Result<Self, Self::Error> {
        if creds.driver != DriverKind::Sqlite {
            return Err(SqlRecordsError::ConfigError(format!(
                "credentials for {:?} cannot open a SQLite connection",
                creds.driver
            )));
        }
        let mut builder = SqliteOptionsBuilder::new(creds.dsn.clone());
        if let Some(ms) = creds.option("busy_timeout_ms") {
            let ms: u64 = ms.trim().parse().map_err(|_| {
                SqlRecordsError::ConfigError(format!("busy_timeout_ms must be a number, got `{ms}`"))
            })?;
            builder = builder.busy_timeout(Duration::from_millis(ms));
        }
        if let Some(flag) = creds.option("read_only") {
            let read_only = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(SqlRecordsError::ConfigError(format!(
                        "read_only must be a boolean, got `{other}`"
                    )));
                }
            };
            builder = builder.read_only(read_only);
        }
        if let Some(mode) = creds.option("journal_mode") {
            let mode = mode.trim();
            builder = builder.journal_mode((!mode.is_empty()).then_some(mode));
        }
        Ok(builder.finish())
    }
}
