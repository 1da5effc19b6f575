use thiserror::Error;

/// Failure reported by a driver before the executor attaches query context.
///
/// Drivers never hand their native error types to callers; they are flattened into this
/// shape and then lifted into [`SqlRecordsError`] by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// The connection could not be opened.
    Connect(String),
    /// The statement text was rejected when preparing it.
    Prepare(String),
    /// The statement was prepared but running it failed.
    Execute(String),
}

impl DriverError {
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            DriverError::Connect(d) | DriverError::Prepare(d) | DriverError::Execute(d) => d,
        }
    }
}

#[derive(Debug, Error)]
pub enum SqlRecordsError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Failed to prepare query `{query}`: {detail}")]
    PrepareError { query: String, detail: String },

    #[error("Failed query `{query}`: {detail}")]
    ExecutionError { query: String, detail: String },

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Primary key `{key}` of `{table}` is not set")]
    MissingPrimaryKey { table: String, key: String },

    #[error("Transaction error: {0}")]
    TransactionError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SqlRecordsError {
    /// Code attached to every prepare/execute failure passed to an error handler.
    pub const CODE: i32 = 2;

    pub(crate) fn from_driver(err: DriverError, query: &str) -> Self {
        match err {
            DriverError::Connect(detail) => SqlRecordsError::ConnectionError(detail),
            DriverError::Prepare(detail) => SqlRecordsError::PrepareError {
                query: query.to_string(),
                detail,
            },
            DriverError::Execute(detail) => SqlRecordsError::ExecutionError {
                query: query.to_string(),
                detail,
            },
        }
    }

    /// Text handed to an error handler: `Code: 2\t<message>`.
    #[must_use]
    pub fn handler_message(&self) -> String {
        format!("Code: {}\t{self}", Self::CODE)
    }

    /// Whether this failure may be routed through a configured error handler.
    ///
    /// Only statement failures are; configuration and validation problems always surface.
    #[must_use]
    pub fn is_statement_failure(&self) -> bool {
        matches!(
            self,
            SqlRecordsError::PrepareError { .. } | SqlRecordsError::ExecutionError { .. }
        )
    }
}

impl From<serde_json::Error> for SqlRecordsError {
    fn from(err: serde_json::Error) -> Self {
        SqlRecordsError::ConfigError(format!("invalid JSON: {err}"))
    }
}
