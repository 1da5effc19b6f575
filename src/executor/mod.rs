//! Query executor: lazily opened read/write connections, uniform failure handling, the
//! result cache and the CRUD helpers built on the query builder.

mod mapper;

pub use mapper::MappedQuery;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::cache::ResultCache;
use crate::driver::{Connection, Connector, Credentials, connect};
use crate::error::{DriverError, SqlRecordsError};
use crate::params::Params;
use crate::query_builder::{DeleteQuery, InsertQuery, SelectQuery, UpdateQuery, Where};
use crate::results::{CustomDbRow, FromRow, ResultSet};
use crate::schema::ColumnDescriptor;
use crate::types::RowValues;

/// Receives statement failures when configured; the failing call then returns its empty value.
pub type ErrorHandler = Box<dyn Fn(&SqlRecordsError)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Read,
    Write,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::Read => "read",
            Role::Write => "write",
        }
    }
}

/// Read and optional write credentials as stored in a JSON config file.
///
/// ```json
/// { "read": { "driver": "sqlite", "dsn": "app.db" },
///   "write": { "driver": "sqlite", "dsn": "app.db" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecutorConfig {
    pub read: Credentials,
    #[serde(default)]
    pub write: Option<Credentials>,
}

impl ExecutorConfig {
    /// # Errors
    /// Returns `SqlRecordsError::Io` or `SqlRecordsError::ConfigError` if the file cannot be read
    /// or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SqlRecordsError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Issues parameterised statements against one read and one write connection.
///
/// Connections open on first use and live as long as the executor. The executor is not
/// `Sync`; records borrow it for their lifetime.
///
/// ```rust,no_run
/// use sql_records::prelude::*;
///
/// # fn main() -> Result<(), SqlRecordsError> {
/// let db = Executor::new(Credentials::sqlite("app.db"), Some(Credentials::sqlite("app.db")));
/// db.exec("CREATE TABLE IF NOT EXISTS t (id INTEGER PRIMARY KEY, name TEXT)")?;
/// let id = db.insert_query("INSERT INTO t (name) VALUES (:name)", Params::named([("name", "a")]))?;
/// let name = db.get_value("SELECT name AS value FROM t WHERE id = :id", Params::named([("id", id)]))?;
/// assert_eq!(name, Some(RowValues::Text("a".into())));
/// # Ok(())
/// # }
/// ```
pub struct Executor {
    read_creds: Credentials,
    write_creds: Option<Credentials>,
    connector: Connector,
    read_conn: RefCell<Option<Box<dyn Connection>>>,
    write_conn: RefCell<Option<Box<dyn Connection>>>,
    error_handler: Option<ErrorHandler>,
    cache: RefCell<ResultCache>,
    in_transaction: Cell<bool>,
    statements: Cell<u64>,
}

impl Executor {
    /// Without write credentials every write operation fails with `ConfigError`.
    #[must_use]
    pub fn new(read: Credentials, write: Option<Credentials>) -> Self {
        Self {
            read_creds: read,
            write_creds: write,
            connector: Box::new(connect),
            read_conn: RefCell::new(None),
            write_conn: RefCell::new(None),
            error_handler: None,
            cache: RefCell::new(ResultCache::default()),
            in_transaction: Cell::new(false),
            statements: Cell::new(0),
        }
    }

    #[must_use]
    pub fn from_config(config: ExecutorConfig) -> Self {
        Self::new(config.read, config.write)
    }

    /// Route prepare/execute failures to `handler` instead of returning them.
    #[must_use]
    pub fn with_error_handler(mut self, handler: impl Fn(&SqlRecordsError) + 'static) -> Self {
        self.error_handler = Some(Box::new(handler));
        self
    }

    /// Open connections with `connector` instead of the built-in drivers.
    #[must_use]
    pub fn with_connector(
        mut self,
        connector: impl Fn(&Credentials) -> Result<Box<dyn Connection>, SqlRecordsError> + 'static,
    ) -> Self {
        self.connector = Box::new(connector);
        self
    }

    /// Statements issued so far, including failed ones.
    #[must_use]
    pub fn statement_count(&self) -> u64 {
        self.statements.get()
    }

    #[must_use]
    pub fn has_write_connection(&self) -> bool {
        self.write_creds.is_some()
    }

    // -- connection plumbing ------------------------------------------------------------

    fn with_conn<R>(
        &self,
        role: Role,
        sql: &str,
        op: impl FnOnce(&mut dyn Connection) -> Result<R, DriverError>,
    ) -> Result<R, SqlRecordsError> {
        // an open transaction lives on the write connection; reads follow it there
        let role = if role == Role::Read && self.in_transaction.get() && self.write_creds.is_some()
        {
            Role::Write
        } else {
            role
        };
        let (slot, creds) = match role {
            Role::Read => (&self.read_conn, Some(&self.read_creds)),
            Role::Write => (&self.write_conn, self.write_creds.as_ref()),
        };
        let creds = creds.ok_or_else(|| {
            SqlRecordsError::ConfigError(
                "Database connection settings not provided for write operation.".into(),
            )
        })?;
        let mut slot = slot.try_borrow_mut().map_err(|_| {
            SqlRecordsError::ConnectionError(format!("{} connection is busy", role.as_str()))
        })?;
        if slot.is_none() {
            debug!(role = role.as_str(), dsn = creds.dsn.as_str(), "opening connection");
            *slot = Some((self.connector)(creds)?);
        }
        let Some(conn) = slot.as_deref_mut() else {
            return Err(SqlRecordsError::ConnectionError(format!(
                "{} connection unavailable",
                role.as_str()
            )));
        };
        self.statements.set(self.statements.get() + 1);
        debug!(role = role.as_str(), sql, "statement");
        op(conn).map_err(|e| SqlRecordsError::from_driver(e, sql))
    }

    /// Hand statement failures to the error handler, if any, and substitute the empty value.
    fn route<T: Default>(&self, result: Result<T, SqlRecordsError>) -> Result<T, SqlRecordsError> {
        match (result, &self.error_handler) {
            (Err(err), Some(handler)) if err.is_statement_failure() => {
                warn!(code = SqlRecordsError::CODE, error = %err, "statement failed");
                handler(&err);
                Ok(T::default())
            }
            (result, _) => result,
        }
    }

    fn run_query(&self, sql: &str, params: &Params) -> Result<ResultSet, SqlRecordsError> {
        let bound = params.bind();
        self.with_conn(Role::Read, sql, |conn| conn.query(sql, &bound))
    }

    fn run_execute(&self, sql: &str, params: &Params) -> Result<usize, SqlRecordsError> {
        let bound = params.bind();
        self.with_conn(Role::Write, sql, |conn| conn.execute(sql, &bound))
    }

    // -- reads --------------------------------------------------------------------------

    /// Run a statement returning rows on the read connection.
    ///
    /// # Errors
    /// `PrepareError`/`ExecutionError` unless an error handler is set; connection and
    /// configuration failures always.
    pub fn query(&self, sql: &str, params: impl Into<Params>) -> Result<ResultSet, SqlRecordsError> {
        self.route(self.run_query(sql, &params.into()))
    }

    /// All rows of a query.
    ///
    /// # Errors
    /// As [`Executor::query`].
    pub fn get_list(
        &self,
        sql: &str,
        params: impl Into<Params>,
    ) -> Result<Vec<CustomDbRow>, SqlRecordsError> {
        Ok(self.query(sql, params)?.results)
    }

    /// First row of a query, if any.
    ///
    /// # Errors
    /// As [`Executor::query`].
    pub fn get_row(
        &self,
        sql: &str,
        params: impl Into<Params>,
    ) -> Result<Option<CustomDbRow>, SqlRecordsError> {
        Ok(self.query(sql, params)?.results.into_iter().next())
    }

    /// Column `value` of the first row.
    ///
    /// # Errors
    /// As [`Executor::get_value_of`].
    pub fn get_value(
        &self,
        sql: &str,
        params: impl Into<Params>,
    ) -> Result<Option<RowValues>, SqlRecordsError> {
        self.get_value_of(sql, params, "value")
    }

    /// Column `field` of the first row; `None` when the query returns no rows.
    ///
    /// # Errors
    /// `ParameterError` if the row has no such column, otherwise as [`Executor::query`].
    pub fn get_value_of(
        &self,
        sql: &str,
        params: impl Into<Params>,
        field: &str,
    ) -> Result<Option<RowValues>, SqlRecordsError> {
        let Some(row) = self.get_row(sql, params)? else {
            return Ok(None);
        };
        row.get(field).cloned().map(Some).ok_or_else(|| {
            SqlRecordsError::ParameterError(format!(
                "Query is not returning the expected field `{field}`"
            ))
        })
    }

    /// `SELECT field AS value FROM table WHERE <filter> LIMIT 1`.
    ///
    /// # Errors
    /// As [`Executor::get_value`].
    pub fn get_field(
        &self,
        table: &str,
        field: &str,
        filter: impl fmt::Display,
        params: impl Into<Params>,
    ) -> Result<Option<RowValues>, SqlRecordsError> {
        let sql = SelectQuery::new(table)
            .field(format!("{field} AS value"))
            .filter(filter)
            .limit(1)
            .to_sql();
        self.get_value(&sql, params)
    }

    /// One row of `table` by key. With `cached`, the whole table (restricted to `fields`) is
    /// read once and later look-ups are served from the cache.
    ///
    /// # Errors
    /// As [`Executor::query`].
    pub fn get_record(
        &self,
        table: &str,
        pk: &str,
        id: impl Into<RowValues>,
        fields: &[&str],
        cached: bool,
    ) -> Result<Option<CustomDbRow>, SqlRecordsError> {
        let id = id.into();
        let select = SelectQuery::new(table).fields(fields.iter().copied());
        if cached {
            return self.get_cached_row(&id.to_key_string(), &select.to_sql(), Params::None, pk);
        }
        let sql = select.filter(Where::eq(pk, ":id")).limit(1).to_sql();
        self.get_row(&sql, Params::named([("id", id)]))
    }

    /// Rows matching a built SELECT.
    ///
    /// # Errors
    /// As [`Executor::query`].
    pub fn get_records(
        &self,
        select: &SelectQuery,
        params: impl Into<Params>,
    ) -> Result<Vec<CustomDbRow>, SqlRecordsError> {
        self.get_list(&select.to_sql(), params)
    }

    /// Map the rows of the next query into `T` instead of [`CustomDbRow`].
    #[must_use]
    pub fn map_into<T: FromRow>(&self) -> MappedQuery<'_, T> {
        MappedQuery::new(self)
    }

    // -- cache --------------------------------------------------------------------------

    fn cached_entry<R>(
        &self,
        sql: &str,
        params: Params,
        key_column: &str,
        read: impl FnOnce(&crate::cache::CacheEntry) -> R,
    ) -> Result<Option<R>, SqlRecordsError> {
        let id = ResultCache::cache_id(sql, &params);
        if !self.cache.borrow().contains(&id) {
            let rows = match self.run_query(sql, &params) {
                Ok(rs) => rs.results,
                Err(err) => {
                    // a handled failure is not cached
                    self.route(Err::<(), _>(err))?;
                    return Ok(None);
                }
            };
            debug!(key_column, rows = rows.len(), "caching result set");
            self.cache.borrow_mut().insert(id.clone(), rows, key_column);
        }
        Ok(self.cache.borrow().get(&id).map(read))
    }

    /// Row whose `key_column` equals `key` from the cached result of `sql`.
    ///
    /// The first call for a query and parameter combination runs it and indexes the rows by
    /// `key_column`; later calls ignore `key_column` and read the stored index.
    ///
    /// # Errors
    /// As [`Executor::query`].
    pub fn get_cached_row(
        &self,
        key: &str,
        sql: &str,
        params: impl Into<Params>,
        key_column: &str,
    ) -> Result<Option<CustomDbRow>, SqlRecordsError> {
        Ok(self
            .cached_entry(sql, params.into(), key_column, |entry| entry.row(key).cloned())?
            .flatten())
    }

    /// Every cached row sharing `key`.
    ///
    /// # Errors
    /// As [`Executor::query`].
    pub fn get_cached_rows(
        &self,
        key: &str,
        sql: &str,
        params: impl Into<Params>,
        key_column: &str,
    ) -> Result<Vec<CustomDbRow>, SqlRecordsError> {
        Ok(self
            .cached_entry(sql, params.into(), key_column, |entry| {
                entry.rows_for(key).into_iter().cloned().collect()
            })?
            .unwrap_or_default())
    }

    /// Cached rows of `sql`, empty when it has not been cached. Never queries.
    #[must_use]
    pub fn get_list_from_cache(&self, sql: &str, params: impl Into<Params>) -> Vec<CustomDbRow> {
        let id = ResultCache::cache_id(sql, &params.into());
        self.cache
            .borrow()
            .get(&id)
            .map(|entry| entry.rows().to_vec())
            .unwrap_or_default()
    }

    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    // -- writes -------------------------------------------------------------------------

    /// Run an INSERT on the write connection and return the generated key.
    ///
    /// # Errors
    /// `ConfigError` without write credentials, otherwise as [`Executor::query`].
    pub fn insert_query(&self, sql: &str, params: impl Into<Params>) -> Result<i64, SqlRecordsError> {
        let bound = params.into().bind();
        let result = self.with_conn(Role::Write, sql, |conn| {
            conn.execute(sql, &bound)?;
            Ok(conn.last_insert_id())
        });
        self.route(result)
    }

    /// Run an UPDATE and return the affected row count.
    ///
    /// # Errors
    /// As [`Executor::insert_query`].
    pub fn update_query(&self, sql: &str, params: impl Into<Params>) -> Result<usize, SqlRecordsError> {
        self.route(self.run_execute(sql, &params.into()))
    }

    /// Run a DELETE and return the affected row count.
    ///
    /// # Errors
    /// As [`Executor::insert_query`].
    pub fn delete_query(&self, sql: &str, params: impl Into<Params>) -> Result<usize, SqlRecordsError> {
        self.route(self.run_execute(sql, &params.into()))
    }

    /// Run one or more statements without parameters on the write connection.
    ///
    /// # Errors
    /// As [`Executor::insert_query`].
    pub fn exec(&self, sql: &str) -> Result<(), SqlRecordsError> {
        self.route(self.with_conn(Role::Write, sql, |conn| conn.execute_batch(sql)))
    }

    /// Insert `values` into `table`. When `allowed_fields` is not empty, other keys are
    /// dropped first.
    ///
    /// # Errors
    /// As [`Executor::insert_query`].
    pub fn insert(
        &self,
        table: &str,
        values: &IndexMap<String, RowValues>,
        allowed_fields: &[&str],
    ) -> Result<i64, SqlRecordsError> {
        let (sql, params) = InsertQuery::new(table)
            .values(
                values
                    .iter()
                    .filter(|(k, _)| allowed_fields.is_empty() || allowed_fields.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone().into_wire())),
            )
            .build();
        self.insert_query(&sql, params)
    }

    /// `UPDATE table SET ... WHERE <filter>`; an empty `values` map issues nothing.
    ///
    /// # Errors
    /// As [`Executor::insert_query`].
    pub fn update(
        &self,
        table: &str,
        values: &IndexMap<String, RowValues>,
        filter: impl fmt::Display,
        params: impl Into<Params>,
    ) -> Result<usize, SqlRecordsError> {
        if values.is_empty() {
            return Ok(0);
        }
        let (sql, params) = UpdateQuery::new(table)
            .values(values.iter().map(|(k, v)| (k.clone(), v.clone().into_wire())))
            .filter(filter, params.into())
            .build();
        self.update_query(&sql, params)
    }

    /// `DELETE FROM table WHERE <filter>`.
    ///
    /// # Errors
    /// As [`Executor::insert_query`].
    pub fn delete(
        &self,
        table: &str,
        filter: impl fmt::Display,
        params: impl Into<Params>,
    ) -> Result<usize, SqlRecordsError> {
        let sql = DeleteQuery::new(table).filter(filter).to_sql();
        self.delete_query(&sql, params)
    }

    // -- transactions -------------------------------------------------------------------

    /// Begin a transaction on the write connection.
    ///
    /// # Errors
    /// `TransactionError` if one is already open or the engine refuses it.
    pub fn start_transaction(&self) -> Result<(), SqlRecordsError> {
        if self.in_transaction.get() {
            return Err(SqlRecordsError::TransactionError(
                "transaction already in progress".into(),
            ));
        }
        self.with_conn(Role::Write, "BEGIN", |conn| conn.begin())
            .map_err(transaction_error)?;
        self.in_transaction.set(true);
        Ok(())
    }

    /// # Errors
    /// `TransactionError` without an open transaction or if the commit fails; the
    /// transaction stays open in the latter case.
    pub fn commit(&self) -> Result<(), SqlRecordsError> {
        if !self.in_transaction.get() {
            return Err(SqlRecordsError::TransactionError(
                "no transaction in progress".into(),
            ));
        }
        self.with_conn(Role::Write, "COMMIT", |conn| conn.commit())
            .map_err(transaction_error)?;
        self.in_transaction.set(false);
        Ok(())
    }

    /// # Errors
    /// `TransactionError` without an open transaction or if the rollback fails.
    pub fn rollback(&self) -> Result<(), SqlRecordsError> {
        if !self.in_transaction.get() {
            return Err(SqlRecordsError::TransactionError(
                "no transaction in progress".into(),
            ));
        }
        self.in_transaction.set(false);
        self.with_conn(Role::Write, "ROLLBACK", |conn| conn.rollback())
            .map_err(transaction_error)
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.in_transaction.get()
    }

    // -- schema commands ----------------------------------------------------------------

    /// # Errors
    /// As [`Executor::query`].
    pub fn list_tables(&self) -> Result<Vec<String>, SqlRecordsError> {
        self.route(self.with_conn(Role::Read, "list tables", |conn| conn.list_tables()))
    }

    /// # Errors
    /// As [`Executor::query`].
    pub fn describe_table(&self, table: &str) -> Result<Vec<ColumnDescriptor>, SqlRecordsError> {
        let label = format!("describe `{table}`");
        self.route(self.with_conn(Role::Read, &label, |conn| conn.describe_table(table)))
    }
}

fn transaction_error(err: SqlRecordsError) -> SqlRecordsError {
    match err {
        SqlRecordsError::PrepareError { detail, .. } | SqlRecordsError::ExecutionError { detail, .. } => {
            SqlRecordsError::TransactionError(detail)
        }
        other => other,
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("read", &self.read_creds.dsn)
            .field("write", &self.write_creds.as_ref().map(|c| &c.dsn))
            .field("error_handler", &self.error_handler.is_some())
            .field("in_transaction", &self.in_transaction.get())
            .field("statements", &self.statements.get())
            .finish_non_exhaustive()
    }
}
