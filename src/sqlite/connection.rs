use std::fmt;

use rusqlite::OpenFlags;

use super::config::SqliteOptions;
use super::params::bind;
use super::query::build_result_set;
use super::schema;
use crate::driver::Connection;
use crate::error::DriverError;
use crate::params::BoundParams;
use crate::results::ResultSet;
use crate::schema::ColumnDescriptor;

/// One rusqlite connection implementing the driver contract.
pub struct SqliteConnection {
    pub(crate) conn: rusqlite::Connection,
    db_path: String,
}

impl SqliteConnection {
    /// Open the database described by `opts` and apply its pragmas.
    ///
    /// # Errors
    /// Returns `DriverError::Connect` if the file cannot be opened or a pragma fails.
    pub fn open(opts: &SqliteOptions) -> Result<Self, DriverError> {
        let connect_err = |e: rusqlite::Error| DriverError::Connect(format!("{}: {e}", opts.db_path));
        let conn = if opts.read_only {
            rusqlite::Connection::open_with_flags(
                &opts.db_path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
            )
        } else {
            rusqlite::Connection::open(&opts.db_path)
        }
        .map_err(connect_err)?;

        conn.busy_timeout(opts.busy_timeout).map_err(connect_err)?;
        if let Some(mode) = opts.journal_mode.as_deref().filter(|_| !opts.read_only) {
            conn.pragma_update_and_check(None, "journal_mode", mode, |row| row.get::<_, String>(0))
                .map_err(connect_err)?;
        }

        Ok(Self {
            conn,
            db_path: opts.db_path.clone(),
        })
    }

    #[must_use]
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    fn prepare(&self, sql: &str) -> Result<rusqlite::Statement<'_>, DriverError> {
        self.conn
            .prepare(sql)
            .map_err(|e| DriverError::Prepare(e.to_string()))
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("db_path", &self.db_path)
            .field("autocommit", &self.conn.is_autocommit())
            .finish()
    }
}

impl Connection for SqliteConnection {
    fn query(&mut self, sql: &str, params: &BoundParams) -> Result<ResultSet, DriverError> {
        let mut stmt = self.prepare(sql)?;
        bind(&mut stmt, params)?;
        build_result_set(&mut stmt)
    }

    fn execute(&mut self, sql: &str, params: &BoundParams) -> Result<usize, DriverError> {
        let mut stmt = self.prepare(sql)?;
        bind(&mut stmt, params)?;
        stmt.raw_execute()
            .map_err(|e| DriverError::Execute(e.to_string()))
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), DriverError> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| DriverError::Execute(e.to_string()))
    }

    fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    fn begin(&mut self) -> Result<(), DriverError> {
        self.execute_batch("BEGIN")
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.execute_batch("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.execute_batch("ROLLBACK")
    }

    fn list_tables(&mut self) -> Result<Vec<String>, DriverError> {
        schema::list_tables(&self.conn)
    }

    fn describe_table(&mut self, table: &str) -> Result<Vec<ColumnDescriptor>, DriverError> {
        schema::describe_table(&self.conn, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RowValues;

    fn memory() -> SqliteConnection {
        SqliteConnection::open(&SqliteOptions::new(":memory:")).unwrap()
    }

    #[test]
    fn query_and_execute() {
        let mut conn = memory();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT NOT NULL);")
            .unwrap();
        let inserted = conn
            .execute(
                "INSERT INTO t (name) VALUES (:name)",
                &BoundParams::Named(vec![(":name".into(), RowValues::Text("a".into()))]),
            )
            .unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(conn.last_insert_id(), 1);

        let rs = conn
            .query(
                "SELECT id, name FROM t WHERE id = ?",
                &BoundParams::Positional(vec![RowValues::Int(1)]),
            )
            .unwrap();
        assert_eq!(rs.len(), 1);
        assert_eq!(rs.results[0].get("name"), Some(&RowValues::Text("a".into())));
    }

    #[test]
    fn malformed_sql_is_a_prepare_error() {
        let mut conn = memory();
        let err = conn
            .query("SELEC nothing", &BoundParams::Positional(vec![]))
            .unwrap_err();
        assert!(matches!(err, DriverError::Prepare(_)));
    }

    #[test]
    fn rollback_discards_writes() {
        let mut conn = memory();
        conn.execute_batch("CREATE TABLE t (v INTEGER);").unwrap();
        conn.begin().unwrap();
        conn.execute("INSERT INTO t VALUES (1)", &BoundParams::Positional(vec![]))
            .unwrap();
        conn.rollback().unwrap();
        let rs = conn
            .query("SELECT COUNT(*) AS n FROM t", &BoundParams::Positional(vec![]))
            .unwrap();
        assert_eq!(rs.results[0].get("n"), Some(&RowValues::Int(0)));
    }
}
