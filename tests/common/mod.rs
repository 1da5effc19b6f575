#![allow(dead_code)]

use sql_records::prelude::*;
use tempfile::TempDir;

/// Executor with separate read and write connections on a fresh database file, with `ddl`
/// applied. Keep the `TempDir` alive for as long as the executor is used.
pub fn scratch_db(ddl: &str) -> (TempDir, Executor) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scratch.db");
    let creds = Credentials::sqlite(path.to_string_lossy());
    let db = Executor::new(creds.clone(), Some(creds));
    db.exec(ddl).expect("schema");
    (dir, db)
}

pub const PEOPLE: &str = "
    CREATE TABLE t (
        id INTEGER PRIMARY KEY,
        name varchar(10) NOT NULL,
        bio text,
        status varchar(8) NOT NULL DEFAULT 'new' CHECK (status IN ('new', 'done')),
        created timestamp DEFAULT CURRENT_TIMESTAMP
    );";

/// Source text with whitespace and trailing commas removed, so code wrapped differently by
/// the printer still compares equal.
pub fn squash(source: &str) -> String {
    let joined: String = source.split_whitespace().collect();
    joined
        .replace(",)", ")")
        .replace(",]", "]")
        .replace(",}", "}")
        .replace(",>", ">")
}
