//! Maps the `SQLite` catalogue onto column descriptors.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::DriverError;
use crate::schema::{ColumnDescriptor, KeyRole, parse_enum_values};

static CHECK_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)CHECK\s*\(\s*["`\[]?(\w+)["`\]]?\s+IN\s*\(([^)]*)\)\s*\)"#)
        .expect("check constraint pattern is valid")
});

fn exec_err(e: rusqlite::Error) -> DriverError {
    DriverError::Execute(e.to_string())
}

pub(crate) fn list_tables(conn: &rusqlite::Connection) -> Result<Vec<String>, DriverError> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .map_err(|e| DriverError::Prepare(e.to_string()))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(exec_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(exec_err)?;
    Ok(names)
}

struct TableInfoRow {
    name: String,
    declared_type: String,
    not_null: bool,
    default: Option<String>,
    pk: i64,
}

pub(crate) fn describe_table(
    conn: &rusqlite::Connection,
    table: &str,
) -> Result<Vec<ColumnDescriptor>, DriverError> {
    let mut stmt = conn
        .prepare(
            "SELECT name, type, \"notnull\", dflt_value, pk \
             FROM pragma_table_info(?1) ORDER BY cid",
        )
        .map_err(|e| DriverError::Prepare(e.to_string()))?;
    let info = stmt
        .query_map([table], |row| {
            Ok(TableInfoRow {
                name: row.get(0)?,
                declared_type: row.get(1)?,
                not_null: row.get::<_, i64>(2)? != 0,
                default: row.get(3)?,
                pk: row.get(4)?,
            })
        })
        .map_err(exec_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(exec_err)?;

    let pk_count = info.iter().filter(|c| c.pk > 0).count();
    let index_roles = index_roles(conn, table)?;
    let enum_checks = enum_checks(conn, table)?;

    Ok(info
        .into_iter()
        .map(|col| {
            let sql_type = enum_checks
                .get(&col.name.to_ascii_lowercase())
                .cloned()
                .unwrap_or(col.declared_type);
            let key_role = if col.pk > 0 {
                KeyRole::Primary
            } else {
                index_roles.get(&col.name).copied().unwrap_or_default()
            };
            let rowid_alias = pk_count == 1 && col.pk > 0 && sql_type.eq_ignore_ascii_case("integer");
            ColumnDescriptor::new(col.name, sql_type)
                .nullable(!col.not_null && col.pk == 0)
                .default_value(col.default.as_deref().and_then(unquote_default).as_deref())
                .key_role(key_role)
                .extra(if rowid_alias { "auto_increment" } else { "" })
        })
        .collect())
}

/// `unique` for single-column unique indexes, `multiple` for the leading column of any other
/// index. Primary key indexes are skipped.
fn index_roles(
    conn: &rusqlite::Connection,
    table: &str,
) -> Result<HashMap<String, KeyRole>, DriverError> {
    let mut stmt = conn
        .prepare(
            "SELECT il.name, il.\"unique\", ii.name \
             FROM pragma_index_list(?1) AS il, pragma_index_info(il.name) AS ii \
             WHERE il.origin != 'pk' ORDER BY il.seq, ii.seqno",
        )
        .map_err(|e| DriverError::Prepare(e.to_string()))?;
    let rows = stmt
        .query_map([table], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)? != 0,
                row.get::<_, Option<String>>(2)?,
            ))
        })
        .map_err(exec_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(exec_err)?;

    let mut indexes: Vec<(String, bool, Vec<String>)> = Vec::new();
    for (index, unique, column) in rows {
        // expression indexes have no column name
        let Some(column) = column else { continue };
        match indexes.iter_mut().find(|(name, _, _)| *name == index) {
            Some((_, _, columns)) => columns.push(column),
            None => indexes.push((index, unique, vec![column])),
        }
    }

    let mut roles = HashMap::new();
    for (_, unique, columns) in indexes {
        if unique && columns.len() == 1 {
            roles.insert(columns[0].clone(), KeyRole::Unique);
        } else if let Some(first) = columns.into_iter().next() {
            roles.entry(first).or_insert(KeyRole::Multiple);
        }
    }
    Ok(roles)
}

/// `CHECK (col IN ('a','b'))` constraints rendered as `enum('a','b')`, keyed by lowercase
/// column name.
fn enum_checks(
    conn: &rusqlite::Connection,
    table: &str,
) -> Result<HashMap<String, String>, DriverError> {
    let mut stmt = conn
        .prepare("SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1")
        .map_err(|e| DriverError::Prepare(e.to_string()))?;
    let mut rows = stmt.query([table]).map_err(exec_err)?;
    let Some(row) = rows.next().map_err(exec_err)? else {
        return Ok(HashMap::new());
    };
    let ddl: Option<String> = row.get(0).map_err(exec_err)?;
    Ok(ddl.as_deref().map(enum_checks_in_ddl).unwrap_or_default())
}

fn enum_checks_in_ddl(ddl: &str) -> HashMap<String, String> {
    CHECK_IN
        .captures_iter(ddl)
        .filter_map(|c| {
            let values = parse_enum_values(&format!("enum({})", &c[2]))?;
            if values.is_empty() {
                return None;
            }
            let quoted: Vec<String> = values
                .iter()
                .map(|v| format!("'{}'", v.replace('\'', "''")))
                .collect();
            Some((
                c[1].to_ascii_lowercase(),
                format!("enum({})", quoted.join(",")),
            ))
        })
        .collect()
}

/// Strip one level of single quotes; `NULL` means no default.
fn unquote_default(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("null") {
        return None;
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return Some(raw[1..raw.len() - 1].replace("''", "'"));
    }
    Some(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn_with(ddl: &str) -> rusqlite::Connection {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(ddl).unwrap();
        conn
    }

    #[test]
    fn describes_columns_in_declaration_order() {
        let conn = conn_with(
            "CREATE TABLE t (
                id INTEGER PRIMARY KEY,
                email VARCHAR(100) NOT NULL UNIQUE,
                status TEXT NOT NULL DEFAULT 'new' CHECK (status IN ('new', 'done')),
                note TEXT DEFAULT NULL,
                created DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX t_created ON t (created);",
        );
        let cols = describe_table(&conn, "t").unwrap();
        let names: Vec<_> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "email", "status", "note", "created"]);

        assert_eq!(cols[0].key_role, KeyRole::Primary);
        assert!(cols[0].is_auto_increment());
        assert!(!cols[0].nullable);

        assert_eq!(cols[1].key_role, KeyRole::Unique);
        assert_eq!(cols[1].sql_type, "VARCHAR(100)");

        assert_eq!(cols[2].sql_type, "enum('new','done')");
        assert_eq!(cols[2].enum_values, vec!["new", "done"]);
        assert_eq!(cols[2].default.as_deref(), Some("new"));

        assert!(cols[3].nullable);
        assert_eq!(cols[3].default, None);

        assert_eq!(cols[4].key_role, KeyRole::Multiple);
        assert_eq!(cols[4].default.as_deref(), Some("CURRENT_TIMESTAMP"));
    }

    #[test]
    fn composite_keys_are_not_rowid_aliases() {
        let conn = conn_with("CREATE TABLE p (a INTEGER, b INTEGER, PRIMARY KEY (a, b));");
        let cols = describe_table(&conn, "p").unwrap();
        assert!(cols.iter().all(|c| c.key_role == KeyRole::Primary));
        assert!(cols.iter().all(|c| !c.is_auto_increment()));
    }

    #[test]
    fn lists_user_tables_only() {
        let conn = conn_with(
            "CREATE TABLE b (x INTEGER PRIMARY KEY AUTOINCREMENT); CREATE TABLE a (y INT);",
        );
        assert_eq!(list_tables(&conn).unwrap(), vec!["a", "b"]);
    }
}
