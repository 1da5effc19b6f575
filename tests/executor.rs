#![cfg(feature = "sqlite")]

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::scratch_db;
use indexmap::IndexMap;
use sql_records::prelude::*;

const ITEMS: &str = "
    CREATE TABLE items (id INTEGER PRIMARY KEY, kind TEXT NOT NULL, price REAL);
    INSERT INTO items (kind, price) VALUES ('fruit', 1.5), ('fruit', 2.0), ('tool', 9.25);";

#[derive(Debug, PartialEq)]
struct Item {
    id: i64,
    kind: String,
}

impl FromRow for Item {
    fn from_row(row: &CustomDbRow) -> Result<Self, SqlRecordsError> {
        let missing = |c: &str| SqlRecordsError::ValidationError(format!("missing {c}"));
        Ok(Item {
            id: *row.get("id").and_then(RowValues::as_int).ok_or_else(|| missing("id"))?,
            kind: row
                .get("kind")
                .and_then(RowValues::as_text)
                .ok_or_else(|| missing("kind"))?
                .to_string(),
        })
    }
}

#[test]
fn cached_rows_are_served_without_queries() -> Result<(), SqlRecordsError> {
    let (_dir, db) = scratch_db(ITEMS);
    let sql = "SELECT id, kind FROM items ORDER BY id";
    assert!(db.get_list_from_cache(sql, Params::None).is_empty());

    let before = db.statement_count();
    let fruit = db.get_cached_rows("fruit", sql, Params::None, "kind")?;
    assert_eq!(fruit.len(), 2);
    let tool = db.get_cached_row("tool", sql, Params::None, "kind")?.expect("tool row");
    assert_eq!(tool.get("id"), Some(&RowValues::Int(3)));
    assert!(db.get_cached_row("gadget", sql, Params::None, "kind")?.is_none());
    assert_eq!(db.statement_count(), before + 1);
    assert_eq!(db.get_list_from_cache(sql, Params::None).len(), 3);

    db.clear_cache();
    assert!(db.get_list_from_cache(sql, Params::None).is_empty());
    Ok(())
}

#[test]
fn get_record_by_key_with_and_without_cache() -> Result<(), SqlRecordsError> {
    let (_dir, db) = scratch_db(ITEMS);
    let row = db.get_record("items", "id", 2, &["id", "price"], false)?.expect("row 2");
    assert_eq!(row.get("price"), Some(&RowValues::Float(2.0)));
    assert_eq!(row.get("kind"), None);

    let before = db.statement_count();
    for id in 1..=3 {
        assert!(db.get_record("items", "id", id, &[], true)?.is_some());
    }
    assert_eq!(db.statement_count(), before + 1);
    Ok(())
}

#[test]
fn rows_map_into_caller_types() -> Result<(), SqlRecordsError> {
    let (_dir, db) = scratch_db(ITEMS);
    let select = SelectQuery::new("items")
        .fields(["id", "kind"])
        .filter(Where::eq("kind", ":kind"))
        .order_by("id");
    let items: Vec<Item> = db
        .map_into::<Item>()
        .get_records(&select, Params::named([("kind", "fruit")]))?;
    assert_eq!(items, vec![
        Item { id: 1, kind: "fruit".into() },
        Item { id: 2, kind: "fruit".into() },
    ]);

    let none = db
        .map_into::<Item>()
        .get_row("SELECT id, kind FROM items WHERE id = :id", Params::named([("id", 99)]))?;
    assert_eq!(none, None);

    // the override is consumed; the next query returns generic rows
    let generic = db.get_list("SELECT id FROM items", Params::None)?;
    assert_eq!(generic.len(), 3);
    Ok(())
}

#[test]
fn crud_helpers() -> Result<(), SqlRecordsError> {
    let (_dir, db) = scratch_db(ITEMS);
    let mut values = IndexMap::new();
    values.insert("kind".to_string(), RowValues::from("book"));
    values.insert("price".to_string(), RowValues::from(12.0));
    values.insert("bogus".to_string(), RowValues::from(1));
    let id = db.insert("items", &values, &["kind", "price"])?;
    assert_eq!(id, 4);

    let mut change = IndexMap::new();
    change.insert("price".to_string(), RowValues::Float(10.0));
    assert_eq!(db.update("items", &change, "id = :id", Params::named([("id", id)]))?, 1);
    assert_eq!(
        db.get_field("items", "price", Where::eq("id", id), Params::None)?,
        Some(RowValues::Float(10.0))
    );

    assert_eq!(db.delete("items", Where::eq("kind", "fruit"), Params::None)?, 2);
    let remaining = db.get_value("SELECT COUNT(*) AS value FROM items", Params::None)?;
    assert_eq!(remaining, Some(RowValues::Int(2)));
    Ok(())
}

#[test]
fn positional_parameters_pass_through() -> Result<(), SqlRecordsError> {
    let (_dir, db) = scratch_db(ITEMS);
    let row = db
        .get_row(
            "SELECT kind FROM items WHERE price > ? AND price < ?",
            Params::positional(vec![RowValues::Float(5.0), RowValues::Float(10.0)]),
        )?
        .expect("tool");
    assert_eq!(row.get("kind"), Some(&RowValues::Text("tool".into())));
    Ok(())
}

#[test]
fn handled_failures_are_not_cached() -> Result<(), SqlRecordsError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let creds = Credentials::sqlite(dir.path().join("h.db").to_string_lossy());
    let seen = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&seen);
    let db = Executor::new(creds.clone(), Some(creds))
        .with_error_handler(move |_| *sink.borrow_mut() += 1);

    let sql = "SELECT id FROM late";
    assert!(db.get_cached_rows("1", sql, Params::None, "id")?.is_empty());
    assert_eq!(*seen.borrow(), 1);

    db.exec("CREATE TABLE late (id INTEGER PRIMARY KEY); INSERT INTO late (id) VALUES (1);")?;
    assert_eq!(db.get_cached_rows("1", sql, Params::None, "id")?.len(), 1);
    assert_eq!(*seen.borrow(), 1);
    Ok(())
}

#[test]
fn executor_from_config_file() -> Result<(), SqlRecordsError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("cfg.db");
    let config_path = dir.path().join("db.json");
    let config = serde_json::json!({
        "read": { "driver": "sqlite", "dsn": db_path.to_string_lossy() },
        "write": { "driver": "sqlite", "dsn": db_path.to_string_lossy(),
                   "options": { "busy_timeout_ms": "1000" } }
    });
    std::fs::write(&config_path, config.to_string())?;

    let db = Executor::from_config(ExecutorConfig::from_json_file(&config_path)?);
    assert!(db.has_write_connection());
    db.exec("CREATE TABLE c (id INTEGER PRIMARY KEY)")?;
    assert_eq!(db.list_tables()?, vec!["c".to_string()]);

    std::fs::write(&config_path, "{ not json")?;
    assert!(matches!(
        ExecutorConfig::from_json_file(&config_path),
        Err(SqlRecordsError::ConfigError(_))
    ));
    Ok(())
}
