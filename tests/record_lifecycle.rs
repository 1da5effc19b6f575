#![cfg(feature = "sqlite")]

mod common;

use common::{PEOPLE, scratch_db};
use sql_records::prelude::*;
use sql_records::schema::{Introspector, TableDefinition};

fn definition(db: &Executor) -> TableDefinition {
    Introspector::new(db).definition("t").expect("definition of t")
}

fn text(s: &str) -> RowValues {
    RowValues::Text(s.to_string())
}

#[test]
fn introspected_groupings() {
    let (_dir, db) = scratch_db(PEOPLE);
    let def = definition(&db);
    assert_eq!(def.primary_key.as_deref(), Some("id"));
    assert_eq!(def.lazy_load_fields, vec!["bio"]);
    assert_eq!(def.insertable_fields, vec!["id", "name", "bio", "status"]);
    assert_eq!(def.updatable_fields, vec!["name", "bio", "status"]);
    assert_eq!(def.enum_constants.get("STATUS_DONE").map(String::as_str), Some("done"));
}

#[test]
fn insert_load_and_lazy_field() -> Result<(), SqlRecordsError> {
    let (_dir, db) = scratch_db(PEOPLE);
    let def = definition(&db);

    let mut fresh = Record::new(&def, &db);
    assert_eq!(fresh.peek("status"), Some(&text("new")));
    fresh.set("name", "alice")?;
    fresh.set("bio", "a long story")?;
    assert_eq!(fresh.save()?, SaveOutcome::Inserted(1));
    assert_eq!(fresh.peek("id"), Some(&RowValues::Int(1)));
    assert!(!fresh.is_loaded());

    let mut loaded = Record::create(&def, &db, 1)?.expect("row 1");
    assert!(loaded.is_loaded());
    assert_eq!(loaded.peek("name"), Some(&text("alice")));
    assert_eq!(loaded.peek("bio"), None);
    assert!(matches!(loaded.peek("created"), Some(RowValues::Timestamp(_))));

    let before = db.statement_count();
    assert_eq!(loaded.get("bio")?, &text("a long story"));
    assert_eq!(db.statement_count(), before + 1);
    loaded.get("bio")?;
    loaded.get("name")?;
    assert_eq!(db.statement_count(), before + 1);
    Ok(())
}

#[test]
fn missing_row_is_not_an_error() -> Result<(), SqlRecordsError> {
    let (_dir, db) = scratch_db(PEOPLE);
    let def = definition(&db);
    assert!(Record::create(&def, &db, 42)?.is_none());

    let mut unbound = Record::new(&def, &db);
    assert!(matches!(
        unbound.get("bio"),
        Err(SqlRecordsError::MissingPrimaryKey { ref key, .. }) if key == "id"
    ));
    Ok(())
}

#[test]
fn saving_twice_leaves_the_row_unchanged() -> Result<(), SqlRecordsError> {
    let (_dir, db) = scratch_db(PEOPLE);
    let def = definition(&db);
    let mut fresh = Record::new(&def, &db);
    fresh.set("name", "alice")?;
    fresh.set("bio", "keep me")?;
    fresh.save()?;

    let mut loaded = Record::create(&def, &db, 1)?.expect("row 1");
    loaded.set("name", "bob")?;
    assert_eq!(loaded.save()?, SaveOutcome::Updated(1));
    assert_eq!(loaded.save()?, SaveOutcome::Updated(1));

    let rows = db.get_list("SELECT name, bio FROM t", Params::None)?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&text("bob")));
    // bio was never touched after load, so the update left it alone
    assert_eq!(rows[0].get("bio"), Some(&text("keep me")));
    Ok(())
}

#[test]
fn assigned_lazy_field_is_written_back() -> Result<(), SqlRecordsError> {
    let (_dir, db) = scratch_db(PEOPLE);
    db.insert_query(
        "INSERT INTO t (name, bio) VALUES (:name, :bio)",
        Params::named([("name", "carol"), ("bio", "old")]),
    )?;
    let def = definition(&db);

    let mut loaded = Record::create(&def, &db, 1)?.expect("row 1");
    loaded.set("bio", "new")?;
    assert!(loaded.is_lazy_changed("bio"));
    loaded.save()?;

    let bio = db.get_field("t", "bio", Where::eq("id", 1), Params::None)?;
    assert_eq!(bio, Some(text("new")));

    assert!(loaded.load()?);
    assert!(!loaded.is_lazy_changed("bio"));
    assert_eq!(loaded.peek("bio"), None);
    Ok(())
}

#[test]
fn rejected_values_never_reach_the_database() -> Result<(), SqlRecordsError> {
    let (_dir, db) = scratch_db(PEOPLE);
    let def = definition(&db);
    let mut record = Record::new(&def, &db);
    let before = db.statement_count();

    assert!(matches!(
        record.set("status", "bogus"),
        Err(SqlRecordsError::ValidationError(_))
    ));
    assert!(matches!(
        record.set("created", "yesterday-ish"),
        Err(SqlRecordsError::ValidationError(_))
    ));
    assert!(matches!(
        record.set("nope", 1),
        Err(SqlRecordsError::ValidationError(_))
    ));
    assert!(matches!(
        record.set("name", RowValues::Null),
        Err(SqlRecordsError::ValidationError(_))
    ));

    assert_eq!(db.statement_count(), before);
    assert_eq!(record.peek("status"), Some(&text("new")));
    record.set("status", "done")?;
    assert_eq!(record.peek("status"), Some(&text("done")));
    Ok(())
}

#[test]
fn auto_increment_key_is_write_once() -> Result<(), SqlRecordsError> {
    let (_dir, db) = scratch_db(PEOPLE);
    let def = definition(&db);

    let mut fresh = Record::new(&def, &db);
    fresh.set("id", 7)?;
    fresh.set("name", "dave")?;
    assert_eq!(fresh.insert()?, 7);

    let mut loaded = Record::create(&def, &db, 7)?.expect("row 7");
    loaded.set("id", 99)?;
    assert_eq!(loaded.peek("id"), Some(&RowValues::Int(7)));
    Ok(())
}

#[test]
fn timestamps_are_sent_as_text() -> Result<(), SqlRecordsError> {
    let (_dir, db) = scratch_db(
        "CREATE TABLE ev (id INTEGER PRIMARY KEY, at datetime NOT NULL, note varchar(20))",
    );
    let def = Introspector::new(&db).definition("ev")?;
    let mut event = Record::new(&def, &db);
    event.set("at", "2024-03-01 12:30:00")?;
    event.save()?;

    let stored = db.get_field("ev", "at", Where::eq("id", 1), Params::None)?;
    assert_eq!(stored, Some(text("2024-03-01 12:30:00")));

    let loaded = Record::create(&def, &db, 1)?.expect("row 1");
    let at = loaded.peek("at").and_then(RowValues::as_timestamp).expect("timestamp");
    assert_eq!(at.to_string(), "2024-03-01 12:30:00");
    Ok(())
}

#[test]
fn lazy_assignment_survives_repeated_saves() -> Result<(), SqlRecordsError> {
    let (_dir, db) = scratch_db(
        "CREATE TABLE t (id INTEGER PRIMARY KEY, name varchar(10), bio text)",
    );
    let def = definition(&db);

    let mut fresh = Record::new(&def, &db);
    fresh.set("name", "a")?;
    let id = fresh.insert()?;

    let mut loaded = Record::create(&def, &db, id)?.expect("inserted row");
    assert_eq!(loaded.get("bio")?, &RowValues::Null);
    loaded.set("bio", "x")?;
    loaded.save()?;
    assert!(loaded.is_lazy_changed("bio"));
    loaded.save()?;

    let bio = db.get_field("t", "bio", Where::eq("id", id), Params::None)?;
    assert_eq!(bio, Some(text("x")));
    Ok(())
}

#[test]
fn loaded_values_match_a_plain_select() -> Result<(), SqlRecordsError> {
    let (_dir, db) = scratch_db(PEOPLE);
    db.insert_query(
        "INSERT INTO t (name, status) VALUES (:name, :status)",
        Params::named([("name", "gina"), ("status", "done")]),
    )?;
    let def = definition(&db);
    let record = Record::create(&def, &db, 1)?.expect("row 1");

    let row = db
        .get_row("SELECT id, name, status FROM t WHERE id = 1", Params::None)?
        .expect("row 1");
    for (column, value) in row.iter() {
        assert_eq!(record.peek(column), Some(value), "column {column}");
    }
    Ok(())
}
