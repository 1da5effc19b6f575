//! Runtime side of generated record types.
//!
//! A [`Record`] holds the values of one row of a table described by a [`TableDefinition`].
//! Lazy fields stay absent until read or assigned; only assigned ones are written back.

mod accessor;

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::error::SqlRecordsError;
use crate::executor::Executor;
use crate::params::Params;
use crate::query_builder::{SelectQuery, quote_ident};
use crate::schema::{FieldAccessor, FieldDef, TableDefinition};
use crate::types::RowValues;

static NULL: RowValues = RowValues::Null;

/// What [`Record::save`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Generated key reported by the driver.
    Inserted(i64),
    /// Rows affected.
    Updated(usize),
}

pub struct Record<'db> {
    definition: &'db TableDefinition,
    db: &'db Executor,
    values: IndexMap<String, RowValues>,
    lazy_changed: IndexSet<String>,
    loaded_from_db: bool,
}

impl<'db> Record<'db> {
    /// Unbound record; non-lazy fields start at their client-side defaults.
    #[must_use]
    pub fn new(definition: &'db TableDefinition, db: &'db Executor) -> Self {
        let values = definition
            .fields
            .iter()
            .filter(|f| !f.classification.lazy)
            .filter_map(|f| {
                let class = &f.classification;
                class
                    .default
                    .to_value(class.semantic_type)
                    .map(|v| (f.column.clone(), v))
            })
            .collect();
        Self {
            definition,
            db,
            values,
            lazy_changed: IndexSet::new(),
            loaded_from_db: false,
        }
    }

    /// Load the row whose primary key is `id`; `Ok(None)` when there is none.
    ///
    /// # Errors
    /// `SchemaError` for a table without primary key, otherwise as [`Record::load`].
    pub fn create(
        definition: &'db TableDefinition,
        db: &'db Executor,
        id: impl Into<RowValues>,
    ) -> Result<Option<Self>, SqlRecordsError> {
        let mut record = Self::new(definition, db);
        let key = record.key_column()?.to_string();
        record.values.insert(key, id.into());
        Ok(record.load()?.then_some(record))
    }

    /// Re-read all non-lazy fields by primary key. Lazy values and the lazy-changed set are
    /// discarded. Returns `false` when no row matches.
    ///
    /// # Errors
    /// `MissingPrimaryKey` when the key is unset, or the executor's statement failures.
    pub fn load(&mut self) -> Result<bool, SqlRecordsError> {
        let (key, id) = self.key_value()?;
        let sql = SelectQuery::new(quote_ident(&self.definition.table_name))
            .fields(self.definition.non_lazy_fields().map(quote_ident))
            .filter(format!("{} = :pk", quote_ident(key)))
            .limit(1)
            .to_sql();
        let Some(row) = self.db.get_row(&sql, Params::named([("pk", id)]))? else {
            return Ok(false);
        };

        for field in self.definition.fields.iter().filter(|f| !f.classification.lazy) {
            let value = row.get(&field.column).cloned().unwrap_or(RowValues::Null);
            self.values.insert(
                field.column.clone(),
                accessor::from_db(field.classification.semantic_type, value),
            );
        }
        for lazy in &self.definition.lazy_load_fields {
            self.values.shift_remove(lazy);
        }
        self.lazy_changed.clear();
        self.loaded_from_db = true;
        Ok(true)
    }

    /// Fetch one field by primary key and store it; a missing row stores NULL.
    ///
    /// # Errors
    /// `ValidationError` for an unknown field, `MissingPrimaryKey` when the key is unset,
    /// or the executor's statement failures.
    pub fn load_field(&mut self, column: &str) -> Result<&RowValues, SqlRecordsError> {
        let field = self.field(column)?;
        let semantic = field.classification.semantic_type;
        let (key, id) = self.key_value()?;
        let sql = SelectQuery::new(quote_ident(&self.definition.table_name))
            .field(format!("{} AS value", quote_ident(column)))
            .filter(format!("{} = :pk", quote_ident(key)))
            .limit(1)
            .to_sql();
        debug!(table = self.definition.table_name.as_str(), column, "loading lazy field");
        let value = self
            .db
            .get_value(&sql, Params::named([("pk", id)]))?
            .unwrap_or(RowValues::Null);
        self.values
            .insert(column.to_string(), accessor::from_db(semantic, value));
        Ok(self.values.get(column).unwrap_or(&NULL))
    }

    /// Current value of `column`, loading a lazy field on first access.
    ///
    /// Unset fields read as NULL.
    ///
    /// # Errors
    /// As [`Record::load_field`].
    pub fn get(&mut self, column: &str) -> Result<&RowValues, SqlRecordsError> {
        let lazy = self.field(column)?.classification.lazy;
        if lazy && !self.values.contains_key(column) {
            self.load_field(column)?;
        }
        Ok(self.values.get(column).unwrap_or(&NULL))
    }

    /// Stored value without loading anything.
    #[must_use]
    pub fn peek(&self, column: &str) -> Option<&RowValues> {
        self.values.get(column)
    }

    /// Assign `value` through the field's accessor entry.
    ///
    /// # Errors
    /// `ValidationError` for an unknown field or a value the accessor rejects. Nothing is
    /// stored in that case.
    pub fn set(&mut self, column: &str, value: impl Into<RowValues>) -> Result<(), SqlRecordsError> {
        let field = self.field(column)?;
        let lazy = field.classification.lazy;
        let Some(value) = accessor::apply(
            &self.definition.table_name,
            field,
            value.into(),
            self.loaded_from_db,
        )?
        else {
            return Ok(());
        };
        self.values.insert(column.to_string(), value);
        if lazy {
            self.lazy_changed.insert(column.to_string());
        }
        Ok(())
    }

    /// UPDATE when loaded from the database, INSERT otherwise.
    ///
    /// # Errors
    /// As [`Record::insert`] and [`Record::update`].
    pub fn save(&mut self) -> Result<SaveOutcome, SqlRecordsError> {
        if self.loaded_from_db {
            self.update().map(SaveOutcome::Updated)
        } else {
            self.insert().map(SaveOutcome::Inserted)
        }
    }

    /// INSERT the insertable fields. An unset auto-increment key receives the generated id.
    ///
    /// # Errors
    /// The executor's configuration and statement failures.
    pub fn insert(&mut self) -> Result<i64, SqlRecordsError> {
        let payload = self.payload(&self.definition.insertable_fields);
        let id = self.db.insert(&self.definition.table_name, &payload, &[])?;
        if id != 0 {
            if let Some(key) = self.auto_increment_key() {
                if self.values.get(key).is_none_or(RowValues::is_null) {
                    self.values.insert(key.to_string(), RowValues::Int(id));
                }
            }
        }
        Ok(id)
    }

    /// UPDATE the updatable fields by primary key.
    ///
    /// # Errors
    /// `MissingPrimaryKey` when the key is unset, or the executor's failures.
    pub fn update(&mut self) -> Result<usize, SqlRecordsError> {
        let (key, id) = self.key_value()?;
        let payload = self.payload(&self.definition.updatable_fields);
        self.db.update(
            &self.definition.table_name,
            &payload,
            format!("{} = :pk", quote_ident(key)),
            Params::named([("pk", id)]),
        )
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded_from_db
    }

    #[must_use]
    pub fn is_lazy_changed(&self, column: &str) -> bool {
        self.lazy_changed.contains(column)
    }

    #[must_use]
    pub fn definition(&self) -> &'db TableDefinition {
        self.definition
    }

    #[must_use]
    pub fn executor(&self) -> &'db Executor {
        self.db
    }

    /// Present values in assignment order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn field(&self, column: &str) -> Result<&'db FieldDef, SqlRecordsError> {
        self.definition.field(column).ok_or_else(|| {
            SqlRecordsError::ValidationError(format!(
                "`{}` has no field `{column}`",
                self.definition.table_name
            ))
        })
    }

    fn key_column(&self) -> Result<&'db str, SqlRecordsError> {
        self.definition.primary_key.as_deref().ok_or_else(|| {
            SqlRecordsError::SchemaError(format!(
                "`{}` has no primary key",
                self.definition.table_name
            ))
        })
    }

    fn key_value(&self) -> Result<(&'db str, RowValues), SqlRecordsError> {
        let key = self.key_column()?;
        match self.values.get(key) {
            Some(id) if !id.is_null() => Ok((key, id.clone().into_wire())),
            _ => Err(SqlRecordsError::MissingPrimaryKey {
                table: self.definition.table_name.clone(),
                key: key.to_string(),
            }),
        }
    }

    fn auto_increment_key(&self) -> Option<&'db str> {
        let key = self.definition.primary_key.as_deref()?;
        let field = self.definition.field(key)?;
        (field.classification.accessor == FieldAccessor::AutoIncrement).then_some(key)
    }

    /// Values to send for `columns`: untouched lazy fields, absent values and a NULL
    /// auto-increment key are left out.
    fn payload(&self, columns: &[String]) -> IndexMap<String, RowValues> {
        let auto_key = self.auto_increment_key();
        columns
            .iter()
            .filter(|c| !self.definition.is_lazy(c) || self.lazy_changed.contains(c.as_str()))
            .filter_map(|c| {
                let value = self.values.get(c)?;
                if value.is_null() && auto_key == Some(c.as_str()) {
                    return None;
                }
                Some((c.clone(), value.clone().into_wire()))
            })
            .collect()
    }
}

impl fmt::Debug for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("table", &self.definition.table_name)
            .field("values", &self.values)
            .field("lazy_changed", &self.lazy_changed)
            .field("loaded_from_db", &self.loaded_from_db)
            .finish_non_exhaustive()
    }
}

/// Implemented by generated record types; the provided methods forward to [`Record`].
pub trait TableRecord<'db>: Sized {
    fn definition() -> &'static TableDefinition;

    fn from_record(record: Record<'db>) -> Self;

    fn record(&self) -> &Record<'db>;

    fn record_mut(&mut self) -> &mut Record<'db>;

    fn new(db: &'db Executor) -> Self {
        Self::from_record(Record::new(Self::definition(), db))
    }

    /// # Errors
    /// As [`Record::create`].
    fn create(db: &'db Executor, id: impl Into<RowValues>) -> Result<Option<Self>, SqlRecordsError> {
        Ok(Record::create(Self::definition(), db, id)?.map(Self::from_record))
    }

    /// # Errors
    /// As [`Record::load`].
    fn load(&mut self) -> Result<bool, SqlRecordsError> {
        self.record_mut().load()
    }

    /// # Errors
    /// As [`Record::save`].
    fn save(&mut self) -> Result<SaveOutcome, SqlRecordsError> {
        self.record_mut().save()
    }

    /// # Errors
    /// As [`Record::insert`].
    fn insert(&mut self) -> Result<i64, SqlRecordsError> {
        self.record_mut().insert()
    }

    /// # Errors
    /// As [`Record::update`].
    fn update(&mut self) -> Result<usize, SqlRecordsError> {
        self.record_mut().update()
    }
}
