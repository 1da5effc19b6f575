use std::collections::HashSet;

use heck::{ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::classify::{FieldAccessor, FieldClassification, classify_column};
use super::column::ColumnDescriptor;
use crate::error::SqlRecordsError;
use crate::sanitize;

/// One generated field: the column it maps to, its Rust identifier and its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub column: String,
    pub ident: String,
    pub classification: FieldClassification,
}

impl FieldDef {
    #[must_use]
    pub fn new(
        column: impl Into<String>,
        ident: impl Into<String>,
        classification: FieldClassification,
    ) -> Self {
        Self {
            column: column.into(),
            ident: ident.into(),
            classification,
        }
    }
}

/// Read-only description of one table, produced once by the generator.
///
/// `lazy_load_fields`, `updatable_fields` and `insertable_fields` hold column names and are
/// subsets of `fields`, in field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub table_name: String,
    pub primary_key: Option<String>,
    pub fields: Vec<FieldDef>,
    pub lazy_load_fields: Vec<String>,
    pub updatable_fields: Vec<String>,
    pub insertable_fields: Vec<String>,
    /// Constant name → enum value.
    pub enum_constants: IndexMap<String, String>,
    pub column_descriptors: IndexMap<String, ColumnDescriptor>,
}

impl TableDefinition {
    /// Classify `columns` and build the definition of `table`.
    ///
    /// Only the first primary key column is used as key; any further ones become ordinary
    /// fields.
    ///
    /// # Errors
    /// Returns `SqlRecordsError::SchemaError` for duplicate column names, colliding field
    /// identifiers, or a column type outside the rule table.
    pub fn from_columns(
        table: &str,
        columns: &[ColumnDescriptor],
    ) -> Result<Self, SqlRecordsError> {
        let mut primary_key: Option<String> = None;
        let mut seen_columns = HashSet::new();
        let mut seen_idents = HashSet::new();
        let mut fields = Vec::with_capacity(columns.len());

        for column in columns {
            if !seen_columns.insert(column.name.as_str()) {
                return Err(SqlRecordsError::SchemaError(format!(
                    "duplicate column `{}` in `{table}`",
                    column.name
                )));
            }

            let mut is_key = false;
            if column.is_primary_key() {
                if let Some(key) = &primary_key {
                    warn!(
                        table,
                        key = key.as_str(),
                        column = column.name.as_str(),
                        "multi-column primary key; extra key column treated as an ordinary field"
                    );
                } else {
                    primary_key = Some(column.name.clone());
                    is_key = true;
                }
            }

            let ident = field_ident(&column.name);
            if !seen_idents.insert(ident.clone()) {
                return Err(SqlRecordsError::SchemaError(format!(
                    "columns of `{table}` collide on field name `{ident}`"
                )));
            }

            let classification = classify_column(table, column, is_key)?;
            fields.push(FieldDef::new(column.name.clone(), ident, classification));
        }

        Ok(Self::assemble(table, primary_key, fields, columns.to_vec()))
    }

    /// Build a definition from already classified fields, deriving the save groupings and
    /// enum constants.
    #[must_use]
    pub fn assemble(
        table_name: impl Into<String>,
        primary_key: Option<String>,
        fields: Vec<FieldDef>,
        columns: Vec<ColumnDescriptor>,
    ) -> Self {
        let pick = |keep: fn(&FieldClassification) -> bool| -> Vec<String> {
            fields
                .iter()
                .filter(|f| keep(&f.classification))
                .map(|f| f.column.clone())
                .collect()
        };
        let lazy_load_fields = pick(|c| c.lazy);
        let updatable_fields = pick(|c| c.updatable);
        let insertable_fields = pick(|c| c.insertable);

        let mut enum_constants = IndexMap::new();
        for field in &fields {
            if let FieldAccessor::Enum { values, .. } = &field.classification.accessor {
                for value in values {
                    let name = enum_constant_name(&field.ident, value);
                    if enum_constants.contains_key(&name) {
                        warn!(constant = name.as_str(), "duplicate enum constant skipped");
                        continue;
                    }
                    enum_constants.insert(name, value.clone());
                }
            }
        }

        Self {
            table_name: table_name.into(),
            primary_key,
            fields,
            lazy_load_fields,
            updatable_fields,
            insertable_fields,
            enum_constants,
            column_descriptors: columns.into_iter().map(|c| (c.name.clone(), c)).collect(),
        }
    }

    #[must_use]
    pub fn field(&self, column: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.column == column)
    }

    #[must_use]
    pub fn is_lazy(&self, column: &str) -> bool {
        self.lazy_load_fields.iter().any(|f| f == column)
    }

    /// Columns fetched by the initial row load.
    pub fn non_lazy_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| !f.classification.lazy)
            .map(|f| f.column.as_str())
    }

    /// Record type name: `user_profile` → `UserProfile`.
    #[must_use]
    pub fn class_name(&self) -> String {
        class_name_for(&self.table_name)
    }

    /// File the generator writes this table to: `UserProfile` → `user_profile.rs`.
    #[must_use]
    pub fn module_file_name(&self) -> String {
        format!("{}.rs", self.class_name().to_snake_case())
    }

    /// Name of the static holding the definition in generated code.
    #[must_use]
    pub fn static_name(&self) -> String {
        self.class_name().to_shouty_snake_case()
    }
}

pub(crate) fn class_name_for(table: &str) -> String {
    let name = sanitize::underscore_separated(table).to_upper_camel_case();
    match name.chars().next() {
        None => "Table".to_string(),
        Some(c) if c.is_ascii_digit() => format!("Table{name}"),
        Some(_) if name == "Self" => "SelfTable".to_string(),
        Some(_) => name,
    }
}

/// Snake case identifier for a column name.
pub(crate) fn field_ident(column: &str) -> String {
    let ident = sanitize::underscore_separated(column).to_snake_case();
    match ident.chars().next() {
        None => "field".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{ident}"),
        Some(_) => ident,
    }
}

/// `status` + `in progress` → `STATUS_IN_PROGRESS`.
pub(crate) fn enum_constant_name(field: &str, value: &str) -> String {
    let field = field.trim_start_matches('_').to_ascii_uppercase();
    let value = sanitize::underscore_separated(value).to_ascii_uppercase();
    let name = if value.is_empty() {
        field
    } else {
        format!("{field}_{value}")
    };
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else {
        name
    }
}
