//! Type-mapping rules: SQL column metadata to field classification.

use serde::{Deserialize, Serialize};

use super::column::ColumnDescriptor;
use crate::error::SqlRecordsError;
use crate::sanitize;
use crate::types::{RowValues, parse_timestamp};

/// Variable-length strings longer than this are loaded lazily.
pub const LAZY_LENGTH_THRESHOLD: u64 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    String,
    Int,
    Float,
    Bool,
    Timestamp,
    Date,
    Enum,
}

/// Default value a generated field starts with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldDefault {
    /// No client-side default; the field stays unset until assigned or loaded.
    None,
    Null,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Computed by the database (e.g. `CURRENT_TIMESTAMP`); never sent by the client.
    DbGenerated(String),
}

impl FieldDefault {
    /// Initial value for a freshly constructed record.
    #[must_use]
    pub fn to_value(&self, semantic_type: SemanticType) -> Option<RowValues> {
        match self {
            FieldDefault::None | FieldDefault::DbGenerated(_) => None,
            FieldDefault::Null => Some(RowValues::Null),
            FieldDefault::Str(s) if semantic_type == SemanticType::Timestamp => {
                parse_timestamp(s).map(RowValues::Timestamp)
            }
            FieldDefault::Str(s) => Some(RowValues::Text(s.clone())),
            FieldDefault::Int(i) => Some(RowValues::Int(*i)),
            FieldDefault::Float(f) => Some(RowValues::Float(*f)),
            FieldDefault::Bool(b) => Some(RowValues::Bool(*b)),
        }
    }
}

/// Accessor-table entry: how writes to a field are checked before they are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldAccessor {
    Plain,
    /// Only the listed values are accepted. `multiple` marks SET columns, whose value is a
    /// comma separated combination.
    Enum { values: Vec<String>, multiple: bool },
    /// Input is parsed into a date/time value.
    Timestamp,
    /// Write-once key: accepted until the record is loaded, ignored afterwards.
    AutoIncrement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldClassification {
    pub semantic_type: SemanticType,
    pub nullable: bool,
    pub lazy: bool,
    pub insertable: bool,
    pub updatable: bool,
    pub default: FieldDefault,
    pub accessor: FieldAccessor,
}

impl FieldClassification {
    #[must_use]
    pub fn needs_custom_accessor(&self) -> bool {
        self.accessor != FieldAccessor::Plain
    }
}

/// Declared SQL type split into its parts: `int(10) unsigned` → `int`, `10`, unsigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SqlType {
    pub base: String,
    pub length: Option<u64>,
    pub unsigned: bool,
}

impl SqlType {
    pub(crate) fn parse(declared: &str) -> Self {
        let lowered = declared.trim().to_ascii_lowercase();
        let base_end = lowered
            .find(|c: char| c == '(' || c.is_whitespace())
            .unwrap_or(lowered.len());
        let base = lowered[..base_end].to_string();
        let length = lowered.find('(').and_then(|open| {
            let close = lowered[open..].find(')').map_or(lowered.len(), |c| open + c);
            // decimal(10,2): the precision is the length
            let args = &lowered[open + 1..close];
            sanitize::numbers_only(args.split(',').next().unwrap_or_default())
        });
        let unsigned = lowered.split_whitespace().any(|w| w == "unsigned")
            || lowered.ends_with("unsigned");
        Self {
            base,
            length,
            unsigned,
        }
    }
}

/// Classify one column of `table`.
///
/// # Errors
/// Returns `SqlRecordsError::SchemaError` when the declared type is not in the rule table.
pub fn classify(
    table: &str,
    column: &ColumnDescriptor,
) -> Result<FieldClassification, SqlRecordsError> {
    classify_column(table, column, column.is_primary_key())
}

pub(crate) fn classify_column(
    table: &str,
    column: &ColumnDescriptor,
    is_key: bool,
) -> Result<FieldClassification, SqlRecordsError> {
    let ty = SqlType::parse(&column.sql_type);
    let raw_default = column
        .default
        .as_deref()
        .filter(|d| !d.eq_ignore_ascii_case("null"));

    let mut class = FieldClassification {
        semantic_type: SemanticType::String,
        nullable: column.nullable,
        lazy: false,
        insertable: true,
        updatable: true,
        default: FieldDefault::None,
        accessor: FieldAccessor::Plain,
    };

    match ty.base.as_str() {
        "varchar" | "varbinary" => {
            class.lazy = ty.length.unwrap_or(0) > LAZY_LENGTH_THRESHOLD;
            class.default = literal_default(raw_default, column.nullable);
        }
        "char" | "binary" | "tinytext" | "tinyblob" => {
            class.default = literal_default(raw_default, column.nullable);
        }
        "text" | "blob" | "mediumtext" | "mediumblob" | "longtext" | "longblob" | "json" => {
            class.lazy = true;
        }
        "tinyint" if ty.length == Some(1) => bool_field(&mut class, raw_default, column),
        "bool" | "boolean" => bool_field(&mut class, raw_default, column),
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "bit" | "year" => {
            class.semantic_type = SemanticType::Int;
            class.default = numeric_default(raw_default, column.nullable, |d| {
                d.parse().ok().map(FieldDefault::Int)
            });
        }
        "decimal" | "numeric" | "float" | "double" | "real" => {
            class.semantic_type = SemanticType::Float;
            class.default = numeric_default(raw_default, column.nullable, |d| {
                d.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(FieldDefault::Float)
            });
        }
        "timestamp" | "datetime" => {
            class.semantic_type = SemanticType::Timestamp;
            class.accessor = FieldAccessor::Timestamp;
            class.default = match raw_default {
                Some(d) if mentions_current_timestamp(d) => {
                    class.insertable = false;
                    class.updatable = false;
                    FieldDefault::DbGenerated(d.to_string())
                }
                Some(d) => FieldDefault::Str(d.to_string()),
                None if column.nullable => FieldDefault::Null,
                None => FieldDefault::None,
            };
            if mentions_on_update_current_timestamp(&column.extra) {
                class.updatable = false;
            }
        }
        "date" | "time" => {
            class.semantic_type = SemanticType::Date;
            class.default = literal_default(raw_default, column.nullable);
        }
        "enum" | "set" => {
            class.semantic_type = SemanticType::Enum;
            class.accessor = FieldAccessor::Enum {
                values: column.enum_values.clone(),
                multiple: ty.base == "set",
            };
            class.default = literal_default(raw_default, column.nullable);
        }
        _ => {
            return Err(SqlRecordsError::SchemaError(format!(
                "Unknown field type {table}.{} `{}` (looking for {})",
                column.name, column.sql_type, ty.base
            )));
        }
    }

    if is_key {
        class.updatable = false;
        if column.is_auto_increment() {
            class.accessor = FieldAccessor::AutoIncrement;
        }
    }

    Ok(class)
}

fn bool_field(class: &mut FieldClassification, raw: Option<&str>, column: &ColumnDescriptor) {
    class.semantic_type = SemanticType::Bool;
    class.default = match raw {
        Some(d) => FieldDefault::Bool(unquote(d) == "1"),
        None if column.nullable => FieldDefault::Null,
        None => FieldDefault::None,
    };
}

fn literal_default(raw: Option<&str>, nullable: bool) -> FieldDefault {
    match raw {
        Some(d) => FieldDefault::Str(d.to_string()),
        None if nullable => FieldDefault::Null,
        None => FieldDefault::None,
    }
}

fn numeric_default(
    raw: Option<&str>,
    nullable: bool,
    parse: impl Fn(&str) -> Option<FieldDefault>,
) -> FieldDefault {
    match raw {
        Some(d) => parse(unquote(d)).unwrap_or_else(|| FieldDefault::DbGenerated(d.to_string())),
        None if nullable => FieldDefault::Null,
        None => FieldDefault::None,
    }
}

fn unquote(raw: &str) -> &str {
    raw.trim().trim_matches(|c| c == '\'' || c == '(' || c == ')')
}

fn mentions_current_timestamp(text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    lowered.contains("current_timestamp") || lowered.contains("now()")
}

fn mentions_on_update_current_timestamp(extra: &str) -> bool {
    let lowered = extra.to_ascii_lowercase();
    lowered.contains("on update") && mentions_current_timestamp(&lowered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::column::KeyRole;

    fn class_of(column: &ColumnDescriptor) -> FieldClassification {
        classify("t", column).unwrap()
    }

    #[test]
    fn sql_type_parts() {
        assert_eq!(
            SqlType::parse("int(10) unsigned"),
            SqlType {
                base: "int".into(),
                length: Some(10),
                unsigned: true
            }
        );
        assert_eq!(SqlType::parse("tinyint unsigned").base, "tinyint");
        assert_eq!(SqlType::parse("DECIMAL(10,2)").length, Some(10));
        assert_eq!(SqlType::parse("TEXT").length, None);
    }

    #[test]
    fn varchar_laziness_follows_length() {
        for (len, lazy) in [(10, false), (255, false), (256, true), (1024, true)] {
            let c = class_of(&ColumnDescriptor::new("v", format!("varchar({len})")));
            assert_eq!(c.lazy, lazy, "varchar({len})");
            assert_eq!(c.semantic_type, SemanticType::String);
            let c = class_of(&ColumnDescriptor::new("v", format!("varbinary({len})")));
            assert_eq!(c.lazy, lazy, "varbinary({len})");
        }
    }

    #[test]
    fn large_types_are_lazy_without_default() {
        for ty in ["text", "blob", "mediumtext", "mediumblob", "longtext", "longblob"] {
            let c = class_of(&ColumnDescriptor::new("body", ty).default_value(Some("x")));
            assert!(c.lazy, "{ty}");
            assert_eq!(c.default, FieldDefault::None, "{ty}");
        }
    }

    #[test]
    fn tinyint_one_is_bool() {
        let on = class_of(&ColumnDescriptor::new("f", "tinyint(1)").default_value(Some("1")));
        assert_eq!(on.semantic_type, SemanticType::Bool);
        assert_eq!(on.default, FieldDefault::Bool(true));
        for other in ["0", "2", "yes", ""] {
            let c = class_of(&ColumnDescriptor::new("f", "tinyint(1)").default_value(Some(other)));
            assert_eq!(c.default, FieldDefault::Bool(false), "default {other:?}");
        }
        let wide = class_of(&ColumnDescriptor::new("n", "tinyint(4)"));
        assert_eq!(wide.semantic_type, SemanticType::Int);
    }

    #[test]
    fn numeric_defaults_are_unquoted() {
        let c = class_of(&ColumnDescriptor::new("n", "bigint unsigned").default_value(Some("'42'")));
        assert_eq!(c.semantic_type, SemanticType::Int);
        assert_eq!(c.default, FieldDefault::Int(42));
        let f = class_of(&ColumnDescriptor::new("p", "decimal(10,2)").default_value(Some("1.50")));
        assert_eq!(f.semantic_type, SemanticType::Float);
        assert_eq!(f.default, FieldDefault::Float(1.5));
        let n = class_of(&ColumnDescriptor::new("p", "float").nullable(true));
        assert_eq!(n.default, FieldDefault::Null);
    }

    #[test]
    fn current_timestamp_columns_are_database_owned() {
        let inserted = class_of(
            &ColumnDescriptor::new("inserted_at", "timestamp")
                .default_value(Some("current_timestamp()")),
        );
        assert!(!inserted.insertable);
        assert!(!inserted.updatable);
        assert_eq!(inserted.accessor, FieldAccessor::Timestamp);

        let updated = class_of(
            &ColumnDescriptor::new("updated_at", "datetime")
                .nullable(true)
                .extra("on update CURRENT_TIMESTAMP"),
        );
        assert!(updated.insertable);
        assert!(!updated.updatable);
        assert_eq!(updated.default, FieldDefault::Null);

        let plain = class_of(&ColumnDescriptor::new("seen_at", "datetime"));
        assert!(plain.insertable && plain.updatable);
        assert!(plain.needs_custom_accessor());
    }

    #[test]
    fn enum_columns_get_a_validating_accessor() {
        let c = class_of(
            &ColumnDescriptor::new("status", "enum('a','b')").default_value(Some("a")),
        );
        assert_eq!(c.semantic_type, SemanticType::Enum);
        assert_eq!(c.default, FieldDefault::Str("a".into()));
        assert_eq!(
            c.accessor,
            FieldAccessor::Enum {
                values: vec!["a".into(), "b".into()],
                multiple: false
            }
        );
    }

    #[test]
    fn primary_keys_are_not_updatable() {
        let id = ColumnDescriptor::new("id", "int(11)")
            .key_role(KeyRole::Primary)
            .extra("auto_increment");
        let c = class_of(&id);
        assert!(c.insertable);
        assert!(!c.updatable);
        assert_eq!(c.accessor, FieldAccessor::AutoIncrement);

        let natural = ColumnDescriptor::new("code", "char(3)").key_role(KeyRole::Primary);
        let c = class_of(&natural);
        assert!(!c.updatable);
        assert_eq!(c.accessor, FieldAccessor::Plain);
    }

    #[test]
    fn every_recognised_type_classifies() {
        let types = [
            "char(2)", "binary(16)", "varchar(10)", "varbinary(300)", "tinytext", "tinyblob",
            "text", "blob", "mediumtext", "mediumblob", "longtext", "longblob", "json",
            "tinyint(1)", "bool", "boolean", "tinyint(4)", "tinyint unsigned", "smallint",
            "smallint unsigned", "mediumint", "int", "int unsigned", "integer", "bigint",
            "bigint unsigned", "bit(1)", "year", "decimal(8,2)", "numeric", "float",
            "float unsigned", "double", "real", "timestamp", "datetime", "date", "time",
            "enum('x')", "set('x','y')",
        ];
        for ty in types {
            let first = classify("t", &ColumnDescriptor::new("c", ty));
            let second = classify("t", &ColumnDescriptor::new("c", ty));
            assert!(first.is_ok(), "{ty} should classify");
            assert_eq!(first.unwrap(), second.unwrap(), "{ty} classification is deterministic");
        }
    }

    #[test]
    fn unknown_types_fail_fast() {
        let err = classify("t", &ColumnDescriptor::new("shape", "geometry")).unwrap_err();
        assert!(matches!(err, SqlRecordsError::SchemaError(ref m) if m.contains("t.shape")));
    }
}
