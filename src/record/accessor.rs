//! Write checks and read conversions keyed by a field's accessor entry.

use tracing::debug;

use crate::error::SqlRecordsError;
use crate::schema::{FieldAccessor, FieldDef, SemanticType};
use crate::types::{RowValues, parse_timestamp};

/// Validate `value` for `field`. `Ok(None)` means the write is ignored.
pub(crate) fn apply(
    table: &str,
    field: &FieldDef,
    value: RowValues,
    loaded_from_db: bool,
) -> Result<Option<RowValues>, SqlRecordsError> {
    let class = &field.classification;
    match &class.accessor {
        FieldAccessor::AutoIncrement if loaded_from_db => {
            debug!(table, field = field.column.as_str(), "auto-increment key already assigned; write ignored");
            Ok(None)
        }
        FieldAccessor::AutoIncrement => match value {
            RowValues::Null | RowValues::Int(_) => Ok(Some(value)),
            RowValues::Text(ref s) => s
                .trim()
                .parse()
                .map(|id| Some(RowValues::Int(id)))
                .map_err(|_| invalid(table, field, "an integer key", &value)),
            other => Err(invalid(table, field, "an integer key", &other)),
        },
        _ if value.is_null() => {
            if class.nullable {
                Ok(Some(RowValues::Null))
            } else {
                Err(SqlRecordsError::ValidationError(format!(
                    "`{table}.{}` is not nullable",
                    field.column
                )))
            }
        }
        FieldAccessor::Enum { values, multiple } => {
            let Some(text) = value.as_text() else {
                return Err(invalid(table, field, "one of its declared values", &value));
            };
            let accepted = if *multiple {
                text.is_empty() || text.split(',').all(|part| values.iter().any(|v| v == part))
            } else {
                values.iter().any(|v| v == text)
            };
            if accepted {
                Ok(Some(value))
            } else {
                Err(SqlRecordsError::ValidationError(format!(
                    "`{text}` is not an allowed value for `{table}.{}` (allowed: {})",
                    field.column,
                    values.join(", ")
                )))
            }
        }
        FieldAccessor::Timestamp => match value.as_timestamp() {
            Some(dt) => Ok(Some(RowValues::Timestamp(dt))),
            None => Err(invalid(table, field, "a date/time", &value)),
        },
        FieldAccessor::Plain => coerce(class.semantic_type, value)
            .map(Some)
            .map_err(|v| invalid(table, field, expected_kind(class.semantic_type), &v)),
    }
}

/// Lossless conversions into the field's storage type; the unchanged value on mismatch.
fn coerce(semantic: SemanticType, value: RowValues) -> Result<RowValues, RowValues> {
    match (semantic, value) {
        (SemanticType::String, v @ (RowValues::Text(_) | RowValues::Blob(_)))
        | (SemanticType::Int, v @ RowValues::Int(_))
        | (SemanticType::Float, v @ RowValues::Float(_))
        | (SemanticType::Bool, v @ RowValues::Bool(_))
        | (SemanticType::Date | SemanticType::Enum, v @ RowValues::Text(_))
        | (SemanticType::Timestamp, v @ RowValues::Timestamp(_)) => Ok(v),
        (SemanticType::Int, RowValues::Bool(b)) => Ok(RowValues::Int(i64::from(b))),
        #[allow(clippy::cast_precision_loss)]
        (SemanticType::Float, RowValues::Int(i)) => Ok(RowValues::Float(i as f64)),
        (SemanticType::Bool, RowValues::Int(i @ (0 | 1))) => Ok(RowValues::Bool(i == 1)),
        (_, other) => Err(other),
    }
}

/// Normalise a value read from the database to the field's type.
pub(crate) fn from_db(semantic: SemanticType, value: RowValues) -> RowValues {
    match (semantic, value) {
        (SemanticType::Bool, RowValues::Int(i)) => RowValues::Bool(i != 0),
        (SemanticType::Timestamp, RowValues::Text(s)) => match parse_timestamp(&s) {
            Some(dt) => RowValues::Timestamp(dt),
            None => RowValues::Text(s),
        },
        #[allow(clippy::cast_precision_loss)]
        (SemanticType::Float, RowValues::Int(i)) => RowValues::Float(i as f64),
        (_, other) => other,
    }
}

fn expected_kind(semantic: SemanticType) -> &'static str {
    match semantic {
        SemanticType::String => "text",
        SemanticType::Int => "an integer",
        SemanticType::Float => "a number",
        SemanticType::Bool => "a boolean",
        SemanticType::Timestamp => "a date/time",
        SemanticType::Date => "a date",
        SemanticType::Enum => "one of its declared values",
    }
}

fn invalid(table: &str, field: &FieldDef, expected: &str, got: &RowValues) -> SqlRecordsError {
    SqlRecordsError::ValidationError(format!(
        "`{table}.{}` expects {expected}, got {got:?}",
        field.column
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDescriptor, KeyRole, classify};

    fn field(column: ColumnDescriptor) -> FieldDef {
        let class = classify("t", &column).unwrap();
        FieldDef::new(column.name, "f", class)
    }

    #[test]
    fn enum_rejects_undeclared_values() {
        let status = field(ColumnDescriptor::new("status", "enum('a','b')"));
        assert!(apply("t", &status, "a".into(), false).is_ok());
        assert!(matches!(
            apply("t", &status, "c".into(), false),
            Err(SqlRecordsError::ValidationError(_))
        ));
        assert!(apply("t", &status, RowValues::Null, false).is_err());
    }

    #[test]
    fn set_accepts_combinations() {
        let flags = field(ColumnDescriptor::new("flags", "set('x','y')").nullable(true));
        assert!(apply("t", &flags, "x,y".into(), false).is_ok());
        assert!(apply("t", &flags, "".into(), false).is_ok());
        assert!(apply("t", &flags, RowValues::Null, false).is_ok());
        assert!(apply("t", &flags, "x,z".into(), false).is_err());
    }

    #[test]
    fn timestamps_are_parsed() {
        let at = field(ColumnDescriptor::new("at", "datetime"));
        let stored = apply("t", &at, "2024-01-02 03:04:05".into(), false)
            .unwrap()
            .unwrap();
        assert!(matches!(stored, RowValues::Timestamp(_)));
        assert!(apply("t", &at, "next tuesday".into(), false).is_err());
    }

    #[test]
    fn auto_increment_is_write_once() {
        let id = field(
            ColumnDescriptor::new("id", "int")
                .key_role(KeyRole::Primary)
                .extra("auto_increment"),
        );
        assert_eq!(
            apply("t", &id, "7".into(), false).unwrap(),
            Some(RowValues::Int(7))
        );
        assert_eq!(apply("t", &id, RowValues::Int(9), true).unwrap(), None);
    }

    #[test]
    fn plain_fields_are_type_checked() {
        let flag = field(ColumnDescriptor::new("flag", "tinyint(1)"));
        assert_eq!(
            apply("t", &flag, RowValues::Int(1), false).unwrap(),
            Some(RowValues::Bool(true))
        );
        let count = field(ColumnDescriptor::new("count", "int"));
        assert!(apply("t", &count, "many".into(), false).is_err());
    }

    #[test]
    fn date_fields_take_text_only() {
        let day = field(ColumnDescriptor::new("day", "date"));
        assert!(apply("t", &day, "2024-01-02".into(), false).is_ok());
        let dt = parse_timestamp("2024-01-02 03:04:05").unwrap();
        // a date/time would be stored with a clock part the column never holds
        assert!(matches!(
            apply("t", &day, RowValues::Timestamp(dt), false),
            Err(SqlRecordsError::ValidationError(_))
        ));
    }

    #[test]
    fn database_values_take_field_types() {
        assert_eq!(from_db(SemanticType::Bool, RowValues::Int(0)), RowValues::Bool(false));
        assert!(matches!(
            from_db(SemanticType::Timestamp, RowValues::Text("2024-01-02 03:04:05".into())),
            RowValues::Timestamp(_)
        ));
        assert_eq!(
            from_db(SemanticType::String, RowValues::Int(3)),
            RowValues::Int(3)
        );
    }
}
