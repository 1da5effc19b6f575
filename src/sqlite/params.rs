use rusqlite::Statement;
use rusqlite::types::Value;

use crate::error::DriverError;
use crate::params::BoundParams;
use crate::types::{RowValues, TIMESTAMP_FORMAT};

/// Convert a single `RowValues` to a rusqlite `Value`.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(dt.format(TIMESTAMP_FORMAT).to_string()),
        RowValues::Null => Value::Null,
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Bind `params` onto a prepared statement.
///
/// Every placeholder of the statement must receive a value, and every named value must match
/// a placeholder.
pub(crate) fn bind(stmt: &mut Statement<'_>, params: &BoundParams) -> Result<(), DriverError> {
    let expected = stmt.parameter_count();
    match params {
        BoundParams::Positional(values) => {
            if values.len() != expected {
                return Err(DriverError::Execute(format!(
                    "statement takes {expected} parameters, {} supplied",
                    values.len()
                )));
            }
            for (i, value) in values.iter().enumerate() {
                stmt.raw_bind_parameter(i + 1, row_value_to_sqlite_value(value))
                    .map_err(|e| DriverError::Execute(e.to_string()))?;
            }
        }
        BoundParams::Named(pairs) => {
            let mut bound = vec![false; expected];
            for (name, value) in pairs {
                let idx = stmt
                    .parameter_index(name)
                    .map_err(|e| DriverError::Execute(e.to_string()))?
                    .ok_or_else(|| {
                        DriverError::Execute(format!("statement has no parameter `{name}`"))
                    })?;
                stmt.raw_bind_parameter(idx, row_value_to_sqlite_value(value))
                    .map_err(|e| DriverError::Execute(e.to_string()))?;
                bound[idx - 1] = true;
            }
            if let Some(missing) = bound.iter().position(|b| !b) {
                let name = stmt
                    .parameter_name(missing + 1)
                    .unwrap_or("?")
                    .to_string();
                return Err(DriverError::Execute(format!("no value for parameter `{name}`")));
            }
        }
    }
    Ok(())
}
