use rusqlite::Statement;
use rusqlite::types::Value;

use crate::error::DriverError;
use crate::results::ResultSet;
use crate::types::RowValues;

pub(crate) fn sqlite_extract_value(row: &rusqlite::Row<'_>, idx: usize) -> Result<RowValues, DriverError> {
    let value: Value = row
        .get(idx)
        .map_err(|e| DriverError::Execute(e.to_string()))?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Step an already bound statement to completion and collect its rows.
pub(crate) fn build_result_set(stmt: &mut Statement<'_>) -> Result<ResultSet, DriverError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();
    let mut result_set = ResultSet::with_columns(column_names, 8);

    let mut rows = stmt.raw_query();
    while let Some(row) = rows
        .next()
        .map_err(|e| DriverError::Execute(e.to_string()))?
    {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(sqlite_extract_value(row, i)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}
