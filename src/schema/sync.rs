//! Compare a generated definition with the live table and report the ALTER statements that
//! would bring the table in line. Nothing here touches the database.

use serde::Serialize;

use super::column::ColumnDescriptor;
use super::definition::TableDefinition;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnChange {
    pub column: String,
    pub statement: String,
    pub expected: ColumnDescriptor,
    /// `None` for additions.
    pub live: Option<ColumnDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SyncReport {
    pub table: String,
    pub additions: Vec<ColumnChange>,
    pub modifications: Vec<ColumnChange>,
    /// Live columns the definition does not know about. Never dropped.
    pub untracked: Vec<String>,
}

impl SyncReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.additions.is_empty() && self.modifications.is_empty() && self.untracked.is_empty()
    }

    /// ADD statements first, then CHANGE statements.
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.additions
            .iter()
            .chain(&self.modifications)
            .map(|c| c.statement.as_str())
    }
}

/// Diff `definition` against the `live` columns of the same table.
#[must_use]
pub fn compare(definition: &TableDefinition, live: &[ColumnDescriptor]) -> SyncReport {
    let table = &definition.table_name;
    let mut report = SyncReport {
        table: table.clone(),
        ..SyncReport::default()
    };

    for expected in definition.column_descriptors.values() {
        match live.iter().find(|c| c.name == expected.name) {
            None => report.additions.push(ColumnChange {
                column: expected.name.clone(),
                statement: format!(
                    "ALTER TABLE `{table}` ADD COLUMN {}",
                    column_sql(expected)
                ),
                expected: expected.clone(),
                live: None,
            }),
            Some(current) if !same_shape(expected, current) => {
                report.modifications.push(ColumnChange {
                    column: expected.name.clone(),
                    statement: format!(
                        "ALTER TABLE `{table}` CHANGE COLUMN `{}` {}",
                        expected.name,
                        column_sql(expected)
                    ),
                    expected: expected.clone(),
                    live: Some(current.clone()),
                });
            }
            Some(_) => {}
        }
    }

    report.untracked = live
        .iter()
        .filter(|c| !definition.column_descriptors.contains_key(&c.name))
        .map(|c| c.name.clone())
        .collect();
    report
}

fn same_shape(a: &ColumnDescriptor, b: &ColumnDescriptor) -> bool {
    a.sql_type.eq_ignore_ascii_case(&b.sql_type)
        && a.nullable == b.nullable
        && a.default == b.default
        && a.extra.trim().eq_ignore_ascii_case(b.extra.trim())
}

/// Column definition clause: `` `name` type [NOT NULL] [DEFAULT x] [extra] ``.
pub(crate) fn column_sql(column: &ColumnDescriptor) -> String {
    let mut sql = format!("`{}` {}", column.name, column.sql_type);
    if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&default_sql(default));
    }
    let extra = column.extra.trim();
    if !extra.is_empty() {
        sql.push(' ');
        sql.push_str(extra);
    }
    sql
}

fn default_sql(default: &str) -> String {
    let lowered = default.to_ascii_lowercase();
    if default.parse::<f64>().is_ok() || lowered.starts_with("current_timestamp") {
        default.to_string()
    } else {
        format!("'{}'", default.replace('\'', "''"))
    }
}
