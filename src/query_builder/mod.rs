//! SQL text assembly from structured inputs.
//!
//! Table and field lists are passed through as written; only identifiers the builders
//! generate themselves (DML column lists, placeholders) are quoted or sanitised.

mod dml;
mod where_clause;

pub use dml::{DeleteQuery, InsertQuery, UpdateQuery};
pub use where_clause::{Operator, Where, WhereValue};

use std::fmt;

/// Backtick-quoted identifier, accepted by both MySQL and `SQLite`.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Fluent SELECT builder.
///
/// ```rust
/// use sql_records::prelude::*;
///
/// let sql = SelectQuery::new("users")
///     .fields(["id", "name"])
///     .filter(Where::eq("status", ":status"))
///     .filter("deleted_at IS NULL")
///     .order_by("name")
///     .limit(10)
///     .offset(20)
///     .to_sql();
/// assert_eq!(
///     sql,
///     "SELECT id, name FROM users WHERE status = :status AND deleted_at IS NULL \
///      ORDER BY name LIMIT 10 OFFSET 20"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    table: String,
    fields: Vec<String>,
    filters: Vec<String>,
    group_by: Option<String>,
    order_by: Option<String>,
    limit: Option<u64>,
    offset: u64,
}

impl SelectQuery {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
            filters: Vec::new(),
            group_by: None,
            order_by: None,
            limit: None,
            offset: 0,
        }
    }

    /// Replace the field list. An empty list selects `*`.
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Add a condition; conditions are joined with AND.
    #[must_use]
    pub fn filter(mut self, clause: impl fmt::Display) -> Self {
        let clause = clause.to_string();
        if !clause.trim().is_empty() {
            self.filters.push(clause);
        }
        self
    }

    #[must_use]
    pub fn group_by(mut self, group_by: impl Into<String>) -> Self {
        self.group_by = Some(group_by.into()).filter(|s| !s.trim().is_empty());
        self
    }

    #[must_use]
    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into()).filter(|s| !s.trim().is_empty());
        self
    }

    /// `0` removes the limit.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    /// Only emitted together with a limit.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn to_sql(&self) -> String {
        let fields = if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(", ")
        };
        let mut sql = format!("SELECT {fields} FROM {}", self.table);
        if !self.filters.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.filters.join(" AND "));
        }
        if let Some(group_by) = &self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
        }
        if let Some(order_by) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit} OFFSET {}", self.offset));
        }
        sql
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
