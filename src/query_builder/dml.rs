use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;

use super::quote_ident;
use crate::params::{PLACEHOLDER_MARKER, Params};
use crate::sanitize;
use crate::types::RowValues;

/// Placeholder names derived from column names, kept unique within one statement.
#[derive(Default)]
struct PlaceholderNames {
    used: HashSet<String>,
}

impl PlaceholderNames {
    fn claim(&mut self, prefix: &str, column: &str) -> String {
        let base = format!("{prefix}{}", sanitize::identifier_chars(column));
        let base = if base.is_empty() { "p".to_string() } else { base };
        let mut name = base.clone();
        let mut n = 2;
        while !self.used.insert(name.clone()) {
            name = format!("{base}_{n}");
            n += 1;
        }
        name
    }
}

/// `INSERT INTO t (a, b) VALUES (:a, :b)`; without values it inserts `DEFAULT VALUES`.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertQuery {
    table: String,
    values: IndexMap<String, RowValues>,
}

impl InsertQuery {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            values: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn value(mut self, column: impl Into<String>, value: impl Into<RowValues>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    #[must_use]
    pub fn values<I, K>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, RowValues)>,
        K: Into<String>,
    {
        self.values
            .extend(values.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    #[must_use]
    pub fn build(&self) -> (String, Params) {
        if self.values.is_empty() {
            return (
                format!("INSERT INTO {} DEFAULT VALUES", quote_ident(&self.table)),
                Params::None,
            );
        }
        let mut names = PlaceholderNames::default();
        let mut columns = Vec::with_capacity(self.values.len());
        let mut placeholders = Vec::with_capacity(self.values.len());
        let mut params = IndexMap::with_capacity(self.values.len());
        for (column, value) in &self.values {
            let name = names.claim("", column);
            columns.push(quote_ident(column));
            placeholders.push(format!("{PLACEHOLDER_MARKER}{name}"));
            params.insert(name, value.clone());
        }
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&self.table),
            columns.join(", "),
            placeholders.join(", ")
        );
        (sql, Params::Named(params))
    }
}

/// `UPDATE t SET a = :set_a WHERE ...`.
///
/// With positional filter parameters the SET values become positional too and are bound
/// ahead of them.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateQuery {
    table: String,
    values: IndexMap<String, RowValues>,
    filter: String,
    filter_params: Params,
}

impl UpdateQuery {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            values: IndexMap::new(),
            filter: String::new(),
            filter_params: Params::None,
        }
    }

    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<RowValues>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    #[must_use]
    pub fn values<I, K>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, RowValues)>,
        K: Into<String>,
    {
        self.values
            .extend(values.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    #[must_use]
    pub fn filter(mut self, clause: impl fmt::Display, params: Params) -> Self {
        self.filter = clause.to_string();
        self.filter_params = params;
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn build(&self) -> (String, Params) {
        let positional = matches!(self.filter_params, Params::Positional(_));
        let mut names = PlaceholderNames::default();
        let mut assignments = Vec::with_capacity(self.values.len());
        let mut named = IndexMap::new();
        let mut ordered = Vec::new();

        for (column, value) in &self.values {
            if positional {
                assignments.push(format!("{} = ?", quote_ident(column)));
                ordered.push(value.clone());
            } else {
                let name = names.claim("set_", column);
                assignments.push(format!("{} = {PLACEHOLDER_MARKER}{name}", quote_ident(column)));
                named.insert(name, value.clone());
            }
        }

        let mut sql = format!(
            "UPDATE {} SET {}",
            quote_ident(&self.table),
            assignments.join(", ")
        );
        if !self.filter.trim().is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.filter);
        }

        let params = match &self.filter_params {
            Params::Positional(values) => {
                ordered.extend(values.iter().cloned());
                Params::Positional(ordered)
            }
            Params::Named(map) => {
                for (k, v) in map {
                    named.insert(k.trim_start_matches(PLACEHOLDER_MARKER).to_string(), v.clone());
                }
                Params::from(named)
            }
            Params::None => Params::from(named),
        };
        (sql, params)
    }
}

/// `DELETE FROM t WHERE ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteQuery {
    table: String,
    filter: String,
}

impl DeleteQuery {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filter: String::new(),
        }
    }

    #[must_use]
    pub fn filter(mut self, clause: impl fmt::Display) -> Self {
        self.filter = clause.to_string();
        self
    }

    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut sql = format!("DELETE FROM {}", quote_ident(&self.table));
        if !self.filter.trim().is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.filter);
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::Where;

    #[test]
    fn insert_uses_named_placeholders() {
        let (sql, params) = InsertQuery::new("t")
            .value("name", "a")
            .value("e-mail", "x@y")
            .value("email", "z@y")
            .build();
        assert_eq!(
            sql,
            "INSERT INTO `t` (`name`, `e-mail`, `email`) VALUES (:name, :email, :email_2)"
        );
        assert_eq!(params.values().count(), 3);
    }

    #[test]
    fn empty_insert_uses_defaults() {
        let (sql, params) = InsertQuery::new("t").build();
        assert_eq!(sql, "INSERT INTO `t` DEFAULT VALUES");
        assert!(params.is_empty());
    }

    #[test]
    fn update_with_named_filter() {
        let (sql, params) = UpdateQuery::new("t")
            .set("name", "b")
            .filter(Where::eq("id", ":id"), Params::named([("id", 3_i64)]))
            .build();
        assert_eq!(sql, "UPDATE `t` SET `name` = :set_name WHERE id = :id");
        let Params::Named(map) = params else {
            panic!("expected named params");
        };
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["set_name", "id"]);
    }

    #[test]
    fn update_with_positional_filter() {
        let (sql, params) = UpdateQuery::new("t")
            .set("name", "b")
            .filter("id = ?", Params::positional(vec![RowValues::Int(3)]))
            .build();
        assert_eq!(sql, "UPDATE `t` SET `name` = ? WHERE id = ?");
        assert_eq!(
            params,
            Params::Positional(vec![RowValues::Text("b".into()), RowValues::Int(3)])
        );
    }

    #[test]
    fn delete_with_filter() {
        assert_eq!(
            DeleteQuery::new("t").filter(Where::eq("id", 1)).to_sql(),
            "DELETE FROM `t` WHERE id = 1"
        );
    }
}
