use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static QUOTED_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'((?:[^']|'')*)'").expect("enum value pattern is valid")
});

/// Index role of a column as reported by `describe table`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    #[default]
    None,
    Primary,
    Unique,
    Multiple,
}

impl KeyRole {
    /// Parse the MySQL style key column (`PRI`, `UNI`, `MUL`, empty).
    #[must_use]
    pub fn from_describe(key: &str) -> Self {
        match key.trim().to_ascii_uppercase().as_str() {
            "PRI" => KeyRole::Primary,
            "UNI" => KeyRole::Unique,
            "MUL" => KeyRole::Multiple,
            _ => KeyRole::None,
        }
    }

    #[must_use]
    pub fn as_describe(self) -> &'static str {
        match self {
            KeyRole::None => "",
            KeyRole::Primary => "PRI",
            KeyRole::Unique => "UNI",
            KeyRole::Multiple => "MUL",
        }
    }
}

/// One column of a table as produced by introspection.
///
/// `default` holds the raw default text (unquoted), `None` when the column has no default
/// or defaults to NULL. `extra` carries flags such as `auto_increment` or
/// `on update CURRENT_TIMESTAMP` verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub sql_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub key_role: KeyRole,
    pub extra: String,
    pub is_enum_or_set: bool,
    pub enum_values: Vec<String>,
}

impl ColumnDescriptor {
    /// A NOT NULL column without default, key or extra flags.
    ///
    /// Enum and set value lists are read from `sql_type`.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        let sql_type = sql_type.into();
        let enum_values = parse_enum_values(&sql_type);
        Self {
            name: name.into(),
            is_enum_or_set: enum_values.is_some(),
            enum_values: enum_values.unwrap_or_default(),
            sql_type,
            nullable: false,
            default: None,
            key_role: KeyRole::None,
            extra: String::new(),
        }
    }

    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    #[must_use]
    pub fn default_value(mut self, default: Option<&str>) -> Self {
        self.default = default.map(str::to_string);
        self
    }

    #[must_use]
    pub fn key_role(mut self, key_role: KeyRole) -> Self {
        self.key_role = key_role;
        self
    }

    #[must_use]
    pub fn extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        self.key_role == KeyRole::Primary
    }

    #[must_use]
    pub fn is_auto_increment(&self) -> bool {
        self.extra.to_ascii_lowercase().contains("auto_increment")
    }
}

/// Values declared by an `enum(...)` or `set(...)` type, `None` for any other type.
///
/// Doubled single quotes inside a value are unescaped.
#[must_use]
pub fn parse_enum_values(sql_type: &str) -> Option<Vec<String>> {
    let lowered = sql_type.trim_start().to_ascii_lowercase();
    if !(lowered.starts_with("enum") || lowered.starts_with("set")) {
        return None;
    }
    let open = sql_type.find('(')?;
    let head = sql_type[..open].trim();
    if !(head.eq_ignore_ascii_case("enum") || head.eq_ignore_ascii_case("set")) {
        return None;
    }
    Some(
        QUOTED_VALUE
            .captures_iter(&sql_type[open..])
            .map(|c| c[1].replace("''", "'"))
            .collect(),
    )
}
