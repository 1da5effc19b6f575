use std::fmt;
use std::str::FromStr;

use crate::error::SqlRecordsError;
use crate::params::placeholder_name;
use crate::types::{RowValues, TIMESTAMP_FORMAT};

/// Operators understood by [`Where`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Gt,
    Lt,
    Eq,
    Ge,
    Le,
    Ne,
    /// `<>`
    NotEq,
    /// `<=>`
    NullSafeEq,
    And,
    /// `&&`
    AndSymbol,
    Is,
    IsNot,
    Not,
    /// `!`
    Bang,
    Or,
    /// `||`
    OrSymbol,
    Like,
    NotLike,
    Regexp,
    NotRegexp,
    Rlike,
    SoundsLike,
    MemberOf,
    IsNull,
    IsNotNull,
    In,
    NotIn,
}

impl Operator {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Eq => "=",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Ne => "!=",
            Operator::NotEq => "<>",
            Operator::NullSafeEq => "<=>",
            Operator::And => "AND",
            Operator::AndSymbol => "&&",
            Operator::Is => "IS",
            Operator::IsNot => "IS NOT",
            Operator::Not => "NOT",
            Operator::Bang => "!",
            Operator::Or => "OR",
            Operator::OrSymbol => "||",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::Regexp => "REGEXP",
            Operator::NotRegexp => "NOT REGEXP",
            Operator::Rlike => "RLIKE",
            Operator::SoundsLike => "SOUNDS LIKE",
            Operator::MemberOf => "MEMBER OF",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
        }
    }

    fn is_disjunction(self) -> bool {
        matches!(self, Operator::Or | Operator::OrSymbol)
    }

    fn is_unary(self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }

    fn takes_list(self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl FromStr for Operator {
    type Err = SqlRecordsError;

    /// Case-insensitive; runs of whitespace inside the operator are collapsed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_uppercase();
        let op = match normalised.as_str() {
            ">" => Operator::Gt,
            "<" => Operator::Lt,
            "=" => Operator::Eq,
            ">=" => Operator::Ge,
            "<=" => Operator::Le,
            "!=" => Operator::Ne,
            "<>" => Operator::NotEq,
            "<=>" => Operator::NullSafeEq,
            "AND" => Operator::And,
            "&&" => Operator::AndSymbol,
            "IS" => Operator::Is,
            "IS NOT" => Operator::IsNot,
            "NOT" => Operator::Not,
            "!" => Operator::Bang,
            "OR" => Operator::Or,
            "||" => Operator::OrSymbol,
            "LIKE" => Operator::Like,
            "NOT LIKE" => Operator::NotLike,
            "REGEXP" => Operator::Regexp,
            "NOT REGEXP" => Operator::NotRegexp,
            "RLIKE" => Operator::Rlike,
            "SOUNDS LIKE" | "SOUND LIKE" => Operator::SoundsLike,
            "MEMBER OF" => Operator::MemberOf,
            "IS NULL" => Operator::IsNull,
            "IS NOT NULL" => Operator::IsNotNull,
            "IN" => Operator::In,
            "NOT IN" => Operator::NotIn,
            _ => {
                return Err(SqlRecordsError::ParameterError(format!(
                    "Unknown where clause operator '{s}'"
                )));
            }
        };
        Ok(op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereValue {
    None,
    /// Bound later as `:name`.
    Placeholder(String),
    /// Rendered inline as an SQL literal.
    Literal(RowValues),
    /// Passed through verbatim (column, sub-query, nested condition).
    Expr(String),
    List(Vec<RowValues>),
}

impl WhereValue {
    #[must_use]
    pub fn expr(sql: impl Into<String>) -> Self {
        WhereValue::Expr(sql.into())
    }
}

/// Text starting with `:` is a placeholder; anything else is a text literal.
impl From<&str> for WhereValue {
    fn from(value: &str) -> Self {
        match value.strip_prefix(crate::params::PLACEHOLDER_MARKER) {
            Some(name) => WhereValue::Placeholder(name.to_string()),
            None => WhereValue::Literal(RowValues::Text(value.to_string())),
        }
    }
}

impl From<String> for WhereValue {
    fn from(value: String) -> Self {
        WhereValue::from(value.as_str())
    }
}

impl From<RowValues> for WhereValue {
    fn from(value: RowValues) -> Self {
        WhereValue::Literal(value)
    }
}

impl From<i64> for WhereValue {
    fn from(value: i64) -> Self {
        WhereValue::Literal(RowValues::Int(value))
    }
}

impl From<i32> for WhereValue {
    fn from(value: i32) -> Self {
        WhereValue::Literal(RowValues::Int(i64::from(value)))
    }
}

impl From<Vec<RowValues>> for WhereValue {
    fn from(values: Vec<RowValues>) -> Self {
        WhereValue::List(values)
    }
}

impl From<Where> for WhereValue {
    fn from(condition: Where) -> Self {
        WhereValue::Expr(condition.to_string())
    }
}

/// One condition of a WHERE clause, rendered through `Display`.
///
/// ```rust
/// use sql_records::prelude::*;
///
/// assert_eq!(Where::eq("id", 10).to_string(), "id = 10");
/// assert_eq!(Where::is_not_null("deleted_at").to_string(), "deleted_at IS NOT NULL");
/// let either = Where::or(Where::eq("a", 1), Where::eq("b", ":b"));
/// assert_eq!(either.to_string(), "((a = 1) OR (b = :b))");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Where {
    field: String,
    operator: Operator,
    value: WhereValue,
}

impl Where {
    #[must_use]
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<WhereValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Build from an operator spelled as text.
    ///
    /// # Errors
    /// Returns `SqlRecordsError::ParameterError` for an unknown operator.
    pub fn parse(
        field: impl Into<String>,
        operator: &str,
        value: impl Into<WhereValue>,
    ) -> Result<Self, SqlRecordsError> {
        Ok(Self::new(field, operator.parse()?, value))
    }

    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<WhereValue>) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    #[must_use]
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, Operator::IsNull, WhereValue::None)
    }

    #[must_use]
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::new(field, Operator::IsNotNull, WhereValue::None)
    }

    #[must_use]
    pub fn in_list(field: impl Into<String>, values: Vec<RowValues>) -> Self {
        Self::new(field, Operator::In, WhereValue::List(values))
    }

    /// `((left) OR (right))`
    #[must_use]
    pub fn or(left: Where, right: Where) -> Self {
        Self::new(left.to_string(), Operator::Or, right)
    }

    #[must_use]
    pub fn operator(&self) -> Operator {
        self.operator
    }
}

impl fmt::Display for Where {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.operator;
        if op.is_disjunction() {
            return write!(f, "(({}) {op} ({}))", self.field, render(&self.value));
        }
        if op.is_unary() || matches!(self.value, WhereValue::None) {
            return write!(f, "{} {op}", self.field);
        }
        if op.takes_list() {
            return write!(f, "{} {op} ({})", self.field, render(&self.value));
        }
        write!(f, "{} {op} {}", self.field, render(&self.value))
    }
}

fn render(value: &WhereValue) -> String {
    match value {
        WhereValue::None => String::new(),
        WhereValue::Placeholder(name) => placeholder_name(name),
        WhereValue::Literal(v) => sql_literal(v),
        WhereValue::Expr(sql) => sql.clone(),
        WhereValue::List(values) => values.iter().map(sql_literal).collect::<Vec<_>>().join(", "),
    }
}

/// Inline SQL literal; text is single-quoted with embedded quotes doubled.
pub(crate) fn sql_literal(value: &RowValues) -> String {
    match value {
        RowValues::Int(i) => i.to_string(),
        RowValues::Float(f) => f.to_string(),
        RowValues::Bool(b) => i64::from(*b).to_string(),
        RowValues::Null => "NULL".to_string(),
        RowValues::Text(s) => format!("'{}'", s.replace('\'', "''")),
        RowValues::Timestamp(dt) => format!("'{}'", dt.format(TIMESTAMP_FORMAT)),
        RowValues::Blob(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
            format!("X'{hex}'")
        }
    }
}
