use indexmap::IndexMap;

use crate::sanitize;
use crate::types::RowValues;

/// Marker prefixed to named parameters before they reach the driver.
pub const PLACEHOLDER_MARKER: char = ':';

/// Parameters for one statement.
///
/// Positional collections bind in order (`?` placeholders). Named collections bind by
/// `:name`; names are sanitised and prefixed when the statement is bound, so callers may
/// write either `"id"` or `":id"`.
///
/// ```rust
/// use sql_records::prelude::*;
///
/// let named = Params::named([("id", RowValues::Int(1))]);
/// let positional = Params::positional(vec![RowValues::Int(1)]);
/// # let _ = (named, positional);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Params {
    #[default]
    None,
    Positional(Vec<RowValues>),
    Named(IndexMap<String, RowValues>),
}

impl Params {
    #[must_use]
    pub fn positional(values: Vec<RowValues>) -> Self {
        if values.is_empty() {
            Params::None
        } else {
            Params::Positional(values)
        }
    }

    pub fn named<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<RowValues>,
        I: IntoIterator<Item = (K, V)>,
    {
        let map: IndexMap<String, RowValues> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if map.is_empty() {
            Params::None
        } else {
            Params::Named(map)
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Params::None => true,
            Params::Positional(values) => values.is_empty(),
            Params::Named(map) => map.is_empty(),
        }
    }

    /// Values in binding order.
    pub fn values(&self) -> impl Iterator<Item = &RowValues> {
        let (positional, named): (&[RowValues], Option<&IndexMap<String, RowValues>>) = match self
        {
            Params::None => (&[], None),
            Params::Positional(values) => (values.as_slice(), None),
            Params::Named(map) => (&[], Some(map)),
        };
        positional
            .iter()
            .chain(named.into_iter().flat_map(IndexMap::values))
    }

    /// Resolve into the form handed to a driver.
    #[must_use]
    pub fn bind(&self) -> BoundParams {
        match self {
            Params::None => BoundParams::Positional(Vec::new()),
            Params::Positional(values) => BoundParams::Positional(values.clone()),
            Params::Named(map) => BoundParams::Named(
                map.iter()
                    .map(|(name, value)| (placeholder_name(name), value.clone()))
                    .collect(),
            ),
        }
    }

    /// Merge `other` into `self`. Mixing positional and named parameters is rejected.
    ///
    /// # Errors
    /// Returns `SqlRecordsError::ParameterError` when the two collections differ in kind.
    pub fn extend(self, other: Params) -> Result<Params, crate::SqlRecordsError> {
        match (self, other) {
            (Params::None, other) => Ok(other),
            (this, Params::None) => Ok(this),
            (Params::Positional(mut a), Params::Positional(b)) => {
                a.extend(b);
                Ok(Params::Positional(a))
            }
            (Params::Named(mut a), Params::Named(b)) => {
                a.extend(b);
                Ok(Params::Named(a))
            }
            _ => Err(crate::SqlRecordsError::ParameterError(
                "cannot mix positional and named parameters".into(),
            )),
        }
    }
}

impl From<Vec<RowValues>> for Params {
    fn from(values: Vec<RowValues>) -> Self {
        Params::positional(values)
    }
}

impl From<IndexMap<String, RowValues>> for Params {
    fn from(map: IndexMap<String, RowValues>) -> Self {
        if map.is_empty() {
            Params::None
        } else {
            Params::Named(map)
        }
    }
}

/// Parameters after placeholder normalisation.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundParams {
    Positional(Vec<RowValues>),
    /// `(":name", value)` pairs.
    Named(Vec<(String, RowValues)>),
}

impl BoundParams {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            BoundParams::Positional(values) => values.is_empty(),
            BoundParams::Named(pairs) => pairs.is_empty(),
        }
    }
}

/// `:name` form of a parameter name; characters outside `[A-Za-z0-9_]` are dropped.
#[must_use]
pub fn placeholder_name(name: &str) -> String {
    format!("{PLACEHOLDER_MARKER}{}", sanitize::identifier_chars(name))
}
