//! Memoised result sets keyed by query text and parameters.

use std::collections::HashMap;

use crate::params::Params;
use crate::results::CustomDbRow;
use crate::sanitize;

/// Rows of one cached query plus an index on the key column chosen when it was stored.
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    rows: Vec<CustomDbRow>,
    key_column: String,
    by_key: HashMap<String, Vec<usize>>,
}

impl CacheEntry {
    fn new(rows: Vec<CustomDbRow>, key_column: &str) -> Self {
        let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, row) in rows.iter().enumerate() {
            if let Some(value) = row.get(key_column) {
                by_key.entry(value.to_key_string()).or_default().push(i);
            }
        }
        Self {
            rows,
            key_column: key_column.to_string(),
            by_key,
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[CustomDbRow] {
        &self.rows
    }

    #[must_use]
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// First row whose key column renders as `key`.
    #[must_use]
    pub fn row(&self, key: &str) -> Option<&CustomDbRow> {
        self.by_key
            .get(key)
            .and_then(|idx| idx.first())
            .map(|&i| &self.rows[i])
    }

    /// Every row sharing the key, in result order.
    #[must_use]
    pub fn rows_for(&self, key: &str) -> Vec<&CustomDbRow> {
        self.by_key
            .get(key)
            .map(|idx| idx.iter().map(|&i| &self.rows[i]).collect())
            .unwrap_or_default()
    }
}

/// Result cache owned by one executor. Entries live until [`ResultCache::clear`].
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: HashMap<String, CacheEntry>,
}

impl ResultCache {
    /// Normalised identity of a query: its alphanumeric characters followed by those of the
    /// concatenated parameter values.
    #[must_use]
    pub fn cache_id(sql: &str, params: &Params) -> String {
        let joined: String = params.values().map(|v| v.to_key_string()).collect();
        format!(
            "{}{}",
            sanitize::alpha_numeric(sql),
            sanitize::alpha_numeric(&joined)
        )
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CacheEntry> {
        self.entries.get(id)
    }

    /// Store `rows` under `id` indexed by `key_column`. An existing entry is kept and the key
    /// column is ignored.
    pub fn insert(&mut self, id: String, rows: Vec<CustomDbRow>, key_column: &str) -> &CacheEntry {
        self.entries
            .entry(id)
            .or_insert_with(|| CacheEntry::new(rows, key_column))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
