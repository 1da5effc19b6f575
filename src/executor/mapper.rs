use std::marker::PhantomData;

use super::Executor;
use crate::error::SqlRecordsError;
use crate::params::Params;
use crate::query_builder::SelectQuery;
use crate::results::FromRow;

/// One-shot typed fetch created by [`Executor::map_into`].
///
/// Each method consumes the override, so the next query on the executor returns generic rows
/// again.
///
/// ```rust,no_run
/// use sql_records::prelude::*;
///
/// struct Id(i64);
///
/// impl FromRow for Id {
///     fn from_row(row: &CustomDbRow) -> Result<Self, SqlRecordsError> {
///         row.get("id")
///             .and_then(RowValues::as_int)
///             .map(|id| Id(*id))
///             .ok_or_else(|| SqlRecordsError::ValidationError("id missing".into()))
///     }
/// }
///
/// # fn demo(db: &Executor) -> Result<(), SqlRecordsError> {
/// let ids: Vec<Id> = db.map_into::<Id>().get_list("SELECT id FROM t", Params::None)?;
/// # let _ = ids;
/// # Ok(())
/// # }
/// ```
#[must_use = "a mapped query does nothing until one of its fetch methods is called"]
pub struct MappedQuery<'e, T> {
    executor: &'e Executor,
    _target: PhantomData<fn() -> T>,
}

impl<'e, T: FromRow> MappedQuery<'e, T> {
    pub(crate) fn new(executor: &'e Executor) -> Self {
        Self {
            executor,
            _target: PhantomData,
        }
    }

    /// # Errors
    /// Failures of [`Executor::get_list`], or the first row `T::from_row` rejects.
    pub fn get_list(self, sql: &str, params: impl Into<Params>) -> Result<Vec<T>, SqlRecordsError> {
        self.executor
            .get_list(sql, params)?
            .iter()
            .map(T::from_row)
            .collect()
    }

    /// # Errors
    /// Failures of [`Executor::get_row`], or a row `T::from_row` rejects.
    pub fn get_row(self, sql: &str, params: impl Into<Params>) -> Result<Option<T>, SqlRecordsError> {
        self.executor
            .get_row(sql, params)?
            .as_ref()
            .map(T::from_row)
            .transpose()
    }

    /// # Errors
    /// As [`MappedQuery::get_list`].
    pub fn get_records(
        self,
        select: &SelectQuery,
        params: impl Into<Params>,
    ) -> Result<Vec<T>, SqlRecordsError> {
        self.get_list(&select.to_sql(), params)
    }
}
