//! The storage collaborator seam.

use super::builder::Query;
use crate::error::StorageError;
use crate::value::Row;

/// Runs queries built by the engine.
///
/// Implementations own connection handling, concurrency and cancellation. The
/// engine treats every call as one opaque, synchronous round trip and never
/// retries.
pub trait QueryExecutor {
    /// Run the query and return its rows.
    fn execute(&self, query: &Query) -> Result<Vec<Row>, StorageError>;

    /// Count the rows the query matches, ignoring offset and limit.
    fn count(&self, query: &Query) -> Result<u64, StorageError>;

    /// Check if the query matches at least one row.
    fn exists(&self, query: &Query) -> Result<bool, StorageError> {
        Ok(!self.execute(&query.clone().unbounded().limit(1))?.is_empty())
    }
}

impl<T: QueryExecutor + ?Sized> QueryExecutor for &T {
    fn execute(&self, query: &Query) -> Result<Vec<Row>, StorageError> {
        (**self).execute(query)
    }

    fn count(&self, query: &Query) -> Result<u64, StorageError> {
        (**self).count(query)
    }

    fn exists(&self, query: &Query) -> Result<bool, StorageError> {
        (**self).exists(query)
    }
}
