//! Page-at-a-time views over a query.

use std::cell::OnceCell;

use super::builder::Query;
use super::executor::QueryExecutor;
use crate::error::Error;
use crate::value::Row;

/// A query split into fixed-size pages. Pages are 1-indexed.
///
/// The total count is fetched at most once per instance.
#[derive(Debug)]
pub struct PaginatedQuery<'a, E: ?Sized> {
    query: Query,
    executor: &'a E,
    page_size: u64,
    page: u64,
    count: OnceCell<u64>,
}

impl<'a, E: QueryExecutor + ?Sized> PaginatedQuery<'a, E> {
    /// Wrap `query` at page 1. A page size of 0 is treated as 1.
    pub fn new(query: Query, executor: &'a E, page_size: u64) -> Self {
        Self {
            query,
            executor,
            page_size: page_size.max(1),
            page: 1,
            count: OnceCell::new(),
        }
    }

    /// Select the current page; values below 1 select page 1.
    pub fn with_page(mut self, page: u64) -> Self {
        self.page = page.max(1);
        self
    }

    /// The current page number.
    pub fn get_page(&self) -> u64 {
        self.page
    }

    /// Rows per page.
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// The wrapped query, without paging applied.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Total number of rows matched.
    pub fn count(&self) -> Result<u64, Error> {
        if let Some(&count) = self.count.get() {
            return Ok(count);
        }
        let count = self.executor.count(&self.query.clone().unbounded())?;
        let _ = self.count.set(count);
        Ok(count)
    }

    /// Number of pages; at least 1 even when nothing matches.
    pub fn get_pages(&self) -> Result<u64, Error> {
        Ok(self.count()?.div_ceil(self.page_size).max(1))
    }

    /// Rows of the current page. Pages past the end are empty.
    pub fn get_list(&self) -> Result<Vec<Row>, Error> {
        let query = self
            .query
            .clone()
            .offset((self.page - 1).saturating_mul(self.page_size))
            .limit(self.page_size);
        Ok(self.executor.execute(&query)?)
    }

    /// Check if a page precedes the current one.
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Check if a page follows the current one.
    pub fn has_next(&self) -> Result<bool, Error> {
        Ok(self.page < self.get_pages()?)
    }

    /// Previous page number, if any.
    pub fn previous_page(&self) -> Option<u64> {
        self.has_previous().then(|| self.page - 1)
    }

    /// Next page number, if any.
    pub fn next_page(&self) -> Result<Option<u64>, Error> {
        Ok(self.has_next()?.then(|| self.page + 1))
    }
}

/// Paginate `query` over `executor`, starting at page 1.
pub fn paginate<E: QueryExecutor + ?Sized>(
    query: Query,
    executor: &E,
    page_size: u64,
) -> PaginatedQuery<'_, E> {
    PaginatedQuery::new(query, executor, page_size)
}
