//! In-memory query executor.
//!
//! Evaluates the full query model (left joins, predicates, ordering, paging
//! and projection) over rows held in memory. Used by the CLI and the tests.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use tracing::trace;

use crate::catalog::Schema;
use crate::error::{Error, StorageError};
use crate::query::{OrderDirection, Query, QueryExecutor, ROOT_ALIAS};
use crate::value::{Row, Value};

/// Rows of one root-row evaluation, one slot per alias (`None` = missing instance).
type Binding<'r> = Vec<(&'r str, Option<&'r Row>)>;

/// Thread-safe in-memory table store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Model name -> rows in insertion order
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a dataset, rejecting models the schema does not know.
    pub fn load(schema: &Schema, data: BTreeMap<String, Vec<Row>>) -> Result<Self, Error> {
        let store = Self::new();
        for (model, rows) in data {
            schema.model(&model)?;
            store.insert_many(&model, rows);
        }
        Ok(store)
    }

    /// Append a row to a model's table.
    pub fn insert(&self, model: &str, row: Row) {
        self.tables
            .write()
            .entry(model.to_string())
            .or_default()
            .push(row);
    }

    /// Append many rows to a model's table.
    pub fn insert_many(&self, model: &str, rows: impl IntoIterator<Item = Row>) {
        self.tables
            .write()
            .entry(model.to_string())
            .or_default()
            .extend(rows);
    }

    /// Number of rows stored for a model.
    pub fn len(&self, model: &str) -> usize {
        self.tables.read().get(model).map_or(0, Vec::len)
    }

    /// Check if the store holds no rows at all.
    pub fn is_empty(&self) -> bool {
        self.tables.read().values().all(Vec::is_empty)
    }

    /// Remove every row.
    pub fn clear(&self) {
        self.tables.write().clear();
    }

    /// Evaluate joins, predicates and ordering; paging and projection are left to the caller.
    fn evaluate<'r>(
        tables: &'r HashMap<String, Vec<Row>>,
        query: &'r Query,
    ) -> Result<Vec<Binding<'r>>, StorageError> {
        let empty: &[Row] = &[];
        let base = tables.get(query.model()).map_or(empty, Vec::as_slice);

        // target model -> pk identity -> row, built once per join
        let mut indexes: Vec<HashMap<String, &'r Row>> = Vec::with_capacity(query.joins().len());
        for join in query.joins() {
            let rows = tables.get(&join.target_model).map_or(empty, Vec::as_slice);
            let index = rows
                .iter()
                .filter_map(|r| {
                    r.get(&join.target_key)
                        .filter(|v| !v.is_null())
                        .map(|v| (v.identity_key(), r))
                })
                .collect();
            indexes.push(index);
        }

        let mut matched = Vec::new();
        for row in base {
            let mut binding: Binding<'r> = vec![(ROOT_ALIAS, Some(row))];

            for (join, index) in query.joins().iter().zip(&indexes) {
                let from = lookup(&binding, &join.from_alias).ok_or_else(|| {
                    StorageError::new(format!("join `{}` reads unbound alias `{}`", join.alias, join.from_alias))
                })?;
                let target = from
                    .and_then(|r| r.get(&join.via_field))
                    .filter(|v| !v.is_null())
                    .and_then(|fk| index.get(&fk.identity_key()).copied());
                binding.push((join.alias.as_str(), target));
            }

            let mut keep = true;
            for p in query.predicates() {
                let slot = lookup(&binding, &p.column.alias).ok_or_else(|| {
                    StorageError::new(format!("predicate reads unbound alias `{}`", p.column.alias))
                })?;
                if !p.matches(slot.and_then(|r| r.get(&p.column.field))) {
                    keep = false;
                    break;
                }
            }
            if keep {
                matched.push(binding);
            }
        }

        if !query.ordering().is_empty() {
            for spec in query.ordering() {
                if !alias_is_bound(query, &spec.column.alias) {
                    return Err(StorageError::new(format!(
                        "ordering reads unbound alias `{}`",
                        spec.column.alias
                    )));
                }
            }
            matched.sort_by(|a, b| {
                query
                    .ordering()
                    .iter()
                    .map(|spec| {
                        let left = column_value(a, &spec.column.alias, &spec.column.field);
                        let right = column_value(b, &spec.column.alias, &spec.column.field);
                        let ord = left.sort_cmp(right);
                        match spec.direction {
                            OrderDirection::Asc => ord,
                            OrderDirection::Desc => ord.reverse(),
                        }
                    })
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        Ok(matched)
    }
}

fn lookup<'r>(binding: &Binding<'r>, alias: &str) -> Option<Option<&'r Row>> {
    binding.iter().find(|(a, _)| *a == alias).map(|(_, r)| *r)
}

fn alias_is_bound(query: &Query, alias: &str) -> bool {
    alias == ROOT_ALIAS || query.joins().iter().any(|j| j.alias == alias)
}

static NULL: Value = Value::Null;

fn column_value<'r>(binding: &Binding<'r>, alias: &str, field: &str) -> &'r Value {
    lookup(binding, alias)
        .flatten()
        .and_then(|r| r.get(field))
        .unwrap_or(&NULL)
}

impl QueryExecutor for MemoryStore {
    fn execute(&self, query: &Query) -> Result<Vec<Row>, StorageError> {
        let tables = self.tables.read();
        let matched = Self::evaluate(&tables, query)?;

        let offset = usize::try_from(query.get_offset().unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = query
            .get_limit()
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        let rows: Vec<Row> = matched
            .iter()
            .skip(offset)
            .take(limit)
            .map(|binding| {
                if query.selected().is_empty() {
                    return binding[0].1.cloned().unwrap_or_default();
                }
                query
                    .selected()
                    .iter()
                    .map(|s| {
                        let value = column_value(binding, &s.column.alias, &s.column.field);
                        (s.label.clone(), value.clone())
                    })
                    .collect()
            })
            .collect();

        trace!(query = %query, rows = rows.len(), "executed query");
        Ok(rows)
    }

    fn count(&self, query: &Query) -> Result<u64, StorageError> {
        let tables = self.tables.read();
        let count = Self::evaluate(&tables, query)?.len() as u64;
        trace!(query = %query, count, "counted query");
        Ok(count)
    }
}
