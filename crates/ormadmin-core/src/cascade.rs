//! Dependency collection for delete previews.
//!
//! Deleting a row cascades to every row that references it through a
//! non-nullable foreign key, and from those onward. The collector walks that
//! graph breadth-first, one layer of newly discovered rows at a time:
//!
//! ```text
//! Customer(1) --depth 1--> Order(7), Order(9) --depth 2--> Shipment(3)
//! ```
//!
//! Nullable references are never followed; such rows survive the delete with
//! the reference cleared.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, trace, warn};

use crate::catalog::Schema;
use crate::error::Error;
use crate::query::{ColumnRef, Predicate, Query, QueryExecutor};
use crate::value::{Row, Value};

/// Rows of one model found at one depth.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyGroup {
    /// Dependent model.
    pub model: String,
    /// Number of foreign-key hops from the candidate rows.
    pub depth: usize,
    /// Dependent rows, in discovery order.
    pub rows: Vec<Row>,
}

impl DependencyGroup {
    /// Number of rows in the group.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the group holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A referencing edge: `(model, fk field)` pointing at some other model.
type Referrer = (String, String);

/// Collects the rows a delete would cascade to.
pub struct DependencyCollector<'a, E: ?Sized> {
    schema: &'a Schema,
    executor: &'a E,
    referrers: HashMap<String, Vec<Referrer>>,
}

impl<'a, E: QueryExecutor + ?Sized> DependencyCollector<'a, E> {
    /// Create a collector over `schema`, querying through `executor`.
    pub fn new(schema: &'a Schema, executor: &'a E) -> Self {
        Self {
            schema,
            executor,
            referrers: HashMap::new(),
        }
    }

    /// Cascading edges into `model`, in schema declaration order.
    fn referrers(&mut self, model: &str) -> Vec<Referrer> {
        let schema = self.schema;
        self.referrers
            .entry(model.to_string())
            .or_insert_with(|| {
                schema
                    .dependency_edges_to(model)
                    .map(|e| (e.from_model.to_string(), e.from_field.to_string()))
                    .collect()
            })
            .clone()
    }

    /// Collect every row depending on the `candidates` of `model`.
    ///
    /// Groups are ordered by depth, then model name. The candidates themselves
    /// are never reported, and each dependent row appears once, at the
    /// shallowest depth it was reached.
    pub fn collect(
        &mut self,
        model: &str,
        candidates: &[Value],
    ) -> Result<Vec<DependencyGroup>, Error> {
        let schema = self.schema;
        let root = schema.model(model)?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut roots = Vec::new();
        for pk in candidates {
            if seen.insert((root.name.clone(), pk.identity_key())) {
                roots.push(pk.clone());
            }
        }

        let mut groups: BTreeMap<(usize, String), Vec<Row>> = BTreeMap::new();
        let mut frontier: Vec<(String, Vec<Value>)> = vec![(root.name.clone(), roots)];
        let mut depth = 0;

        while !frontier.is_empty() {
            depth += 1;
            let mut next: Vec<(String, Vec<Value>)> = Vec::new();

            for (target, keys) in &frontier {
                for (from_model, from_field) in self.referrers(target) {
                    let query = Query::new(from_model.as_str())
                        .filter(Predicate::is_in(ColumnRef::root(from_field.as_str()), keys.clone()));

                    if !self.executor.exists(&query)? {
                        trace!(model = %from_model, field = %from_field, "no referencing rows");
                        continue;
                    }

                    let pk_field = &schema.model(&from_model)?.primary_key;
                    for row in self.executor.execute(&query)? {
                        let pk = match row.get(pk_field) {
                            Some(pk) if !pk.is_null() => pk.clone(),
                            _ => {
                                // Keyless rows cannot be deduplicated or followed further.
                                warn!(
                                    model = %from_model,
                                    pk = %pk_field,
                                    "dependent row has no primary key"
                                );
                                groups
                                    .entry((depth, from_model.clone()))
                                    .or_default()
                                    .push(row);
                                continue;
                            }
                        };
                        if !seen.insert((from_model.clone(), pk.identity_key())) {
                            continue;
                        }

                        match next.iter_mut().find(|(m, _)| *m == from_model) {
                            Some((_, ids)) => ids.push(pk),
                            None => next.push((from_model.clone(), vec![pk])),
                        }
                        groups
                            .entry((depth, from_model.clone()))
                            .or_default()
                            .push(row);
                    }
                }
            }

            debug!(
                model,
                depth,
                discovered = next.iter().map(|(_, ids)| ids.len()).sum::<usize>(),
                "collected dependency layer"
            );
            frontier = next;
        }

        Ok(groups
            .into_iter()
            .map(|((depth, model), rows)| DependencyGroup { model, depth, rows })
            .collect())
    }
}

/// Collect the rows deleting `candidate_pks` of `model` would cascade to.
pub fn collect_dependents<E: QueryExecutor + ?Sized>(
    schema: &Schema,
    executor: &E,
    model: &str,
    candidate_pks: &[Value],
) -> Result<Vec<DependencyGroup>, Error> {
    DependencyCollector::new(schema, executor).collect(model, candidate_pks)
}
