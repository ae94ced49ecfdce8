//! Join planner.
//!
//! Turns a batch of resolved field paths into the smallest set of joins that
//! reaches every terminal column. Joins are keyed by the path prefix they
//! materialise, so `author__username` and `author__email` share the single
//! join bound for `author`, while `author` and `editor` get one join each even
//! when both point at the same model.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::builder::{ColumnRef, JoinClause, Query, ROOT_ALIAS};
use crate::catalog::Schema;
use crate::error::Error;
use crate::path::FieldPath;

/// Identity of one join: the model reached and the prefix that reached it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JoinKey {
    /// Joined model.
    pub model: String,
    /// Path prefix (`order__customer`).
    pub prefix: String,
}

/// Deduplicated join sequence plus the column each planned path reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPlan {
    root: String,
    joins: Vec<JoinClause>,
    by_prefix: HashMap<String, usize>,
    columns: Vec<(String, ColumnRef)>,
}

impl JoinPlan {
    /// Create an empty plan rooted at `root`.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            joins: Vec::new(),
            by_prefix: HashMap::new(),
            columns: Vec::new(),
        }
    }

    /// Create a plan that continues from the joins already present on `query`.
    ///
    /// Paths added afterwards reuse those aliases instead of joining again.
    pub fn for_query(query: &Query) -> Self {
        let mut plan = Self::new(query.model());
        for join in query.joins() {
            plan.by_prefix.insert(join.prefix.clone(), plan.joins.len());
            plan.joins.push(join.clone());
        }
        plan
    }

    /// Root model of the plan.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Plan one path, emitting joins for prefixes not seen before, and return
    /// the column its terminal field is read from.
    pub fn add_path(&mut self, schema: &Schema, path: &FieldPath) -> Result<ColumnRef, Error> {
        if path.root() != self.root {
            return Err(Error::RootMismatch {
                path: path.raw().to_string(),
                expected: self.root.clone(),
                found: path.root().to_string(),
            });
        }

        let mut alias = ROOT_ALIAS.to_string();

        for hop in path.hops() {
            if let Some(&i) = self.by_prefix.get(&hop.prefix) {
                let existing = &self.joins[i];
                if existing.target_model != hop.target {
                    return Err(Error::AmbiguousJoin {
                        prefix: hop.prefix.clone(),
                        existing: existing.target_model.clone(),
                        requested: hop.target.clone(),
                    });
                }
                alias = existing.alias.clone();
                continue;
            }

            let target = schema.model(&hop.target)?;
            let clause = JoinClause {
                alias: self.next_alias(),
                prefix: hop.prefix.clone(),
                target_model: target.name.clone(),
                target_key: target.primary_key.clone(),
                from_alias: alias,
                via_field: hop.field.clone(),
            };
            debug!(
                prefix = %clause.prefix,
                alias = %clause.alias,
                model = %clause.target_model,
                "planned join"
            );
            alias = clause.alias.clone();
            self.by_prefix.insert(hop.prefix.clone(), self.joins.len());
            self.joins.push(clause);
        }

        let column = ColumnRef::new(alias, path.field_name());
        if !self.columns.iter().any(|(raw, _)| raw == path.raw()) {
            self.columns.push((path.raw().to_string(), column.clone()));
        }
        Ok(column)
    }

    fn next_alias(&self) -> String {
        let mut n = self.joins.len() + 1;
        loop {
            let candidate = format!("j{n}");
            if !self.joins.iter().any(|j| j.alias == candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Joins in emission order.
    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    /// Number of joins.
    pub fn len(&self) -> usize {
        self.joins.len()
    }

    /// Check if no join is needed.
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Join keys in emission order.
    pub fn keys(&self) -> impl Iterator<Item = JoinKey> + '_ {
        self.joins.iter().map(|j| JoinKey {
            model: j.target_model.clone(),
            prefix: j.prefix.clone(),
        })
    }

    /// Alias bound for a prefix; the empty prefix is the root.
    pub fn alias_for_prefix(&self, prefix: &str) -> Option<&str> {
        if prefix.is_empty() {
            return Some(ROOT_ALIAS);
        }
        self.by_prefix
            .get(prefix)
            .map(|&i| self.joins[i].alias.as_str())
    }

    /// Column a planned path reads, by its raw string.
    pub fn column_for(&self, raw_path: &str) -> Option<&ColumnRef> {
        self.columns
            .iter()
            .find(|(raw, _)| raw == raw_path)
            .map(|(_, c)| c)
    }

    /// Planned paths and their columns, in planning order.
    pub fn columns(&self) -> &[(String, ColumnRef)] {
        &self.columns
    }

    /// Model bound to an alias.
    pub fn model_for_alias(&self, alias: &str) -> Option<&str> {
        if alias == ROOT_ALIAS {
            return Some(&self.root);
        }
        self.joins
            .iter()
            .find(|j| j.alias == alias)
            .map(|j| j.target_model.as_str())
    }

    /// Alias to model lookup, root included.
    pub fn alias_models(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert(ROOT_ALIAS.to_string(), self.root.clone());
        for j in &self.joins {
            map.insert(j.alias.clone(), j.target_model.clone());
        }
        map
    }

    /// Attach the planned joins to `query`. Joins the query already has are kept once.
    pub fn apply(&self, query: Query) -> Query {
        self.joins
            .iter()
            .cloned()
            .fold(query, |q, join| q.join(join))
    }
}

/// Plan joins for a batch of paths sharing `root`.
pub fn plan_joins<'p>(
    schema: &Schema,
    root: &str,
    paths: impl IntoIterator<Item = &'p FieldPath>,
) -> Result<JoinPlan, Error> {
    schema.model(root)?;
    let mut plan = JoinPlan::new(root);
    for path in paths {
        plan.add_path(schema, path)?;
    }
    Ok(plan)
}
