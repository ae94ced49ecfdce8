//! Query builder handed to the executor.
//!
//! A `Query` is plain data: building one never touches storage. Every builder
//! method consumes the query and returns the extended one, so a base query can
//! be cloned and specialised per request.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::predicate::Predicate;

/// Alias of the root model in every query.
pub const ROOT_ALIAS: &str = "self";

/// Reference to a column of a joined model (or of the root, via [`ROOT_ALIAS`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Alias of the model instance.
    pub alias: String,
    /// Field name on that model.
    pub field: String,
}

impl ColumnRef {
    /// Column on an aliased model.
    pub fn new(alias: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            field: field.into(),
        }
    }

    /// Column on the root model.
    pub fn root(field: impl Into<String>) -> Self {
        Self::new(ROOT_ALIAS, field)
    }

    /// Check if this column lives on the root model.
    pub fn is_root(&self) -> bool {
        self.alias == ROOT_ALIAS
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.alias, self.field)
    }
}

/// Join from an already-bound alias to a new model instance.
///
/// Joins are left joins: a null or dangling reference yields a missing
/// model instance, whose columns read as null and never satisfy predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    /// Alias bound by this join.
    pub alias: String,
    /// Path prefix this join materialises (`order__customer`).
    pub prefix: String,
    /// Joined model.
    pub target_model: String,
    /// Primary key of the joined model.
    pub target_key: String,
    /// Alias holding the foreign key.
    pub from_alias: String,
    /// Foreign-key field on `from_alias`.
    pub via_field: String,
}

/// A projected column and the label it is returned under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectColumn {
    /// Column key in result rows.
    pub label: String,
    /// Source column.
    pub column: ColumnRef,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// One ordering term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    /// Column to sort by.
    pub column: ColumnRef,
    /// Sort direction.
    pub direction: OrderDirection,
}

/// A scan over one model with joins, predicates, projection, ordering and paging.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    model: String,
    joins: Vec<JoinClause>,
    predicates: Vec<Predicate>,
    select: Vec<SelectColumn>,
    order_by: Vec<OrderSpec>,
    offset: Option<u64>,
    limit: Option<u64>,
}

impl Query {
    /// Base scan over a model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            joins: Vec::new(),
            predicates: Vec::new(),
            select: Vec::new(),
            order_by: Vec::new(),
            offset: None,
            limit: None,
        }
    }

    /// Add a join. A clause for an already-joined alias is ignored.
    pub fn join(mut self, clause: JoinClause) -> Self {
        if !self.joins.iter().any(|j| j.alias == clause.alias) {
            self.joins.push(clause);
        }
        self
    }

    /// Add a predicate; predicates are combined with AND.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Replace the projection. An empty projection returns all root fields.
    pub fn select(mut self, columns: impl IntoIterator<Item = SelectColumn>) -> Self {
        self.select = columns.into_iter().collect();
        self
    }

    /// Replace the ordering with a single term.
    pub fn order_by(mut self, column: ColumnRef, direction: OrderDirection) -> Self {
        self.order_by = vec![OrderSpec { column, direction }];
        self
    }

    /// Append a secondary ordering term.
    pub fn then_order_by(mut self, column: ColumnRef, direction: OrderDirection) -> Self {
        self.order_by.push(OrderSpec { column, direction });
        self
    }

    /// Skip `count` rows.
    pub fn offset(mut self, count: u64) -> Self {
        self.offset = Some(count);
        self
    }

    /// Return at most `count` rows.
    pub fn limit(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self
    }

    /// Drop offset and limit, e.g. to count the full result set.
    pub fn unbounded(mut self) -> Self {
        self.offset = None;
        self.limit = None;
        self
    }

    /// Root model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Joins in application order.
    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    /// Predicates.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Projection; empty means all root fields.
    pub fn selected(&self) -> &[SelectColumn] {
        &self.select
    }

    /// Ordering terms.
    pub fn ordering(&self) -> &[OrderSpec] {
        &self.order_by
    }

    /// Offset, if any.
    pub fn get_offset(&self) -> Option<u64> {
        self.offset
    }

    /// Limit, if any.
    pub fn get_limit(&self) -> Option<u64> {
        self.limit
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.select.is_empty() {
            write!(f, "SELECT {ROOT_ALIAS}.*")?;
        } else {
            let cols: Vec<String> = self
                .select
                .iter()
                .map(|s| format!("{} AS \"{}\"", s.column, s.label))
                .collect();
            write!(f, "SELECT {}", cols.join(", "))?;
        }
        write!(f, " FROM {} {ROOT_ALIAS}", self.model)?;
        for j in &self.joins {
            write!(
                f,
                " LEFT JOIN {} {} ON {}.{} = {}.{}",
                j.target_model, j.alias, j.from_alias, j.via_field, j.alias, j.target_key
            )?;
        }
        if !self.predicates.is_empty() {
            let preds: Vec<String> = self.predicates.iter().map(|p| p.to_string()).collect();
            write!(f, " WHERE {}", preds.join(" AND "))?;
        }
        if !self.order_by.is_empty() {
            let terms: Vec<String> = self
                .order_by
                .iter()
                .map(|o| match o.direction {
                    OrderDirection::Asc => format!("{} ASC", o.column),
                    OrderDirection::Desc => format!("{} DESC", o.column),
                })
                .collect();
            write!(f, " ORDER BY {}", terms.join(", "))?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        if let Some(offset) = self.offset {
            write!(f, " OFFSET {offset}")?;
        }
        Ok(())
    }
}
