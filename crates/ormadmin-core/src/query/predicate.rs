//! Filter predicates and their evaluation against row values.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::builder::ColumnRef;
use crate::value::Value;

/// Comparison operator of a predicate.
///
/// Request keys name these with a lookup suffix (`title__icontains`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Substring match.
    Contains,
    /// Case-insensitive substring match.
    IContains,
    /// Prefix match.
    StartsWith,
    /// Membership in a list.
    In,
    /// Null check; the value is `Bool(true)` for IS NULL, `Bool(false)` for IS NOT NULL.
    IsNull,
}

impl Operator {
    /// Every operator, in lookup-suffix order.
    pub const ALL: [Operator; 11] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Lt,
        Operator::Lte,
        Operator::Gt,
        Operator::Gte,
        Operator::Contains,
        Operator::IContains,
        Operator::StartsWith,
        Operator::In,
        Operator::IsNull,
    ];

    /// Lookup suffix used in request keys.
    pub fn lookup(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Contains => "contains",
            Operator::IContains => "icontains",
            Operator::StartsWith => "startswith",
            Operator::In => "in",
            Operator::IsNull => "isnull",
        }
    }

    /// Parse a lookup suffix.
    pub fn from_lookup(lookup: &str) -> Option<Operator> {
        Self::ALL.into_iter().find(|op| op.lookup() == lookup)
    }

    /// Check if this operator only makes sense on string columns.
    pub fn is_text_match(&self) -> bool {
        matches!(
            self,
            Operator::Contains | Operator::IContains | Operator::StartsWith
        )
    }

    fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Contains => "LIKE",
            Operator::IContains => "ILIKE",
            Operator::StartsWith => "LIKE",
            Operator::In => "IN",
            Operator::IsNull => "IS",
        }
    }
}

/// A resolved column, an operator and a typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Column being tested.
    pub column: ColumnRef,
    /// Comparison operator.
    pub op: Operator,
    /// Right-hand side.
    pub value: Value,
}

impl Predicate {
    /// Create a predicate.
    pub fn new(column: ColumnRef, op: Operator, value: Value) -> Self {
        Self { column, op, value }
    }

    /// Shorthand for an equality predicate.
    pub fn eq(column: ColumnRef, value: impl Into<Value>) -> Self {
        Self::new(column, Operator::Eq, value.into())
    }

    /// Shorthand for a membership predicate.
    pub fn is_in(column: ColumnRef, values: Vec<Value>) -> Self {
        Self::new(column, Operator::In, Value::List(values))
    }

    /// Evaluate against the column's value; `None` means the joined model
    /// instance is missing.
    ///
    /// Missing instances and nulls only satisfy `IS NULL`.
    pub fn matches(&self, actual: Option<&Value>) -> bool {
        let actual = match actual {
            Some(v) if !v.is_null() => v,
            _ => {
                return self.op == Operator::IsNull && self.value.as_bool().unwrap_or(true);
            }
        };

        match self.op {
            Operator::Eq => actual.loose_eq(&self.value),
            Operator::Ne => !actual.loose_eq(&self.value),
            Operator::Lt => actual.compare(&self.value).is_some_and(|o| o.is_lt()),
            Operator::Lte => actual.compare(&self.value).is_some_and(|o| o.is_le()),
            Operator::Gt => actual.compare(&self.value).is_some_and(|o| o.is_gt()),
            Operator::Gte => actual.compare(&self.value).is_some_and(|o| o.is_ge()),
            Operator::Contains => text_pair(actual, &self.value).is_some_and(|(a, b)| a.contains(b)),
            Operator::IContains => text_pair(actual, &self.value)
                .is_some_and(|(a, b)| a.to_lowercase().contains(&b.to_lowercase())),
            Operator::StartsWith => {
                text_pair(actual, &self.value).is_some_and(|(a, b)| a.starts_with(b))
            }
            Operator::In => match &self.value {
                Value::List(items) => items.iter().any(|v| actual.loose_eq(v)),
                other => actual.loose_eq(other),
            },
            Operator::IsNull => !self.value.as_bool().unwrap_or(true),
        }
    }
}

fn text_pair<'a>(actual: &'a Value, pattern: &'a Value) -> Option<(&'a str, &'a str)> {
    Some((actual.as_str()?, pattern.as_str()?))
}

fn sql_literal(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        Value::List(items) => {
            let parts: Vec<String> = items.iter().map(sql_literal).collect();
            format!("({})", parts.join(", "))
        }
        other => other.to_string(),
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.op, &self.value) {
            (Operator::IsNull, v) if v.as_bool() == Some(false) => {
                write!(f, "{} IS NOT NULL", self.column)
            }
            (Operator::IsNull, _) => write!(f, "{} IS NULL", self.column),
            (Operator::Contains | Operator::IContains, Value::String(s)) => {
                write!(f, "{} {} '%{}%'", self.column, self.op.symbol(), s)
            }
            (Operator::StartsWith, Value::String(s)) => {
                write!(f, "{} {} '{}%'", self.column, self.op.symbol(), s)
            }
            (op, v) => write!(f, "{} {} {}", self.column, op.symbol(), sql_literal(v)),
        }
    }
}
