//! Request filters.
//!
//! A filter key is a field path, optionally followed by a lookup suffix:
//! `author__username`, `title__icontains`, `published__isnull`. Keys that do
//! not resolve, blank values and values that do not parse as the terminal
//! field's type are dropped with a log line. Only schema faults (an ambiguous
//! join) are reported as errors.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::builder::Query;
use super::planner::JoinPlan;
use super::predicate::{Operator, Predicate};
use crate::catalog::{ScalarType, Schema, PATH_SEPARATOR};
use crate::error::Error;
use crate::path::{resolve_path, FieldPath};
use crate::value::Value;

/// Filters that were actually applied, keyed by the request key.
pub type ActiveFilters = BTreeMap<String, String>;

/// Which filter paths a request may use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// If non-empty, only these paths may be filtered on.
    pub allowed: Vec<String>,
    /// Paths that may never be filtered on.
    pub excluded: Vec<String>,
}

impl FilterOptions {
    /// Options permitting every path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict filtering to the given paths.
    pub fn with_allowed(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allowed = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Forbid filtering on the given paths.
    pub fn with_excluded(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.excluded = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Check if `path` (without lookup suffix) may be filtered on.
    pub fn permits(&self, path: &str) -> bool {
        if self.excluded.iter().any(|p| p == path) {
            return false;
        }
        self.allowed.is_empty() || self.allowed.iter().any(|p| p == path)
    }
}

/// Split a request key into a resolved path and its operator.
///
/// The whole key is tried as a path first, so a field that happens to be
/// named like a lookup still resolves. Returns the resolution error of the
/// whole key when neither form resolves.
pub fn parse_filter_key(
    schema: &Schema,
    root: &str,
    key: &str,
) -> Result<(FieldPath, Operator), Error> {
    let whole = match resolve_path(schema, root, key) {
        Ok(path) => return Ok((path, Operator::Eq)),
        Err(e) => e,
    };

    if let Some((rest, suffix)) = key.rsplit_once(PATH_SEPARATOR) {
        if let Some(op) = Operator::from_lookup(suffix) {
            if let Ok(path) = resolve_path(schema, root, rest) {
                return Ok((path, op));
            }
        }
    }

    Err(whole)
}

/// Parse a raw request value for `op` against the terminal type.
pub fn parse_filter_value(scalar: ScalarType, op: Operator, raw: &str) -> Option<Value> {
    match op {
        Operator::IsNull => ScalarType::Bool.parse(raw),
        Operator::In => {
            let items: Option<Vec<Value>> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| scalar.parse(s))
                .collect();
            items.filter(|v| !v.is_empty()).map(Value::List)
        }
        op if op.is_text_match() => {
            if scalar.is_string_like() {
                Some(Value::String(raw.to_string()))
            } else {
                None
            }
        }
        _ => scalar.parse(raw),
    }
}

/// Predicates and joins built from one filter request.
#[derive(Debug, Clone)]
pub struct FilterSet {
    plan: JoinPlan,
    predicates: Vec<Predicate>,
    active: ActiveFilters,
}

impl FilterSet {
    /// Build filters for `query` from raw request pairs.
    ///
    /// Joins already on `query` are reused, so filters and a later projection
    /// share aliases.
    pub fn from_request<K, V>(
        schema: &Schema,
        query: &Query,
        values: impl IntoIterator<Item = (K, V)>,
        options: &FilterOptions,
    ) -> Result<Self, Error>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let root = query.model();
        schema.model(root)?;

        let mut plan = JoinPlan::for_query(query);
        let mut predicates = Vec::new();
        let mut active = ActiveFilters::new();

        for (key, raw) in values {
            let (key, raw) = (key.as_ref(), raw.as_ref().trim());
            if raw.is_empty() {
                debug!(key, "skipping blank filter");
                continue;
            }

            let (path, op) = match parse_filter_key(schema, root, key) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(key, error = %e, "dropping unresolvable filter");
                    continue;
                }
            };

            if !options.permits(path.raw()) {
                debug!(key, "filter not permitted by admin options");
                continue;
            }

            let value = path.scalar_type(schema).and_then(|t| parse_filter_value(t, op, raw));
            let Some(value) = value else {
                warn!(key, value = raw, op = op.lookup(), "dropping unparsable filter value");
                continue;
            };

            let column = plan.add_path(schema, &path)?;
            debug!(key, column = %column, op = op.lookup(), "applying filter");
            predicates.push(Predicate::new(column, op, value));
            active.insert(key.to_string(), raw.to_string());
        }

        Ok(Self {
            plan,
            predicates,
            active,
        })
    }

    /// Filters that survived validation.
    pub fn active(&self) -> &ActiveFilters {
        &self.active
    }

    /// Built predicates.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Join plan covering the filtered paths.
    pub fn plan(&self) -> &JoinPlan {
        &self.plan
    }

    /// Check if no filter survived.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Attach joins and predicates to `query`.
    pub fn apply(self, query: Query) -> (Query, ActiveFilters) {
        let query = self.plan.apply(query);
        let query = self
            .predicates
            .into_iter()
            .fold(query, |q, p| q.filter(p));
        (query, self.active)
    }
}

/// Apply request filters to `query` with no admin restrictions.
pub fn apply_filters<K, V>(
    query: Query,
    schema: &Schema,
    root: &str,
    filter_values: impl IntoIterator<Item = (K, V)>,
) -> Result<(Query, ActiveFilters), Error>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    apply_filters_with(query, schema, root, filter_values, &FilterOptions::default())
}

/// Apply request filters to `query`, honouring admin allow/deny lists.
pub fn apply_filters_with<K, V>(
    query: Query,
    schema: &Schema,
    root: &str,
    filter_values: impl IntoIterator<Item = (K, V)>,
    options: &FilterOptions,
) -> Result<(Query, ActiveFilters), Error>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if query.model() != root {
        return Err(Error::RootMismatch {
            path: String::new(),
            expected: query.model().to_string(),
            found: root.to_string(),
        });
    }
    let filters = FilterSet::from_request(schema, &query, filter_values, options)?;
    Ok(filters.apply(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldDef, ModelDef};
    use crate::query::ColumnRef;

    fn schema() -> Schema {
        let user = ModelDef::new("User", "id")
            .with_field(FieldDef::scalar("id", ScalarType::Int))
            .with_field(FieldDef::scalar("username", ScalarType::String))
            .with_field(FieldDef::scalar("active", ScalarType::Bool));
        let post = ModelDef::new("Post", "id")
            .with_field(FieldDef::scalar("id", ScalarType::Int))
            .with_field(FieldDef::scalar("title", ScalarType::String))
            .with_field(FieldDef::scalar("score", ScalarType::Float))
            .with_field(FieldDef::scalar("in", ScalarType::String))
            .with_field(FieldDef::foreign_key("author", "User"));
        Schema::new(vec![user, post]).unwrap()
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        let schema = schema();
        let (query, active) = apply_filters(
            Query::new("Post"),
            &schema,
            "Post",
            [("nonexistent_field", "x"), ("title", "y")],
        )
        .unwrap();

        assert_eq!(active.len(), 1);
        assert_eq!(active.get("title").map(String::as_str), Some("y"));
        assert_eq!(query.predicates().len(), 1);
    }

    #[test]
    fn test_lookup_suffixes() {
        let schema = schema();
        let (path, op) = parse_filter_key(&schema, "Post", "title__icontains").unwrap();
        assert_eq!(path.raw(), "title");
        assert_eq!(op, Operator::IContains);

        let (path, op) = parse_filter_key(&schema, "Post", "author__username__startswith").unwrap();
        assert_eq!(path.raw(), "author__username");
        assert_eq!(op, Operator::StartsWith);

        let (path, op) = parse_filter_key(&schema, "Post", "in").unwrap();
        assert_eq!(path.raw(), "in");
        assert_eq!(op, Operator::Eq);

        assert!(parse_filter_key(&schema, "Post", "title__regex").is_err());
    }

    #[test]
    fn test_values_are_typed() {
        let schema = schema();
        let (query, _) = apply_filters(
            Query::new("Post"),
            &schema,
            "Post",
            [("score__gte", "2.5"), ("author", "7"), ("id__in", "1, 2,3")],
        )
        .unwrap();

        let values: Vec<&Value> = query.predicates().iter().map(|p| &p.value).collect();
        assert_eq!(values[0], &Value::Float(2.5));
        assert_eq!(values[1], &Value::Int(7));
        assert_eq!(
            values[2],
            &Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn test_unparsable_and_blank_values_dropped() {
        let schema = schema();
        let (query, active) = apply_filters(
            Query::new("Post"),
            &schema,
            "Post",
            [
                ("id", "abc"),
                ("title", "   "),
                ("score__contains", "1"),
                ("id__in", "1,x"),
                ("author__active", "maybe"),
            ],
        )
        .unwrap();

        assert!(active.is_empty());
        assert!(query.predicates().is_empty());
        assert!(query.joins().is_empty());
    }

    #[test]
    fn test_related_filter_adds_join() {
        let schema = schema();
        let (query, active) = apply_filters(
            Query::new("Post"),
            &schema,
            "Post",
            [("author__username", "ann"), ("author__active", "yes")],
        )
        .unwrap();

        assert_eq!(active.len(), 2);
        assert_eq!(query.joins().len(), 1);
        assert_eq!(query.predicates()[0].column, ColumnRef::new("j1", "username"));
        assert_eq!(query.predicates()[1].value, Value::Bool(true));
    }

    #[test]
    fn test_isnull_lookup() {
        let schema = schema();
        let (query, _) = apply_filters(
            Query::new("Post"),
            &schema,
            "Post",
            [("title__isnull", "false")],
        )
        .unwrap();

        let p = &query.predicates()[0];
        assert_eq!(p.op, Operator::IsNull);
        assert_eq!(p.value, Value::Bool(false));
    }

    #[test]
    fn test_options_restrict_paths() {
        let schema = schema();
        let options = FilterOptions::new()
            .with_allowed(["title", "author__username"])
            .with_excluded(["author__username"]);

        let (_, active) = apply_filters_with(
            Query::new("Post"),
            &schema,
            "Post",
            [("title__contains", "a"), ("author__username", "b"), ("score", "1")],
            &options,
        )
        .unwrap();

        assert_eq!(active.keys().collect::<Vec<_>>(), vec!["title__contains"]);
    }

    #[test]
    fn test_unknown_root_is_an_error() {
        let schema = schema();
        let empty: [(&str, &str); 0] = [];
        assert!(matches!(
            apply_filters(Query::new("Nope"), &schema, "Nope", empty),
            Err(Error::UnknownModel(_))
        ));
    }
}
