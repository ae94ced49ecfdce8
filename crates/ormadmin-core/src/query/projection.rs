//! Column projection for exports.
//!
//! Unlike filters, a projection is all-or-nothing: every requested path must
//! resolve, since a silently missing export column would corrupt the output.

use std::collections::{BTreeMap, HashSet, VecDeque};

use super::builder::{ColumnRef, Query, SelectColumn};
use super::planner::JoinPlan;
use crate::catalog::{Schema, PATH_SEPARATOR};
use crate::error::Error;
use crate::path::{resolve_path, FieldPath};

/// One exported column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedColumn {
    /// Output label: the path exactly as requested.
    pub label: String,
    /// Resolved path.
    pub path: FieldPath,
    /// Column the value is read from.
    pub column: ColumnRef,
}

/// A resolved, join-planned column list.
#[derive(Debug, Clone)]
pub struct Projection {
    plan: JoinPlan,
    columns: Vec<ProjectedColumn>,
}

impl Projection {
    /// Resolve `fields` against `root` and plan their joins.
    pub fn build<S: AsRef<str>>(
        schema: &Schema,
        root: &str,
        fields: impl IntoIterator<Item = S>,
    ) -> Result<Self, Error> {
        schema.model(root)?;
        Self::plan_into(schema, root, JoinPlan::new(root), fields)
    }

    /// Like [`Projection::build`], but reusing the joins `query` already has.
    pub fn build_for<S: AsRef<str>>(
        schema: &Schema,
        query: &Query,
        fields: impl IntoIterator<Item = S>,
    ) -> Result<Self, Error> {
        schema.model(query.model())?;
        Self::plan_into(schema, query.model(), JoinPlan::for_query(query), fields)
    }

    fn plan_into<S: AsRef<str>>(
        schema: &Schema,
        root: &str,
        mut plan: JoinPlan,
        fields: impl IntoIterator<Item = S>,
    ) -> Result<Self, Error> {
        let mut columns = Vec::new();
        for field in fields {
            let path = resolve_path(schema, root, field.as_ref())?;
            let column = plan.add_path(schema, &path)?;
            columns.push(ProjectedColumn {
                label: path.raw().to_string(),
                path,
                column,
            });
        }
        Ok(Self { plan, columns })
    }

    /// Columns in request order.
    pub fn columns(&self) -> &[ProjectedColumn] {
        &self.columns
    }

    /// Output labels in request order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.label.as_str())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if nothing is projected.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns grouped by the model owning them, models in first-appearance order.
    pub fn columns_by_model(&self) -> Vec<(&str, Vec<&ProjectedColumn>)> {
        let mut groups: Vec<(&str, Vec<&ProjectedColumn>)> = Vec::new();
        for col in &self.columns {
            let model = col.path.terminal_model();
            match groups.iter_mut().find(|(m, _)| *m == model) {
                Some((_, cols)) => cols.push(col),
                None => groups.push((model, vec![col])),
            }
        }
        groups
    }

    /// Alias to model lookup for the planned joins.
    pub fn alias_models(&self) -> BTreeMap<String, String> {
        self.plan.alias_models()
    }

    /// The join plan behind the projection.
    pub fn plan(&self) -> &JoinPlan {
        &self.plan
    }

    /// Attach joins and the select list to `query`.
    pub fn apply(&self, query: Query) -> Query {
        let select = self.columns.iter().map(|c| SelectColumn {
            label: c.label.clone(),
            column: c.column.clone(),
        });
        self.plan.apply(query).select(select)
    }
}

/// A model reachable from the export root, with the paths of its plain fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedModel {
    /// Model name.
    pub model: String,
    /// Prefix it is reached through; empty for the root.
    pub prefix: String,
    /// Full paths of its non-relation fields.
    pub fields: Vec<String>,
}

/// Walk the foreign-key graph from `root` and list every exportable field.
///
/// Foreign keys are followed rather than listed, and each one is followed at
/// most once, so cyclic schemas terminate.
pub fn related_fields(schema: &Schema, root: &str) -> Result<Vec<RelatedModel>, Error> {
    let mut out = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut queue = VecDeque::from([(schema.model(root)?, String::new())]);

    while let Some((model, prefix)) = queue.pop_front() {
        let join = |name: &str| {
            if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}{PATH_SEPARATOR}{name}")
            }
        };

        let mut fields = Vec::new();
        for field in &model.fields {
            match field.target() {
                Some(target) => {
                    if seen.insert((model.name.clone(), field.name.clone())) {
                        queue.push_back((schema.model(target)?, join(&field.name)));
                    }
                }
                None => fields.push(join(&field.name)),
            }
        }

        out.push(RelatedModel {
            model: model.name.clone(),
            prefix,
            fields,
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldDef, ModelDef, ScalarType};

    fn schema() -> Schema {
        let user = ModelDef::new("User", "id")
            .with_field(FieldDef::scalar("id", ScalarType::Int))
            .with_field(FieldDef::scalar("username", ScalarType::String))
            .with_field(FieldDef::nullable_foreign_key("team", "Team"));
        let team = ModelDef::new("Team", "id")
            .with_field(FieldDef::scalar("id", ScalarType::Int))
            .with_field(FieldDef::scalar("name", ScalarType::String))
            .with_field(FieldDef::nullable_foreign_key("lead", "User"));
        let post = ModelDef::new("Post", "id")
            .with_field(FieldDef::scalar("id", ScalarType::Int))
            .with_field(FieldDef::scalar("title", ScalarType::String))
            .with_field(FieldDef::foreign_key("author", "User"));
        Schema::new(vec![user, team, post]).unwrap()
    }

    #[test]
    fn test_columns_keep_request_order() {
        let schema = schema();
        let p = Projection::build(&schema, "Post", ["author__username", "title", "author__team__name"])
            .unwrap();

        let labels: Vec<&str> = p.labels().collect();
        assert_eq!(labels, vec!["author__username", "title", "author__team__name"]);
        assert_eq!(p.plan().len(), 2);

        let groups: Vec<&str> = p.columns_by_model().iter().map(|(m, _)| *m).collect();
        assert_eq!(groups, vec!["User", "Post", "Team"]);
    }

    #[test]
    fn test_unresolvable_path_fails_with_path() {
        let schema = schema();
        let err = Projection::build(&schema, "Post", ["title", "author__nope"]).unwrap_err();
        match err {
            Error::UnresolvedPath { path, segment, .. } => {
                assert_eq!(path, "author__nope");
                assert_eq!(segment, "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_apply_sets_select_and_joins() {
        let schema = schema();
        let p = Projection::build(&schema, "Post", ["id", "author__username"]).unwrap();
        let q = p.apply(Query::new("Post"));

        assert_eq!(q.joins().len(), 1);
        assert_eq!(q.selected().len(), 2);
        assert_eq!(q.selected()[1].label, "author__username");
        assert_eq!(q.selected()[1].column, ColumnRef::new("j1", "username"));
    }

    #[test]
    fn test_related_fields_walks_each_edge_once() {
        let schema = schema();
        let related = related_fields(&schema, "Post").unwrap();

        let prefixes: Vec<&str> = related.iter().map(|r| r.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["", "author", "author__team", "author__team__lead"]);
        assert_eq!(related[1].fields, vec!["author__id", "author__username"]);
        assert_eq!(related[3].model, "User");
    }
}
