//! Admin operations for one model.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::options::AdminOptions;
use super::slugify;
use crate::cascade::{DependencyCollector, DependencyGroup};
use crate::catalog::{ModelDef, ScalarType, Schema};
use crate::error::Error;
use crate::path::resolve_path;
use crate::query::{
    paginate, ActiveFilters, ColumnRef, FilterSet, Operator, OrderDirection, Predicate,
    Projection, Query, QueryExecutor,
};
use crate::value::{Row, Value};

/// Parameters of a list request.
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    /// Requested page, 1-indexed.
    pub page: u64,
    /// Column to sort by; a leading `-` sorts descending.
    pub ordering: Option<String>,
    /// Raw filter pairs.
    pub filters: Vec<(String, String)>,
}

/// One page of a model list.
#[derive(Debug, Clone, Serialize)]
pub struct ListPage {
    /// Columns shown.
    pub columns: Vec<String>,
    /// Rows of the page.
    pub rows: Vec<Row>,
    /// Current page.
    pub page: u64,
    /// Total number of pages.
    pub pages: u64,
    /// Total number of matching rows.
    pub total: u64,
    /// Filters that were applied.
    pub active_filters: ActiveFilters,
}

/// Parameters of an export request.
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    /// Paths to export, in output order.
    pub fields: Vec<String>,
    /// Restrict the export to these primary keys (raw strings).
    pub ids: Vec<String>,
    /// Column to sort by; a leading `-` sorts descending.
    pub ordering: Option<String>,
    /// Raw filter pairs.
    pub filters: Vec<(String, String)>,
}

/// Result of an export: the projection and the projected rows.
#[derive(Debug, Clone)]
pub struct Export {
    /// Exported columns.
    pub projection: Projection,
    /// Rows keyed by requested path.
    pub rows: Vec<Row>,
}

/// What deleting one row would take with it.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletePreview {
    /// Primary key of the candidate row.
    pub pk: Value,
    /// The candidate row.
    pub row: Row,
    /// Dependent rows; empty when collection is disabled.
    pub dependencies: Vec<DependencyGroup>,
}

/// One lookup candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupItem {
    /// Primary key of the referenced row.
    pub id: Value,
    /// Text shown for it.
    pub repr: String,
}

/// A page of foreign-key lookup candidates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupPage {
    /// Previous page number, 0 if none.
    pub prev_page: u64,
    /// Next page number, 0 if none.
    pub next_page: u64,
    /// Candidates on this page.
    pub object_list: Vec<LookupItem>,
}

/// Admin view over one model.
#[derive(Debug, Clone)]
pub struct ModelAdmin {
    schema: Arc<Schema>,
    model: ModelDef,
    options: AdminOptions,
}

impl ModelAdmin {
    /// Create an admin for `model`, which must exist in `schema`.
    pub fn new(schema: Arc<Schema>, model: &str, options: AdminOptions) -> Result<Self, Error> {
        let model = schema.model(model)?.clone();
        Ok(Self {
            schema,
            model,
            options,
        })
    }

    /// The administered model.
    pub fn model(&self) -> &ModelDef {
        &self.model
    }

    /// The schema the admin works against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Admin options.
    pub fn options(&self) -> &AdminOptions {
        &self.options
    }

    /// URL-safe admin name.
    pub fn admin_name(&self) -> String {
        slugify(&self.model.name)
    }

    /// Name shown to operators.
    pub fn display_name(&self) -> String {
        self.model.display_name()
    }

    /// Menu group.
    pub fn group(&self) -> &str {
        &self.options.group
    }

    /// Columns shown in lists.
    pub fn columns(&self) -> Vec<String> {
        match &self.options.columns {
            Some(columns) => columns.clone(),
            None => self.model.field_names().map(str::to_string).collect(),
        }
    }

    /// Label for a column header.
    pub fn column_label(&self, column: &str) -> String {
        self.model.column_label(column)
    }

    /// Check if a column can be sorted on. Only fields of the model itself can.
    pub fn column_is_sortable(&self, column: &str) -> bool {
        self.model.get_field(column).is_some()
    }

    /// Unfiltered scan over the model.
    pub fn base_query(&self) -> Query {
        Query::new(self.model.name.as_str())
    }

    /// Apply an ordering like `name` or `-name`. Unsortable columns leave the query unchanged.
    pub fn apply_ordering(&self, query: Query, ordering: &str) -> Query {
        if ordering.is_empty() {
            return query;
        }
        let (direction, column) = match ordering.strip_prefix('-') {
            Some(column) => (OrderDirection::Desc, column.trim_start_matches('-')),
            None => (OrderDirection::Asc, ordering),
        };
        if !self.column_is_sortable(column) {
            debug!(model = %self.model.name, column, "ignoring unsortable ordering");
            return query;
        }
        query.order_by(ColumnRef::root(column), direction)
    }

    fn filtered_query(
        &self,
        ordering: Option<&str>,
        filters: &[(String, String)],
    ) -> Result<(Query, ActiveFilters), Error> {
        let query = self.apply_ordering(self.base_query(), ordering.unwrap_or_default());
        let filters = FilterSet::from_request(
            &self.schema,
            &query,
            filters.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            &self.options.filter_options(),
        )?;
        Ok(filters.apply(query))
    }

    fn parse_ids(&self, ids: &[String]) -> Result<Vec<Value>, Error> {
        let pk_type = self.model.primary_key_type().unwrap_or(ScalarType::String);
        ids.iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                pk_type.parse(s).ok_or_else(|| Error::InvalidValue {
                    field: self.model.primary_key.clone(),
                    value: s.to_string(),
                    expected: pk_type.name().to_string(),
                })
            })
            .collect()
    }

    /// One page of the model list, ordered and filtered.
    pub fn list<E: QueryExecutor + ?Sized>(
        &self,
        executor: &E,
        request: &ListRequest,
    ) -> Result<ListPage, Error> {
        let (query, active_filters) =
            self.filtered_query(request.ordering.as_deref(), &request.filters)?;
        let pq = paginate(query, executor, self.options.paginate_by).with_page(request.page);

        Ok(ListPage {
            columns: self.columns(),
            rows: pq.get_list()?,
            page: pq.get_page(),
            pages: pq.get_pages()?,
            total: pq.count()?,
            active_filters,
        })
    }

    /// Export the requested paths of every matching row.
    ///
    /// Every path must resolve; the error names the first one that does not.
    pub fn export<E: QueryExecutor + ?Sized>(
        &self,
        executor: &E,
        request: &ExportRequest,
    ) -> Result<Export, Error> {
        let (mut query, _) = self.filtered_query(request.ordering.as_deref(), &request.filters)?;

        let ids = self.parse_ids(&request.ids)?;
        if !ids.is_empty() {
            query = query.filter(Predicate::is_in(
                ColumnRef::root(self.model.primary_key.as_str()),
                ids,
            ));
        }

        let projection = Projection::build_for(&self.schema, &query, &request.fields)?;
        let rows = executor.execute(&projection.apply(query))?;
        info!(model = %self.model.name, columns = projection.len(), rows = rows.len(), "exported rows");

        Ok(Export { projection, rows })
    }

    /// Preview what deleting the rows with `ids` would cascade to.
    ///
    /// Ids that match no row are skipped.
    pub fn delete_preview<E: QueryExecutor + ?Sized>(
        &self,
        executor: &E,
        ids: &[String],
    ) -> Result<Vec<DeletePreview>, Error> {
        let ids = self.parse_ids(ids)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let pk_field = self.model.primary_key.as_str();
        let query = self
            .base_query()
            .filter(Predicate::is_in(ColumnRef::root(pk_field), ids));

        let mut collector = DependencyCollector::new(&self.schema, executor);
        let mut previews = Vec::new();
        for row in executor.execute(&query)? {
            let pk = row.get(pk_field).cloned().unwrap_or(Value::Null);
            let dependencies = if self.options.delete_collect_objects {
                collector.collect(&self.model.name, std::slice::from_ref(&pk))?
            } else {
                Vec::new()
            };
            previews.push(DeletePreview {
                pk,
                row,
                dependencies,
            });
        }
        Ok(previews)
    }

    /// Search candidates for the foreign key `field`.
    ///
    /// Candidates are rows of the referenced model ordered by the configured
    /// search field (the referenced primary key when none is configured) and
    /// matched against `term`: case-insensitive substring for text fields,
    /// equality otherwise. A field that is not a foreign key yields an empty
    /// page; a configured search field must be a direct field of the
    /// referenced model.
    pub fn lookup<E: QueryExecutor + ?Sized>(
        &self,
        executor: &E,
        field: &str,
        term: Option<&str>,
        page: u64,
    ) -> Result<LookupPage, Error> {
        let empty = LookupPage {
            prev_page: 0,
            next_page: 0,
            object_list: Vec::new(),
        };

        let target = match resolve_path(&self.schema, &self.model.name, field) {
            Ok(path) => match path.terminal().target() {
                Some(target) => self.schema.model(target)?,
                None => return Ok(empty),
            },
            Err(e) if e.is_unresolved_path() => return Ok(empty),
            Err(e) => return Err(e),
        };

        let search = self
            .options
            .foreign_key_lookups
            .get(field)
            .map_or(target.primary_key.as_str(), String::as_str);
        let search_path = resolve_path(&self.schema, &target.name, search)?;
        if !search_path.is_local() {
            return Err(Error::InvalidValue {
                field: format!("foreign_key_lookups.{field}"),
                value: search.to_string(),
                expected: format!("a field of `{}`", target.name),
            });
        }
        let search_type = search_path
            .scalar_type(&self.schema)
            .unwrap_or(ScalarType::String);

        let mut query = Query::new(target.name.as_str())
            .order_by(ColumnRef::root(search), OrderDirection::Asc);
        if let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) {
            let predicate = if search_type.is_string_like() {
                Predicate::new(ColumnRef::root(search), Operator::IContains, Value::from(term))
            } else {
                match search_type.parse(term) {
                    Some(value) => Predicate::eq(ColumnRef::root(search), value),
                    None => {
                        debug!(field, search, term, "lookup term does not parse for search field");
                        return Ok(empty);
                    }
                }
            };
            query = query.filter(predicate);
        }

        let pq = paginate(query, executor, self.options.filter_paginate_by).with_page(page);
        let object_list = pq
            .get_list()?
            .into_iter()
            .map(|row| LookupItem {
                id: row.get(&target.primary_key).cloned().unwrap_or(Value::Null),
                repr: row.get(search).map(Value::to_string).unwrap_or_default(),
            })
            .collect();

        Ok(LookupPage {
            prev_page: pq.previous_page().unwrap_or(0),
            next_page: pq.next_page()?.unwrap_or(0),
            object_list,
        })
    }
}
