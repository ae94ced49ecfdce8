//! Per-model admin options.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::query::FilterOptions;

/// Menu group used when none is configured.
pub const DEFAULT_GROUP: &str = "default";

/// How one model is presented and operated on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminOptions {
    /// Rows per list page.
    pub paginate_by: u64,

    /// Rows per foreign-key lookup page.
    pub filter_paginate_by: u64,

    /// Columns shown in lists. None shows every field of the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,

    /// Paths that may be filtered on. None allows every path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_fields: Option<Vec<String>>,

    /// Paths that may never be filtered on (`user__password`).
    pub filter_exclude: Vec<String>,

    /// Foreign-key field -> field of the referenced model to search lookups by.
    pub foreign_key_lookups: BTreeMap<String, String>,

    /// Whether delete previews collect dependent rows.
    pub delete_collect_objects: bool,

    /// Menu group the model is listed under.
    pub group: String,
}

impl Default for AdminOptions {
    fn default() -> Self {
        Self {
            paginate_by: 20,
            filter_paginate_by: 15,
            columns: None,
            filter_fields: None,
            filter_exclude: Vec::new(),
            foreign_key_lookups: BTreeMap::new(),
            delete_collect_objects: true,
            group: DEFAULT_GROUP.to_string(),
        }
    }
}

impl AdminOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the list page size.
    pub fn paginate_by(mut self, rows: u64) -> Self {
        self.paginate_by = rows;
        self
    }

    /// Set the lookup page size.
    pub fn filter_paginate_by(mut self, rows: u64) -> Self {
        self.filter_paginate_by = rows;
        self
    }

    /// Set the list columns.
    pub fn columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Restrict filters to these paths.
    pub fn filter_fields(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.filter_fields = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    /// Forbid filters on these paths.
    pub fn filter_exclude(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.filter_exclude = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Search lookups for `fk_field` by `search_field` on the referenced model.
    pub fn foreign_key_lookup(
        mut self,
        fk_field: impl Into<String>,
        search_field: impl Into<String>,
    ) -> Self {
        self.foreign_key_lookups
            .insert(fk_field.into(), search_field.into());
        self
    }

    /// Set whether delete previews collect dependents.
    pub fn delete_collect_objects(mut self, collect: bool) -> Self {
        self.delete_collect_objects = collect;
        self
    }

    /// Set the menu group.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Filter restrictions derived from these options.
    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            allowed: self.filter_fields.clone().unwrap_or_default(),
            excluded: self.filter_exclude.clone(),
        }
    }
}
