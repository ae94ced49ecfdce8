//! Model definitions.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::field::{title_case, FieldDef};
use super::types::ScalarType;
use super::PATH_SEPARATOR;
use crate::error::Error;

/// A model definition (table schema).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDef {
    /// Model name (unique within the schema).
    pub name: String,
    /// Name of the primary key field.
    pub primary_key: String,
    /// Field definitions in declaration order.
    pub fields: Vec<FieldDef>,
    /// Label shown to operators; the model name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose_name: Option<String>,
}

impl ModelDef {
    /// Create a model with no fields yet.
    pub fn new(name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: primary_key.into(),
            fields: Vec::new(),
            verbose_name: None,
        }
    }

    /// Add a field to the model.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add multiple fields.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Set the operator-facing label.
    pub fn with_verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
        self.verbose_name = Some(verbose_name.into());
        self
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Get the primary key field definition.
    pub fn primary_key_field(&self) -> Option<&FieldDef> {
        self.get_field(&self.primary_key)
    }

    /// Scalar type of the primary key, used to parse raw identifiers.
    pub fn primary_key_type(&self) -> Option<ScalarType> {
        self.primary_key_field().and_then(|f| f.kind.scalar_type())
    }

    /// Foreign-key fields in declaration order.
    pub fn foreign_keys(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.is_foreign_key())
    }

    /// Label for display.
    pub fn display_name(&self) -> String {
        match &self.verbose_name {
            Some(v) => v.clone(),
            None => self.name.clone(),
        }
    }

    /// Label for a column, which may be a plain field name or not a field at all.
    pub fn column_label(&self, column: &str) -> String {
        match self.get_field(column) {
            Some(field) => field.display_name(),
            None => title_case(column),
        }
    }

    /// Check the model's own invariants.
    ///
    /// Field names must be non-empty, unique, and free of the path separator.
    /// The primary key must name exactly one field.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.is_empty() {
            return Err(Error::InvalidSchema("model with empty name".into()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(Error::InvalidSchema(format!(
                    "model `{}` has a field with an empty name",
                    self.name
                )));
            }
            if field.name.contains(PATH_SEPARATOR) {
                return Err(Error::InvalidSchema(format!(
                    "field `{}.{}` contains the path separator `{}`",
                    self.name, field.name, PATH_SEPARATOR
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate field `{}` on model `{}`",
                    field.name, self.name
                )));
            }
        }

        if self.primary_key_field().is_none() {
            return Err(Error::InvalidSchema(format!(
                "primary key `{}` is not a field of `{}`",
                self.primary_key, self.name
            )));
        }

        Ok(())
    }
}
