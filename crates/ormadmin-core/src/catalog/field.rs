//! Field definitions for models.

use serde::{Deserialize, Serialize};

use super::types::{FieldKind, ScalarType};

/// A field definition within a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Column or reference.
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Label shown to operators; derived from the name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose_name: Option<String>,
}

impl FieldDef {
    /// Create a required scalar field.
    pub fn scalar(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Scalar {
                scalar,
                nullable: false,
            },
            verbose_name: None,
        }
    }

    /// Create a nullable scalar field.
    pub fn optional_scalar(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Scalar {
                scalar,
                nullable: true,
            },
            verbose_name: None,
        }
    }

    /// Create a non-nullable foreign key to `target`.
    pub fn foreign_key(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::ForeignKey {
                target: target.into(),
                nullable: false,
            },
            verbose_name: None,
        }
    }

    /// Create a nullable foreign key to `target`.
    pub fn nullable_foreign_key(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::ForeignKey {
                target: target.into(),
                nullable: true,
            },
            verbose_name: None,
        }
    }

    /// Set the operator-facing label.
    pub fn with_verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
        self.verbose_name = Some(verbose_name.into());
        self
    }

    /// Check if this field references another model.
    pub fn is_foreign_key(&self) -> bool {
        matches!(self.kind, FieldKind::ForeignKey { .. })
    }

    /// Referenced model if this is a foreign key.
    pub fn target(&self) -> Option<&str> {
        self.kind.target()
    }

    /// Check if this field may hold null.
    pub fn is_nullable(&self) -> bool {
        self.kind.is_nullable()
    }

    /// Label for display: the verbose name, or the field name with
    /// underscores turned into spaces and each word capitalised.
    pub fn display_name(&self) -> String {
        match &self.verbose_name {
            Some(v) => v.clone(),
            None => title_case(&self.name),
        }
    }
}

/// `created_at` -> `Created At`.
pub(crate) fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
