//! Field path resolution.
//!
//! A field path such as `order__customer__email` names a column reachable from
//! a root model by following foreign keys. Every segment but the last must be a
//! foreign key on the model reached so far; the last segment may be any field,
//! including a foreign key used as a plain column.

use std::fmt;

use tracing::trace;

use crate::catalog::{FieldDef, FieldKind, ScalarType, Schema, PATH_SEPARATOR};
use crate::error::{Error, UnresolvedReason};

/// One traversed foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    /// Model the foreign key lives on.
    pub model: String,
    /// Foreign-key field name.
    pub field: String,
    /// Model the foreign key points at.
    pub target: String,
    /// Accumulated path up to and including this hop (`order__customer`).
    pub prefix: String,
}

/// A resolved field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    root: String,
    hops: Vec<Hop>,
    terminal_model: String,
    terminal: FieldDef,
}

impl FieldPath {
    /// The path exactly as requested.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Model the path starts from.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Foreign keys crossed before the terminal field, in order.
    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    /// Model owning the terminal field.
    pub fn terminal_model(&self) -> &str {
        &self.terminal_model
    }

    /// The terminal field definition.
    pub fn terminal(&self) -> &FieldDef {
        &self.terminal
    }

    /// Name of the terminal field.
    pub fn field_name(&self) -> &str {
        &self.terminal.name
    }

    /// Prefix of the model owning the terminal field; empty for root fields.
    pub fn prefix(&self) -> &str {
        self.hops.last().map(|h| h.prefix.as_str()).unwrap_or("")
    }

    /// Check if the path names a field on the root model (no joins needed).
    pub fn is_local(&self) -> bool {
        self.hops.is_empty()
    }

    /// Scalar type of the terminal column; a foreign key takes its target's key type.
    pub fn scalar_type(&self, schema: &Schema) -> Option<ScalarType> {
        match &self.terminal.kind {
            FieldKind::Scalar { scalar, .. } => Some(*scalar),
            FieldKind::ForeignKey { target, .. } => schema.get_model(target)?.primary_key_type(),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.root, self.raw)
    }
}

/// Resolve `path` against `root`.
///
/// Fails with [`Error::UnknownModel`] when the root is not in the schema and
/// with [`Error::UnresolvedPath`] naming the first segment that does not match.
pub fn resolve_path(schema: &Schema, root: &str, path: &str) -> Result<FieldPath, Error> {
    let mut model = schema.model(root)?;
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    let last = segments.len() - 1;
    let mut hops = Vec::with_capacity(last);

    let unresolved = |segment: &str, model: &str, reason| Error::UnresolvedPath {
        path: path.to_string(),
        segment: segment.to_string(),
        model: model.to_string(),
        reason,
    };

    for (i, &segment) in segments.iter().enumerate() {
        let field = model
            .get_field(segment)
            .ok_or_else(|| unresolved(segment, model.name.as_str(), UnresolvedReason::UnknownField))?;

        if i == last {
            trace!(path, root, terminal_model = %model.name, "resolved field path");
            return Ok(FieldPath {
                raw: path.to_string(),
                root: root.to_string(),
                hops,
                terminal_model: model.name.clone(),
                terminal: field.clone(),
            });
        }

        let target = field
            .target()
            .ok_or_else(|| unresolved(segment, model.name.as_str(), UnresolvedReason::NotARelation))?;

        hops.push(Hop {
            model: model.name.clone(),
            field: field.name.clone(),
            target: target.to_string(),
            prefix: segments[..=i].join(PATH_SEPARATOR),
        });
        model = schema.model(target)?;
    }

    unreachable!("split always yields at least one segment")
}
