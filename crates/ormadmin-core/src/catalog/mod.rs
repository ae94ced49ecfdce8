//! Schema descriptors for administered models.
//!
//! The catalog is built once at startup and is read-only afterwards. It holds
//! each model's ordered field list, its primary key, and the foreign-key edges
//! that path resolution and dependency collection walk.

mod field;
mod model;
mod relation;
mod schema;
mod types;

pub use field::FieldDef;
pub use model::ModelDef;
pub use relation::ForeignKeyEdge;
pub use schema::Schema;
pub use types::{FieldKind, ScalarType};

/// Separator between segments of a field path (`author__username`).
pub const PATH_SEPARATOR: &str = "__";
