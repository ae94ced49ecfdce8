//! ORMDB Admin Core - path resolution, join planning and cascade preview.
//!
//! This crate provides the query-composition engine behind the admin tooling:
//! field paths such as `author__username` are resolved against a [`Schema`],
//! merged into a minimal join plan, and turned into filters, projections and
//! paged queries that a [`QueryExecutor`] runs.

pub mod admin;
pub mod cascade;
pub mod catalog;
pub mod error;
pub mod export;
pub mod path;
pub mod query;
pub mod storage;
pub mod value;

pub use admin::{AdminOptions, AdminRegistry, ModelAdmin};
pub use cascade::{collect_dependents, DependencyCollector, DependencyGroup};
pub use catalog::{FieldDef, FieldKind, ModelDef, ScalarType, Schema, PATH_SEPARATOR};
pub use error::{Error, Result, StorageError, UnresolvedReason};
pub use export::write_json;
pub use path::{resolve_path, FieldPath, Hop};
pub use query::{
    apply_filters, paginate, plan_joins, related_fields, ActiveFilters, ColumnRef, JoinPlan,
    Operator, PaginatedQuery, Predicate, Projection, Query, QueryExecutor,
};
pub use storage::MemoryStore;
pub use value::{Row, Value};
