//! Query composition: builder, join planning, filters, projections and paging.

mod builder;
mod executor;
mod filter;
mod paginate;
mod planner;
mod predicate;
mod projection;

pub use builder::{ColumnRef, JoinClause, OrderDirection, OrderSpec, Query, SelectColumn, ROOT_ALIAS};
pub use executor::QueryExecutor;
pub use filter::{
    apply_filters, apply_filters_with, parse_filter_key, parse_filter_value, ActiveFilters,
    FilterOptions, FilterSet,
};
pub use paginate::{paginate, PaginatedQuery};
pub use planner::{plan_joins, JoinKey, JoinPlan};
pub use predicate::{Operator, Predicate};
pub use projection::{related_fields, ProjectedColumn, Projection, RelatedModel};
