//! Storage backends implementing [`QueryExecutor`](crate::query::QueryExecutor).

mod memory;

pub use memory::MemoryStore;
