//! # sqlshape
//!
//! Compiles request-shaped selections into SQL.
//!
//! An API layer (typically a GraphQL resolver) knows which nested fields a
//! caller asked for. sqlshape turns that selection, plus a description of
//! the filters, grouping and paging a resolver wants, into one parameterised
//! SQL statement that selects exactly those columns and joins exactly those
//! tables.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          Entity metadata (EntityDef → MetadataStore)     │
//! │   tables, field↔column maps, keys, join columns,         │
//! │   graph level → entity per root entity                   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!        ┌─────────────────┼──────────────────┐
//!        ▼                 ▼                  ▼
//! ┌──────────────┐  ┌──────────────┐  ┌───────────────────┐
//! │SelectionGraph│  │  Builders    │  │ MetadataProvider  │
//! │ (per request)│  │ Simple/Join/ │  │   (read-only)     │
//! │              │  │ Native       │  │                   │
//! └──────────────┘  └──────────────┘  └───────────────────┘
//!        └─────────────────┼──────────────────┘
//!                          ▼ [compiler]
//! ┌─────────────────────────────────────────────────────────┐
//! │        SQL text with `?` placeholders                    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Values are never inlined: every condition renders `?` placeholders, bound
//! by the caller in the order conditions were appended.

pub mod builder;
pub mod compiler;
pub mod condition;
pub mod config;
pub mod error;
pub mod graph;
pub mod metadata;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::builder::{
        ConditionBuilder, JoinQuery, JoinQueryBuilder, NativeQuery, SimpleQuery,
        SimpleQueryBuilder,
    };
    pub use crate::compiler::{QueryCompiler, QueryGenerator, QuerySpec};
    pub use crate::condition::{AggregateFn, JoinType, SqlCondition, SubQueryCondition};
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::graph::{SelectionGraph, ROOT_LEVEL};
    pub use crate::metadata::{EntityDef, MetadataProvider, MetadataStore};
}

// Also export at crate root for convenience
pub use compiler::{QueryCompiler, QueryGenerator};
pub use error::{QueryError, QueryResult};
pub use graph::SelectionGraph;
pub use metadata::MetadataStore;
