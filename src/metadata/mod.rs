//! Entity metadata.
//!
//! Describes how entities map to tables, columns and join keys. Metadata is
//! declared explicitly (in code or in a TOML/JSON file), validated once, and
//! then served read-only through [`MetadataProvider`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 EntityDef (code / TOML / JSON)                  │
//! └─────────────────────────────────────────────────────────────────┘
//!                           │  MetadataStore::from_entities
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        MetadataStore                            │
//! │  - per entity: table, field↔column, key / join-key fields,      │
//! │    join columns per reference, API name aliases                 │
//! │  - per root entity: graph level → entity                        │
//! └─────────────────────────────────────────────────────────────────┘
//!                           │  MetadataProvider
//!                           ▼
//!                    QueryCompiler (read-only)
//! ```

mod graph_map;
mod provider;
mod store;
mod types;

use std::path::PathBuf;

pub use graph_map::ReferenceGraph;
pub use provider::{MetadataProvider, MetadataProviderExt};
pub use store::MetadataStore;
pub use types::*;

/// Errors raised while loading or validating metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Failed to read metadata file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse metadata TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse metadata JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported metadata file format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Entity {0} is defined more than once")]
    DuplicateEntity(String),

    #[error("Reference '{reference}' of entity {entity} points to unknown entity {target}")]
    UnknownReference {
        entity: String,
        reference: String,
        target: String,
    },

    #[error("Reference '{reference}' of entity {entity} must not contain '_'")]
    InvalidReferenceName { entity: String, reference: String },

    #[error("Field '{field}' of entity {entity} is mapped to both '{column}' and '{other}'")]
    ConflictingField {
        entity: String,
        field: String,
        column: String,
        other: String,
    },

    #[error("Column '{column}' of entity {entity} is mapped from both '{field}' and '{other}'")]
    ConflictingColumn {
        entity: String,
        column: String,
        field: String,
        other: String,
    },

    #[error("Entity references form a cycle between: {}", .cycle.join(", "))]
    CyclicReference { cycle: Vec<String> },

    #[error("Entity {0} is not declared as a root entity")]
    UnknownRootEntity(String),
}
