//! MetadataProvider trait definition.
//!
//! The compiler never reaches for entity metadata on its own; it is handed a
//! provider. [`MetadataStore`](super::MetadataStore) is the bundled
//! implementation, but anything that can answer these two lookups works.

use super::types::{EntityMetadata, GraphEntityMap};
use crate::error::{QueryError, QueryResult};

/// Read-only source of entity metadata.
///
/// Implementations are populated before the first compile and never mutated
/// afterwards, so they can be shared freely between threads.
pub trait MetadataProvider: Send + Sync {
    /// Lookup tables for one entity.
    fn entity(&self, name: &str) -> Option<&EntityMetadata>;

    /// Graph level → entity name for a root entity.
    fn graph_entity_map(&self, root_entity: &str) -> Option<&GraphEntityMap>;
}

/// Lookups that turn a missing entry into a [`QueryError`].
pub trait MetadataProviderExt: MetadataProvider {
    fn require_entity(&self, name: &str) -> QueryResult<&EntityMetadata> {
        self.entity(name)
            .ok_or_else(|| QueryError::EntityMetadataMissing {
                entity: name.to_string(),
            })
    }

    /// Entity bound to `graph_key` in the metadata graph map of `root_entity`.
    fn entity_for_level(&self, root_entity: &str, graph_key: &str) -> Option<&str> {
        self.graph_entity_map(root_entity)
            .and_then(|map| map.get(graph_key))
            .map(String::as_str)
    }
}

impl<T: MetadataProvider + ?Sized> MetadataProviderExt for T {}
