//! In-memory metadata store populated once at startup.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::graph_map::ReferenceGraph;
use super::provider::MetadataProvider;
use super::types::{EntityDef, EntityMetadata, GraphEntityMap, MetadataFile};
use super::MetadataError;

/// Read-only entity metadata shared by every compile.
///
/// # Example
///
/// ```
/// use sqlshape::metadata::{EntityDef, MetadataStore, MetadataProvider};
///
/// let store = MetadataStore::from_entities(vec![
///     EntityDef::new("Hospital", "hospital_tbl")
///         .root()
///         .key_field("hospitalId", "hospital_id")
///         .field("name", "name"),
/// ])
/// .unwrap();
///
/// assert_eq!(store.entity("Hospital").unwrap().table, "hospital_tbl");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    entities: HashMap<String, EntityMetadata>,
    graph_maps: HashMap<String, GraphEntityMap>,
}

impl MetadataStore {
    /// Validate the definitions and derive every lookup table.
    pub fn from_entities(defs: Vec<EntityDef>) -> Result<Self, MetadataError> {
        let mut entities = HashMap::with_capacity(defs.len());
        for def in &defs {
            if entities.contains_key(&def.name) {
                return Err(MetadataError::DuplicateEntity(def.name.clone()));
            }
            entities.insert(def.name.clone(), EntityMetadata::from_def(def)?);
        }

        let references = ReferenceGraph::new(&defs)?;
        references.ensure_acyclic()?;

        let mut graph_maps = HashMap::new();
        for def in defs.iter().filter(|d| d.root) {
            if let Some(map) = references.graph_entity_map(&def.name) {
                log::trace!("Graph entity map for {}: {:?}", def.name, map);
                graph_maps.insert(def.name.clone(), map);
            }
        }

        log::debug!(
            "Loaded metadata for {} entities ({} roots)",
            entities.len(),
            graph_maps.len()
        );

        Ok(Self {
            entities,
            graph_maps,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, MetadataError> {
        let file: MetadataFile = toml::from_str(content)?;
        Self::from_entities(file.entities)
    }

    pub fn from_json_str(content: &str) -> Result<Self, MetadataError> {
        let file: MetadataFile = serde_json::from_str(content)?;
        Self::from_entities(file.entities)
    }

    /// Load a `.toml` or `.json` metadata file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MetadataError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(MetadataError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Graph entity map of a declared root entity.
    pub fn root_graph_map(&self, root_entity: &str) -> Result<&GraphEntityMap, MetadataError> {
        self.graph_maps
            .get(root_entity)
            .ok_or_else(|| MetadataError::UnknownRootEntity(root_entity.to_string()))
    }

    /// Names of entities that have a graph entity map.
    pub fn root_entities(&self) -> Vec<&str> {
        let mut roots: Vec<&str> = self.graph_maps.keys().map(String::as_str).collect();
        roots.sort_unstable();
        roots
    }
}

impl MetadataProvider for MetadataStore {
    fn entity(&self, name: &str) -> Option<&EntityMetadata> {
        self.entities.get(name)
    }

    fn graph_entity_map(&self, root_entity: &str) -> Option<&GraphEntityMap> {
        self.graph_maps.get(root_entity)
    }
}
