//! The selection graph object: the resolved shape of one request.
//!
//! A request such as
//!
//! ```text
//! {
//!   name                  # rootObject
//!   surgeon {             # surgeon
//!     fullName
//!     department {        # surgeon_department
//!       deptName
//!     }
//!   }
//! }
//! ```
//!
//! is captured as two maps keyed by graph level: which entity sits at each
//! level, and which fields were requested there. Graph levels double as
//! table aliases in the generated SQL.

mod request;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Reserved graph level of the root entity.
pub const ROOT_LEVEL: &str = "rootObject";

/// Separator between the segments of a nested graph level.
pub const LEVEL_SEPARATOR: char = '_';

fn default_root_key() -> String {
    ROOT_LEVEL.to_string()
}

/// Graph level → requested field names.
pub type GraphFieldMap = BTreeMap<String, BTreeSet<String>>;

/// Resolved selection for one request.
///
/// Built once per request and never mutated by compilation, so the same
/// value can back several queries (and several threads).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionGraph {
    root_entity: String,
    #[serde(default = "default_root_key")]
    root_key: String,
    #[serde(default)]
    entity_map: BTreeMap<String, String>,
    #[serde(default)]
    field_map: GraphFieldMap,
}

impl SelectionGraph {
    /// An empty selection rooted at `root_entity`.
    pub fn new(root_entity: &str) -> Self {
        let mut entity_map = BTreeMap::new();
        entity_map.insert(ROOT_LEVEL.to_string(), root_entity.to_string());
        Self {
            root_entity: root_entity.into(),
            root_key: ROOT_LEVEL.into(),
            entity_map,
            field_map: GraphFieldMap::new(),
        }
    }

    /// Assemble a selection from maps produced elsewhere. No validation is
    /// performed; problems surface when a query is compiled.
    pub fn from_parts(
        root_entity: &str,
        entity_map: BTreeMap<String, String>,
        field_map: GraphFieldMap,
    ) -> Self {
        let mut graph = Self {
            root_entity: root_entity.into(),
            root_key: ROOT_LEVEL.into(),
            entity_map,
            field_map,
        };
        graph
            .entity_map
            .entry(ROOT_LEVEL.to_string())
            .or_insert_with(|| root_entity.to_string());
        graph
    }

    /// Register the entity found at `graph_key`.
    #[must_use]
    pub fn with_level(mut self, graph_key: &str, entity: &str) -> Self {
        self.entity_map.insert(graph_key.into(), entity.into());
        self
    }

    /// Request fields at `graph_key`.
    #[must_use]
    pub fn with_fields<I, S>(mut self, graph_key: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_map
            .entry(graph_key.into())
            .or_default()
            .extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn root_entity(&self) -> &str {
        &self.root_entity
    }

    pub fn root_key(&self) -> &str {
        &self.root_key
    }

    pub fn entity_map(&self) -> &BTreeMap<String, String> {
        &self.entity_map
    }

    pub fn field_map(&self) -> &GraphFieldMap {
        &self.field_map
    }

    /// Graph levels present in the request.
    pub fn graph_levels(&self) -> impl Iterator<Item = &str> {
        self.field_map.keys().map(String::as_str)
    }

    pub fn entity_for(&self, graph_key: &str) -> Option<&str> {
        self.entity_map.get(graph_key).map(String::as_str)
    }

    pub fn fields_for(&self, graph_key: &str) -> Option<&BTreeSet<String>> {
        self.field_map.get(graph_key)
    }
}

// =============================================================================
// Graph level arithmetic
// =============================================================================

/// Parent of a graph level: the level minus its last segment, or the root
/// level for a top-level reference.
pub fn parent_level(graph_key: &str) -> &str {
    match graph_key.rfind(LEVEL_SEPARATOR) {
        Some(pos) => &graph_key[..pos],
        None => ROOT_LEVEL,
    }
}

/// Reference name that leads from the parent level to `graph_key`.
pub fn reference_name(graph_key: &str) -> &str {
    match graph_key.rfind(LEVEL_SEPARATOR) {
        Some(pos) => &graph_key[pos + 1..],
        None => graph_key,
    }
}

/// Whether `graph_key` may be selected in a query anchored at `anchor`.
pub fn is_in_scope(graph_key: &str, anchor: &str) -> bool {
    graph_key == anchor
        || anchor == ROOT_LEVEL
        || graph_key
            .strip_prefix(anchor)
            .is_some_and(|rest| rest.starts_with(LEVEL_SEPARATOR))
}

/// Column alias prefix for `graph_key` relative to `anchor`.
///
/// Empty for the anchor itself, otherwise the level path below the anchor
/// followed by `_`, so `surgeon_department` under the root yields
/// `surgeon_department_` and columns come out as `surgeon_department_dept_name`.
pub fn alias_prefix(graph_key: &str, anchor: &str) -> String {
    if graph_key == anchor {
        return String::new();
    }
    let relative = if anchor == ROOT_LEVEL {
        graph_key
    } else {
        graph_key
            .strip_prefix(anchor)
            .and_then(|rest| rest.strip_prefix(LEVEL_SEPARATOR))
            .unwrap_or(graph_key)
    };
    format!("{}{}", relative, LEVEL_SEPARATOR)
}
