//! Graph entity map generation.
//!
//! Entity references form a directed graph (entity → referenced entity,
//! labelled with the reference name). Each root entity's map is produced by
//! walking that graph and naming every position in the nested selection
//! tree:
//!
//! ```text
//! Hospital                    rootObject
//! └─ surgeon: Surgeon         surgeon
//!    └─ department: Dept      surgeon_department
//! ```
//!
//! The walk only runs once the reference graph is known to be acyclic.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use super::types::{EntityDef, GraphEntityMap};
use super::MetadataError;
use crate::graph::{LEVEL_SEPARATOR, ROOT_LEVEL};

/// Adjacency structure over entity definitions.
pub struct ReferenceGraph<'a> {
    graph: DiGraph<&'a str, &'a str>,
    node_index: HashMap<&'a str, NodeIndex>,
}

impl<'a> ReferenceGraph<'a> {
    /// Build the reference graph, rejecting references to unknown entities
    /// and reference names that would make graph levels ambiguous.
    pub fn new(defs: &'a [EntityDef]) -> Result<Self, MetadataError> {
        let mut graph = DiGraph::new();
        let mut node_index = HashMap::new();

        for def in defs {
            let idx = graph.add_node(def.name.as_str());
            node_index.insert(def.name.as_str(), idx);
        }

        for def in defs {
            let from = node_index[def.name.as_str()];
            for reference in &def.references {
                if reference.name.contains(LEVEL_SEPARATOR) {
                    return Err(MetadataError::InvalidReferenceName {
                        entity: def.name.clone(),
                        reference: reference.name.clone(),
                    });
                }
                let to = node_index.get(reference.entity.as_str()).ok_or_else(|| {
                    MetadataError::UnknownReference {
                        entity: def.name.clone(),
                        reference: reference.name.clone(),
                        target: reference.entity.clone(),
                    }
                })?;
                graph.add_edge(from, *to, reference.name.as_str());
            }
        }

        Ok(Self { graph, node_index })
    }

    /// Fail on the first reference cycle found.
    pub fn ensure_acyclic(&self) -> Result<(), MetadataError> {
        for scc in tarjan_scc(&self.graph) {
            let is_cycle = scc.len() > 1
                || self
                    .graph
                    .edges_connecting(scc[0], scc[0])
                    .next()
                    .is_some();
            if is_cycle {
                let mut cycle: Vec<String> =
                    scc.iter().map(|idx| self.graph[*idx].to_string()).collect();
                cycle.sort();
                return Err(MetadataError::CyclicReference { cycle });
            }
        }
        Ok(())
    }

    /// Name every graph level reachable from `root`.
    ///
    /// Must only be called after [`ReferenceGraph::ensure_acyclic`].
    pub fn graph_entity_map(&self, root: &str) -> Option<GraphEntityMap> {
        let root_idx = *self.node_index.get(root)?;
        let mut map = GraphEntityMap::new();
        map.insert(ROOT_LEVEL.to_string(), root.to_string());
        self.walk(root_idx, "", &mut map);
        Some(map)
    }

    fn walk(&self, node: NodeIndex, parent_level: &str, map: &mut GraphEntityMap) {
        // Edges come back newest first; reverse to keep declaration order.
        let mut edges: Vec<_> = self.graph.edges(node).collect();
        edges.reverse();

        for edge in edges {
            let level = if parent_level.is_empty() {
                edge.weight().to_string()
            } else {
                format!("{}{}{}", parent_level, LEVEL_SEPARATOR, edge.weight())
            };
            map.insert(level.clone(), self.graph[edge.target()].to_string());
            self.walk(edge.target(), &level, map);
        }
    }
}
