//! Building a [`SelectionGraph`] from request selection paths.
//!
//! The API layer flattens a nested request into slash-separated paths, one
//! per selected scalar field:
//!
//! ```text
//! name                        → rootObject: {name}
//! surgeon/fullName            → surgeon: {fullName}
//! surgeon/department/deptName → surgeon_department: {deptName}
//! ```
//!
//! Every intermediate level is registered with an empty field set so that
//! the joins leading to a nested selection are always emitted. A path that
//! names a reference instead of a scalar registers the level only.

use super::{SelectionGraph, LEVEL_SEPARATOR, ROOT_LEVEL};
use crate::error::{QueryError, QueryResult};
use crate::metadata::MetadataProvider;

impl SelectionGraph {
    /// Translate selection paths into a selection graph for `root_entity`.
    pub fn from_selection_paths<M, S>(
        metadata: &M,
        root_entity: &str,
        paths: &[S],
    ) -> QueryResult<Self>
    where
        M: MetadataProvider + ?Sized,
        S: AsRef<str>,
    {
        let graph_map = metadata.graph_entity_map(root_entity).ok_or_else(|| {
            QueryError::EntityMetadataMissing {
                entity: root_entity.to_string(),
            }
        })?;

        let mut graph = SelectionGraph::new(root_entity);

        for path in paths {
            let segments: Vec<&str> = path
                .as_ref()
                .split('/')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            let Some((field, parents)) = segments.split_last() else {
                continue;
            };

            let mut level = String::new();
            for segment in parents {
                if !level.is_empty() {
                    level.push(LEVEL_SEPARATOR);
                }
                level.push_str(segment);

                let entity = graph_map
                    .get(&level)
                    .ok_or_else(|| QueryError::UnknownGraphLevel {
                        graph_key: level.clone(),
                    })?;
                graph.entity_map.insert(level.clone(), entity.clone());
                graph.field_map.entry(level.clone()).or_default();
            }

            let nested = if level.is_empty() {
                field.to_string()
            } else {
                format!("{}{}{}", level, LEVEL_SEPARATOR, field)
            };
            if let Some(entity) = graph_map.get(&nested) {
                graph.entity_map.insert(nested, entity.clone());
                continue;
            }

            let target = if level.is_empty() {
                ROOT_LEVEL.to_string()
            } else {
                level
            };
            graph
                .field_map
                .entry(target)
                .or_default()
                .insert(field.to_string());
        }

        log::trace!(
            "Selection graph for {}: {} levels",
            root_entity,
            graph.field_map.len()
        );
        Ok(graph)
    }
}
