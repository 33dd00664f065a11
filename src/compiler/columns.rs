//! Column resolution: which columns a graph level contributes to the SELECT
//! list, and how they are rendered.

use std::collections::{BTreeMap, BTreeSet};

use crate::builder::AggregateColumns;
use crate::error::{QueryError, QueryResult};
use crate::graph::{alias_prefix, is_in_scope, GraphFieldMap, SelectionGraph};
use crate::metadata::{EntityMetadata, MetadataProvider, MetadataProviderExt};

/// How resolved columns are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnStyle<'s> {
    /// `column`, for statements over a single unaliased table.
    Bare,
    /// `level.column AS <prefix>column`, relative to an anchor level.
    Qualified { anchor: &'s str },
}

/// Per-compile state.
///
/// Holds a working copy of the request's field map so that fields injected
/// for GROUP BY never leak back into the shared [`SelectionGraph`].
pub(crate) struct CompileContext<'a, M: ?Sized> {
    metadata: &'a M,
    graph: &'a SelectionGraph,
    fields: GraphFieldMap,
}

impl<'a, M: MetadataProvider + ?Sized> CompileContext<'a, M> {
    pub(crate) fn new(metadata: &'a M, graph: &'a SelectionGraph) -> Self {
        Self {
            metadata,
            graph,
            fields: graph.field_map().clone(),
        }
    }

    pub(crate) fn graph(&self) -> &'a SelectionGraph {
        self.graph
    }

    /// Levels with requested (or injected) fields.
    pub(crate) fn requested_levels(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub(crate) fn is_requested(&self, graph_key: &str) -> bool {
        self.fields.contains_key(graph_key)
    }

    /// Entity at `graph_key`: the request's own map first, then the
    /// metadata map of the root entity.
    pub(crate) fn entity_name(&self, graph_key: &str) -> QueryResult<&'a str> {
        self.graph
            .entity_for(graph_key)
            .or_else(|| {
                self.metadata
                    .entity_for_level(self.graph.root_entity(), graph_key)
            })
            .ok_or_else(|| QueryError::UnknownGraphLevel {
                graph_key: graph_key.to_string(),
            })
    }

    pub(crate) fn entity(&self, graph_key: &str) -> QueryResult<&'a EntityMetadata> {
        let name = self.entity_name(graph_key)?;
        self.metadata.require_entity(name)
    }

    /// Add the field behind `column` to the working selection of `graph_key`.
    /// Columns the entity does not map are ignored.
    pub(crate) fn add_field_for_column(&mut self, graph_key: &str, column: &str) -> QueryResult<()> {
        let entity = self.entity(graph_key)?;
        if let Some(field) = entity.field_for_column(column) {
            self.fields
                .entry(graph_key.to_string())
                .or_default()
                .insert(field.to_string());
        }
        Ok(())
    }

    /// Make sure `graph_key` selects at least its primary key.
    pub(crate) fn ensure_key_fields(&mut self, graph_key: &str) -> QueryResult<()> {
        if self.fields.contains_key(graph_key) {
            return Ok(());
        }
        let entity = self.entity(graph_key)?;
        self.fields
            .insert(graph_key.to_string(), entity.key_fields.iter().cloned().collect());
        Ok(())
    }

    /// Check every aggregate key names a real column and rewrite it into the
    /// form [`select_columns`](Self::select_columns) looks up for `style`:
    /// bare `column` for single-table statements, `level.column` otherwise.
    ///
    /// A bare key belongs to `anchor`. A single-table statement only reads
    /// `anchor`, so a qualified key naming any other level is rejected.
    pub(crate) fn resolve_aggregates(
        &self,
        aggregates: &AggregateColumns,
        anchor: &str,
        style: ColumnStyle<'_>,
    ) -> QueryResult<AggregateColumns> {
        let mut resolved = AggregateColumns::new();
        for (key, func) in aggregates {
            let (graph_key, column) = key.split_once('.').unwrap_or((anchor, key.as_str()));

            if matches!(style, ColumnStyle::Bare) && graph_key != anchor {
                return Err(QueryError::AggregateColumnNotFound {
                    column: key.clone(),
                    entity: self.entity(anchor)?.name.clone(),
                });
            }

            let entity = self.entity(graph_key)?;
            if !entity.has_column(column) {
                return Err(QueryError::AggregateColumnNotFound {
                    column: column.to_string(),
                    entity: entity.name.clone(),
                });
            }

            let normalized = match style {
                ColumnStyle::Bare => column.to_string(),
                ColumnStyle::Qualified { .. } => format!("{}.{}", graph_key, column),
            };
            resolved.insert(normalized, *func);
        }
        Ok(resolved)
    }

    /// Rendered SELECT fragments for one graph level.
    ///
    /// Field order: join-key fields in metadata order, then requested fields
    /// in name order, then fields behind aggregated columns of this level.
    /// Join-key fields are left out while any aggregate is present.
    pub(crate) fn select_columns(
        &self,
        graph_key: &str,
        style: ColumnStyle<'_>,
        aggregates: &AggregateColumns,
    ) -> QueryResult<Vec<String>> {
        if let ColumnStyle::Qualified { anchor } = style {
            if !is_in_scope(graph_key, anchor) {
                return Err(QueryError::GraphKeyNotChildOfRoot {
                    root: anchor.to_string(),
                    graph_key: graph_key.to_string(),
                });
            }
        }

        let entity = self.entity(graph_key)?;
        let aggregate_key = |column: &str| match style {
            ColumnStyle::Bare => column.to_string(),
            ColumnStyle::Qualified { .. } => format!("{}.{}", graph_key, column),
        };

        let mut fields: Vec<&str> = Vec::new();
        if aggregates.is_empty() {
            fields.extend(entity.join_key_fields.iter().map(String::as_str));
        }
        if let Some(requested) = self.fields.get(graph_key) {
            for field in requested {
                if !fields.contains(&field.as_str()) {
                    fields.push(field);
                }
            }
        }
        let aggregated = aggregated_fields(entity, aggregates, |column| aggregate_key(column));
        for field in aggregated {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }

        let prefix = match style {
            ColumnStyle::Bare => String::new(),
            ColumnStyle::Qualified { anchor } => alias_prefix(graph_key, anchor),
        };

        let mut seen = BTreeSet::new();
        let mut columns = Vec::with_capacity(fields.len());
        for field in fields {
            let column = resolve_column(entity, field)?;
            if !seen.insert(column) {
                continue;
            }
            let aggregate = aggregates.get(&aggregate_key(column));
            let rendered = match (style, aggregate) {
                (ColumnStyle::Bare, Some(func)) => {
                    format!("{} AS {}", func.apply(column), column)
                }
                (ColumnStyle::Bare, None) => column.to_string(),
                (ColumnStyle::Qualified { .. }, Some(func)) => format!(
                    "{} AS {}{}",
                    func.apply(&format!("{}.{}", graph_key, column)),
                    prefix,
                    column
                ),
                (ColumnStyle::Qualified { .. }, None) => {
                    format!("{}.{} AS {}{}", graph_key, column, prefix, column)
                }
            };
            columns.push(rendered);
        }

        log::trace!("Columns for {}: {:?}", graph_key, columns);
        Ok(columns)
    }
}

/// Fields behind the aggregated columns that belong to this level, in
/// aggregate key order.
fn aggregated_fields<'e>(
    entity: &'e EntityMetadata,
    aggregates: &AggregateColumns,
    key_for: impl Fn(&str) -> String,
) -> Vec<&'e str> {
    let by_key: BTreeMap<String, &'e str> = entity
        .column_to_field
        .iter()
        .map(|(column, field)| (key_for(column), field.as_str()))
        .collect();
    aggregates
        .keys()
        .filter_map(|key| by_key.get(key).copied())
        .collect()
}

// =============================================================================
// Field → column resolution
// =============================================================================

/// Resolve an API field name to a column of `entity`.
///
/// Tries, in order: the field name itself, the property behind a
/// `getX`/`isX` accessor name, and the entity's API name aliases.
pub(crate) fn resolve_column<'e>(entity: &'e EntityMetadata, field: &str) -> QueryResult<&'e str> {
    if let Some(column) = entity.column_for_field(field) {
        return Ok(column);
    }

    if let Some(property) = accessor_property(field) {
        if let Some(column) = entity.column_for_field(&property) {
            return Ok(column);
        }
    }

    if let Some(column) = entity
        .api_names
        .get(field)
        .and_then(|renamed| entity.column_for_field(renamed))
    {
        return Ok(column);
    }

    Err(QueryError::field_not_found(field, &entity.name))
}

/// `getDeptName` → `deptName`, `isActive` → `active`, `getURL` → `URL`.
fn accessor_property(name: &str) -> Option<String> {
    let rest = name
        .strip_prefix("get")
        .or_else(|| name.strip_prefix("is"))
        .filter(|rest| !rest.is_empty())?;
    Some(decapitalize(rest))
}

/// Lower-case the first character unless the first two are both upper case.
fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_uppercase() && second.is_uppercase() => {
            name.to_string()
        }
        (Some(first), _) => first.to_lowercase().chain(name.chars().skip(1)).collect(),
        (None, _) => String::new(),
    }
}
