//! Query compilation: selection graph + builder + metadata → SQL.
//!
//! ```text
//! SelectionGraph ─┐
//! QuerySpec ──────┼─► QueryCompiler ─► columns ─► joins ─► clauses ─► SQL
//! metadata ───────┘
//! ```
//!
//! Compilation is a pure function of its inputs. The selection graph is only
//! read; fields injected for GROUP BY live in a per-compile copy, so one
//! graph can back any number of compiles, concurrently if need be.
//!
//! # Example
//!
//! ```
//! use sqlshape::builder::{ConditionBuilder, SimpleQuery};
//! use sqlshape::compiler::QueryCompiler;
//! use sqlshape::graph::{SelectionGraph, ROOT_LEVEL};
//! use sqlshape::metadata::{EntityDef, MetadataStore};
//!
//! let store = MetadataStore::from_entities(vec![EntityDef::new("Hospital", "hospital_tbl")
//!     .root()
//!     .key_field("hospitalId", "hospital_id")
//!     .field("name", "name")])
//! .unwrap();
//!
//! let graph = SelectionGraph::new("Hospital").with_fields(ROOT_LEVEL, ["name"]);
//! let query = SimpleQuery::builder().graph_key(ROOT_LEVEL).limit(1).build().unwrap();
//!
//! let sql = QueryCompiler::new(&store).select_query(&graph, &query).unwrap();
//! assert_eq!(sql, "SELECT hospital_id, name FROM hospital_tbl LIMIT 1");
//! ```

mod clauses;
mod columns;
mod joins;
mod native;

use serde::{Deserialize, Serialize};

use crate::builder::{JoinQuery, NativeQuery, SimpleQuery};
use crate::error::{QueryError, QueryResult};
use crate::graph::SelectionGraph;
use crate::metadata::MetadataProvider;
use columns::{ColumnStyle, CompileContext};

/// Any built query, as read from JSON by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "query", rename_all = "snake_case")]
pub enum QuerySpec {
    Simple(SimpleQuery),
    Join(JoinQuery),
    Native(NativeQuery),
}

/// Compiles built queries against a metadata provider.
pub struct QueryCompiler<'m, M: ?Sized> {
    metadata: &'m M,
}

impl<'m, M: MetadataProvider + ?Sized> QueryCompiler<'m, M> {
    pub fn new(metadata: &'m M) -> Self {
        Self { metadata }
    }

    /// Single-entity query: bare columns from one unaliased table.
    pub fn select_query(&self, graph: &SelectionGraph, query: &SimpleQuery) -> QueryResult<String> {
        let mut ctx = CompileContext::new(self.metadata, graph);
        let graph_key = require_key(query.graph_key(), "SimpleQuery", "graph_key")?;
        let conditions = query.conditions();

        for column in conditions.group_by() {
            ctx.add_field_for_column(graph_key, &column.column)?;
        }
        let aggregates =
            ctx.resolve_aggregates(conditions.aggregates(), graph_key, ColumnStyle::Bare)?;

        let columns = ctx.select_columns(graph_key, ColumnStyle::Bare, &aggregates)?;
        let table = &ctx.entity(graph_key)?.table;

        let sql = clauses::assemble(&columns, table, conditions);
        log_sql(&sql);
        Ok(sql)
    }

    /// Multi-entity query: the anchor table plus every declared join the
    /// request needs.
    pub fn join_query(&self, graph: &SelectionGraph, query: &JoinQuery) -> QueryResult<String> {
        let mut ctx = CompileContext::new(self.metadata, graph);
        let root_key = require_key(query.root_key(), "JoinQuery", "root_key")?;
        let aggregates = ctx.resolve_aggregates(
            query.conditions().aggregates(),
            root_key,
            ColumnStyle::Qualified { anchor: root_key },
        )?;

        let plan = joins::plan_joins(&mut ctx, query, &aggregates)?;

        let sql = clauses::assemble(&plan.columns, &plan.from, query.conditions());
        log_sql(&sql);
        Ok(sql)
    }

    /// Native query: generated SELECT list in front of a caller template.
    pub fn native_query(&self, graph: &SelectionGraph, query: &NativeQuery) -> QueryResult<String> {
        let ctx = CompileContext::new(self.metadata, graph);
        let sql = match query {
            NativeQuery::Simple {
                graph_key,
                template,
                aggregates,
            } => {
                let graph_key = require_key(graph_key, "NativeSimpleQuery", "graph_key")?;
                native::compile_simple(&ctx, graph_key, template, aggregates)?
            }
            NativeQuery::Join {
                root_key,
                template,
                aliases,
                aggregates,
            } => {
                let root_key = require_key(root_key, "NativeJoinQuery", "root_key")?;
                native::compile_join(&ctx, root_key, template, aliases, aggregates)?
            }
        };
        log_sql(&sql);
        Ok(sql)
    }

    pub fn compile(&self, graph: &SelectionGraph, spec: &QuerySpec) -> QueryResult<String> {
        match spec {
            QuerySpec::Simple(query) => self.select_query(graph, query),
            QuerySpec::Join(query) => self.join_query(graph, query),
            QuerySpec::Native(query) => self.native_query(graph, query),
        }
    }
}

fn log_sql(sql: &str) {
    if !sql.is_empty() {
        log::debug!("Generated SQL: {}", sql);
    }
}

// =============================================================================
// Request-scoped facade
// =============================================================================

/// One request's selection bound to a metadata provider.
///
/// Resolvers typically create one generator per request and call it once
/// per query shape they need.
pub struct QueryGenerator<'m, 'g, M: ?Sized> {
    compiler: QueryCompiler<'m, M>,
    graph: &'g SelectionGraph,
}

impl<'m, 'g, M: MetadataProvider + ?Sized> QueryGenerator<'m, 'g, M> {
    pub fn new(metadata: &'m M, graph: &'g SelectionGraph) -> Self {
        Self {
            compiler: QueryCompiler::new(metadata),
            graph,
        }
    }

    pub fn graph(&self) -> &'g SelectionGraph {
        self.graph
    }

    /// Graph levels the request selected.
    pub fn graph_levels(&self) -> impl Iterator<Item = &'g str> {
        self.graph.graph_levels()
    }

    pub fn select_query(&self, query: &SimpleQuery) -> QueryResult<String> {
        self.compiler.select_query(self.graph, query)
    }

    pub fn join_query(&self, query: &JoinQuery) -> QueryResult<String> {
        self.compiler.join_query(self.graph, query)
    }

    pub fn native_query(&self, query: &NativeQuery) -> QueryResult<String> {
        self.compiler.native_query(self.graph, query)
    }

    pub fn compile(&self, spec: &QuerySpec) -> QueryResult<String> {
        self.compiler.compile(self.graph, spec)
    }
}

/// Deserialized queries bypass `build()`, so their identity is checked again.
fn require_key<'k>(
    key: &'k str,
    builder: &'static str,
    field: &'static str,
) -> QueryResult<&'k str> {
    if key.trim().is_empty() {
        return Err(QueryError::MissingRequiredField { builder, field });
    }
    Ok(key)
}
