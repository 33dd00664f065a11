//! Builders for queries whose `FROM ...` tail is written by hand.
//!
//! Only the SELECT list is generated. The multi-entity form lets the
//! template refer to tables through placeholders such as `${s}`, mapped to
//! graph levels with [`NativeJoinQueryBuilder::alias`]:
//!
//! ```text
//! FROM hospital_tbl ${h}
//!   INNER JOIN surgeon_tbl ${s} ON ${h}.hospital_id = ${s}.hospital_id
//! ```

use serde::{Deserialize, Serialize};

use super::AggregateColumns;
use crate::condition::AggregateFn;
use crate::error::{QueryError, QueryResult};

/// A template placeholder and the graph level it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableAlias {
    pub alias: String,
    pub graph_key: String,
}

/// A finished native query description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum NativeQuery {
    /// Bare columns of one graph level followed by the template.
    Simple {
        graph_key: String,
        template: String,
        #[serde(default)]
        aggregates: AggregateColumns,
    },
    /// Alias-qualified columns of every mapped level followed by the template.
    Join {
        root_key: String,
        template: String,
        #[serde(default)]
        aliases: Vec<TableAlias>,
        #[serde(default)]
        aggregates: AggregateColumns,
    },
}

impl NativeQuery {
    pub fn simple() -> NativeSimpleQueryBuilder {
        NativeSimpleQueryBuilder::default()
    }

    pub fn join() -> NativeJoinQueryBuilder {
        NativeJoinQueryBuilder::default()
    }

    pub fn template(&self) -> &str {
        match self {
            NativeQuery::Simple { template, .. } | NativeQuery::Join { template, .. } => template,
        }
    }

    pub fn aggregates(&self) -> &AggregateColumns {
        match self {
            NativeQuery::Simple { aggregates, .. } | NativeQuery::Join { aggregates, .. } => {
                aggregates
            }
        }
    }
}

fn require_template(template: Option<String>) -> QueryResult<String> {
    template
        .filter(|t| !t.trim().is_empty())
        .ok_or(QueryError::EmptyQueryTemplate)
}

/// Fluent builder for [`NativeQuery::Simple`].
#[derive(Debug, Clone, Default)]
#[must_use = "builders have no effect until used"]
pub struct NativeSimpleQueryBuilder {
    graph_key: Option<String>,
    template: Option<String>,
    aggregates: AggregateColumns,
}

impl NativeSimpleQueryBuilder {
    pub fn graph_key(mut self, graph_key: &str) -> Self {
        self.graph_key = Some(graph_key.into());
        self
    }

    /// SQL starting at `FROM`.
    pub fn template(mut self, template: &str) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn aggregate_column(mut self, func: AggregateFn, column: &str) -> Self {
        self.aggregates.insert(column.into(), func);
        self
    }

    pub fn build(self) -> QueryResult<NativeQuery> {
        let graph_key = self
            .graph_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(QueryError::MissingRequiredField {
                builder: "NativeSimpleQuery",
                field: "graph_key",
            })?;
        let template = require_template(self.template)?;
        Ok(NativeQuery::Simple {
            graph_key,
            template,
            aggregates: self.aggregates,
        })
    }
}

/// Fluent builder for [`NativeQuery::Join`].
#[derive(Debug, Clone, Default)]
#[must_use = "builders have no effect until used"]
pub struct NativeJoinQueryBuilder {
    root_key: Option<String>,
    template: Option<String>,
    aliases: Vec<TableAlias>,
    aggregates: AggregateColumns,
}

impl NativeJoinQueryBuilder {
    pub fn root_key(mut self, root_key: &str) -> Self {
        self.root_key = Some(root_key.into());
        self
    }

    /// SQL starting at `FROM`, with `${alias}` placeholders for table aliases.
    pub fn template(mut self, template: &str) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Map `${alias}` to `graph_key`. Remapping an alias keeps its position.
    pub fn alias(mut self, alias: &str, graph_key: &str) -> Self {
        match self.aliases.iter_mut().find(|a| a.alias == alias) {
            Some(existing) => existing.graph_key = graph_key.into(),
            None => self.aliases.push(TableAlias {
                alias: alias.into(),
                graph_key: graph_key.into(),
            }),
        }
        self
    }

    /// Aggregate a column given as `${alias}.column`.
    pub fn aggregate_column(mut self, func: AggregateFn, column: &str) -> Self {
        self.aggregates.insert(column.into(), func);
        self
    }

    pub fn build(self) -> QueryResult<NativeQuery> {
        let root_key = self
            .root_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(QueryError::MissingRequiredField {
                builder: "NativeJoinQuery",
                field: "root_key",
            })?;
        let template = require_template(self.template)?;
        Ok(NativeQuery::Join {
            root_key,
            template,
            aliases: self.aliases,
            aggregates: self.aggregates,
        })
    }
}
