//! Condition builders.
//!
//! A builder describes one query shape: filters, grouping, ordering, paging
//! and aggregates. It knows nothing about which columns a request selected;
//! the compiler combines it with a [`SelectionGraph`](crate::graph::SelectionGraph)
//! to produce SQL.
//!
//! Three variants exist:
//!
//! | Builder | Anchored at | Produces |
//! |---------|-------------|----------|
//! | [`SimpleQueryBuilder`] | one graph level | [`SimpleQuery`] |
//! | [`JoinQueryBuilder`] | a root level plus declared joins | [`JoinQuery`] |
//! | [`NativeSimpleQueryBuilder`] / [`NativeJoinQueryBuilder`] | a caller-written `FROM ...` template | [`NativeQuery`] |
//!
//! Accumulation is append-only. `build()` freezes the accumulated state into
//! an immutable value that can be compiled any number of times.

mod join;
mod native;
mod simple;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::condition::AggregateFn;

pub use join::{GraphJoin, JoinQuery, JoinQueryBuilder};
pub use native::{NativeJoinQueryBuilder, NativeQuery, NativeSimpleQueryBuilder, TableAlias};
pub use simple::{SimpleQuery, SimpleQueryBuilder};

// =============================================================================
// Tokens
// =============================================================================

/// One element of a WHERE or HAVING token list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionToken {
    /// A rendered predicate such as `surgeon.full_name = ?`, tagged with the
    /// graph level it filters on, if any.
    Clause {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        graph_key: Option<String>,
        sql: String,
    },
    Open,
    Close,
    Or,
}

impl ConditionToken {
    pub(crate) fn clause(graph_key: Option<&str>, sql: String) -> Self {
        ConditionToken::Clause {
            graph_key: graph_key.map(str::to_string),
            sql,
        }
    }

    pub fn graph_key(&self) -> Option<&str> {
        match self {
            ConditionToken::Clause { graph_key, .. } => graph_key.as_deref(),
            _ => None,
        }
    }
}

/// One element of an ORDER BY token list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderToken {
    Column(String),
    Asc,
    Desc,
}

/// A GROUP BY column, optionally qualified by graph level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupByColumn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_key: Option<String>,
    pub column: String,
}

impl fmt::Display for GroupByColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.graph_key {
            Some(graph_key) => write!(f, "{}.{}", graph_key, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

/// `graph_key.column`, or the bare column when no graph level is given.
pub(crate) fn qualify(graph_key: &str, column: &str) -> String {
    if graph_key.trim().is_empty() {
        column.to_string()
    } else {
        format!("{}.{}", graph_key, column)
    }
}

pub(crate) fn non_blank(graph_key: &str) -> Option<&str> {
    let trimmed = graph_key.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

// =============================================================================
// Shared condition state
// =============================================================================

/// Column key (`level.column` or bare `column`) → aggregate function.
pub type AggregateColumns = BTreeMap<String, AggregateFn>;

/// State shared by the simple and join builders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conditions {
    where_tokens: Vec<ConditionToken>,
    having_tokens: Vec<ConditionToken>,
    order_by: Vec<OrderToken>,
    group_by: Vec<GroupByColumn>,
    limit: Option<String>,
    offset_with_limit: bool,
    aggregates: AggregateColumns,
}

impl Conditions {
    pub fn where_tokens(&self) -> &[ConditionToken] {
        &self.where_tokens
    }

    pub fn having_tokens(&self) -> &[ConditionToken] {
        &self.having_tokens
    }

    pub fn order_by(&self) -> &[OrderToken] {
        &self.order_by
    }

    pub fn group_by(&self) -> &[GroupByColumn] {
        &self.group_by
    }

    pub fn aggregates(&self) -> &AggregateColumns {
        &self.aggregates
    }

    /// Rendered LIMIT value. The offset form wins over a plain limit.
    pub fn limit(&self) -> Option<&str> {
        if self.offset_with_limit {
            Some("?, ?")
        } else {
            self.limit.as_deref()
        }
    }

    pub(crate) fn push_where(&mut self, token: ConditionToken) {
        self.where_tokens.push(token);
    }

    pub(crate) fn push_having(&mut self, token: ConditionToken) {
        self.having_tokens.push(token);
    }

    pub(crate) fn push_order(&mut self, token: OrderToken) {
        self.order_by.push(token);
    }

    pub(crate) fn push_group_by(&mut self, graph_key: Option<&str>, column: &str) {
        self.group_by.push(GroupByColumn {
            graph_key: graph_key.map(str::to_string),
            column: column.to_string(),
        });
    }

    pub(crate) fn set_aggregate(&mut self, key: String, func: AggregateFn) {
        self.aggregates.insert(key, func);
    }
}

// =============================================================================
// Shared builder steps
// =============================================================================

/// Accumulation steps common to the simple and join builders.
///
/// Steps that name a column differ between the two (the join builder takes a
/// graph level as well) and live on the builders themselves.
pub trait ConditionBuilder: Sized {
    #[doc(hidden)]
    fn conditions_mut(&mut self) -> &mut Conditions;

    /// Open a parenthesised WHERE group.
    fn where_open(mut self) -> Self {
        self.conditions_mut().push_where(ConditionToken::Open);
        self
    }

    fn where_close(mut self) -> Self {
        self.conditions_mut().push_where(ConditionToken::Close);
        self
    }

    /// Join the next WHERE clause with OR instead of AND.
    fn or_where(mut self) -> Self {
        self.conditions_mut().push_where(ConditionToken::Or);
        self
    }

    fn having_open(mut self) -> Self {
        self.conditions_mut().push_having(ConditionToken::Open);
        self
    }

    fn having_close(mut self) -> Self {
        self.conditions_mut().push_having(ConditionToken::Close);
        self
    }

    fn or_having(mut self) -> Self {
        self.conditions_mut().push_having(ConditionToken::Or);
        self
    }

    /// Sort the preceding ORDER BY column ascending.
    fn asc(mut self) -> Self {
        self.conditions_mut().push_order(OrderToken::Asc);
        self
    }

    fn desc(mut self) -> Self {
        self.conditions_mut().push_order(OrderToken::Desc);
        self
    }

    fn limit(mut self, limit: u64) -> Self {
        self.conditions_mut().limit = Some(limit.to_string());
        self
    }

    /// `LIMIT ?` with the row count bound by the caller.
    fn limit_param(mut self) -> Self {
        self.conditions_mut().limit = Some("?".into());
        self
    }

    /// `LIMIT ?, ?` with offset and row count bound by the caller.
    fn offset_with_limit(mut self) -> Self {
        self.conditions_mut().offset_with_limit = true;
        self
    }
}
