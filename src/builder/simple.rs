//! Builder for queries against a single graph level.
//!
//! Columns are referenced bare (`full_name`, not `surgeon.full_name`)
//! because the generated statement reads from one table without an alias.

use serde::{Deserialize, Serialize};

use super::{ConditionBuilder, ConditionToken, Conditions, OrderToken};
use crate::condition::{AggregateFn, SqlCondition, SubQueryCondition};
use crate::error::{QueryError, QueryResult};

/// A finished single-entity query description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleQuery {
    graph_key: String,
    #[serde(default)]
    conditions: Conditions,
}

impl SimpleQuery {
    pub fn builder() -> SimpleQueryBuilder {
        SimpleQueryBuilder::default()
    }

    pub fn graph_key(&self) -> &str {
        &self.graph_key
    }

    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }
}

/// Fluent builder for [`SimpleQuery`].
///
/// # Example
///
/// ```
/// use sqlshape::builder::{ConditionBuilder, SimpleQuery};
/// use sqlshape::condition::SqlCondition;
///
/// let query = SimpleQuery::builder()
///     .graph_key("rootObject")
///     .where_condition("name", SqlCondition::Like)
///     .order_by("name")
///     .asc()
///     .limit(10)
///     .build()
///     .unwrap();
///
/// assert_eq!(query.graph_key(), "rootObject");
/// ```
#[derive(Debug, Clone, Default)]
#[must_use = "builders have no effect until used"]
pub struct SimpleQueryBuilder {
    graph_key: Option<String>,
    conditions: Conditions,
}

impl ConditionBuilder for SimpleQueryBuilder {
    fn conditions_mut(&mut self) -> &mut Conditions {
        &mut self.conditions
    }
}

impl SimpleQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph level whose entity the query reads.
    pub fn graph_key(mut self, graph_key: &str) -> Self {
        self.graph_key = Some(graph_key.into());
        self
    }

    pub fn where_condition(mut self, column: &str, condition: SqlCondition) -> Self {
        let sql = format!("{} {}", column, condition.to_sql());
        self.conditions
            .push_where(ConditionToken::clause(None, sql));
        self
    }

    pub fn where_sub_query(
        mut self,
        column: &str,
        condition: SubQueryCondition,
        sub_query: &str,
    ) -> Self {
        let sql = format!("{} {}", column, condition.to_sql(sub_query));
        self.conditions
            .push_where(ConditionToken::clause(None, sql));
        self
    }

    pub fn order_by(mut self, column: &str) -> Self {
        self.conditions.push_order(OrderToken::Column(column.into()));
        self
    }

    /// Order by an aggregate, e.g. `COUNT(surgeon_id)`.
    pub fn order_by_aggregate(mut self, func: AggregateFn, column: &str) -> Self {
        self.conditions
            .push_order(OrderToken::Column(func.apply(column)));
        self
    }

    pub fn group_by(mut self, column: &str) -> Self {
        self.conditions.push_group_by(None, column);
        self
    }

    pub fn having(mut self, column: &str, condition: SqlCondition) -> Self {
        let sql = format!("{} {}", column, condition.to_sql());
        self.conditions
            .push_having(ConditionToken::clause(None, sql));
        self
    }

    /// HAVING over an aggregate, e.g. `COUNT(surgeon_id) > ?`.
    pub fn having_aggregate(
        mut self,
        func: AggregateFn,
        column: &str,
        condition: SqlCondition,
    ) -> Self {
        let sql = format!("{} {}", func.apply(column), condition.to_sql());
        self.conditions
            .push_having(ConditionToken::clause(None, sql));
        self
    }

    pub fn having_sub_query(
        mut self,
        column: &str,
        condition: SubQueryCondition,
        sub_query: &str,
    ) -> Self {
        let sql = format!("{} {}", column, condition.to_sql(sub_query));
        self.conditions
            .push_having(ConditionToken::clause(None, sql));
        self
    }

    /// Select `column` wrapped in `func`. Once any aggregate is present the
    /// entity's key columns are no longer added automatically.
    pub fn aggregate_column(mut self, func: AggregateFn, column: &str) -> Self {
        self.conditions.set_aggregate(column.to_string(), func);
        self
    }

    pub fn build(self) -> QueryResult<SimpleQuery> {
        let graph_key = self
            .graph_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(QueryError::MissingRequiredField {
                builder: "SimpleQuery",
                field: "graph_key",
            })?;
        log::trace!("Built simple query for graph level {}", graph_key);
        Ok(SimpleQuery {
            graph_key,
            conditions: self.conditions,
        })
    }
}
