//! Builder for queries spanning several graph levels.
//!
//! The caller declares every join the resolver may need up front. At compile
//! time only the levels the request actually selects (or filters on) are
//! joined, so one declaration serves every request shape.

use serde::{Deserialize, Serialize};

use super::{non_blank, qualify, ConditionBuilder, ConditionToken, Conditions, OrderToken};
use crate::condition::{AggregateFn, JoinType, SqlCondition, SubQueryCondition};
use crate::error::{QueryError, QueryResult};

/// A declared join: the graph level to attach and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphJoin {
    pub graph_key: String,
    #[serde(default)]
    pub join_type: JoinType,
}

/// A finished multi-entity query description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinQuery {
    root_key: String,
    #[serde(default)]
    joins: Vec<GraphJoin>,
    #[serde(default)]
    conditions: Conditions,
}

impl JoinQuery {
    pub fn builder() -> JoinQueryBuilder {
        JoinQueryBuilder::default()
    }

    /// Anchor level: its table is the FROM table and aliases are relative to it.
    pub fn root_key(&self) -> &str {
        &self.root_key
    }

    /// Declared joins in emission order.
    pub fn joins(&self) -> &[GraphJoin] {
        &self.joins
    }

    pub fn join_type(&self, graph_key: &str) -> Option<JoinType> {
        self.joins
            .iter()
            .find(|j| j.graph_key == graph_key)
            .map(|j| j.join_type)
    }

    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }
}

/// Fluent builder for [`JoinQuery`].
///
/// Column arguments are paired with the graph level they belong to; an empty
/// graph level leaves the column unqualified.
///
/// ```
/// use sqlshape::builder::{ConditionBuilder, JoinQuery};
/// use sqlshape::condition::{JoinType, SqlCondition};
///
/// let query = JoinQuery::builder()
///     .root_key("rootObject")
///     .join("surgeon", JoinType::Inner)
///     .join("surgeon_department", JoinType::LeftOuter)
///     .where_condition("surgeon", "full_name", SqlCondition::Like)
///     .build()
///     .unwrap();
///
/// assert_eq!(query.joins().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
#[must_use = "builders have no effect until used"]
pub struct JoinQueryBuilder {
    root_key: Option<String>,
    joins: Vec<GraphJoin>,
    conditions: Conditions,
}

impl ConditionBuilder for JoinQueryBuilder {
    fn conditions_mut(&mut self) -> &mut Conditions {
        &mut self.conditions
    }
}

impl JoinQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root_key(mut self, root_key: &str) -> Self {
        self.root_key = Some(root_key.into());
        self
    }

    /// Declare a join. Declaring a level again replaces its join type but
    /// keeps its original position.
    pub fn join(mut self, graph_key: &str, join_type: JoinType) -> Self {
        match self.joins.iter_mut().find(|j| j.graph_key == graph_key) {
            Some(existing) => existing.join_type = join_type,
            None => self.joins.push(GraphJoin {
                graph_key: graph_key.into(),
                join_type,
            }),
        }
        self
    }

    pub fn where_condition(
        mut self,
        graph_key: &str,
        column: &str,
        condition: SqlCondition,
    ) -> Self {
        let sql = format!("{} {}", qualify(graph_key, column), condition.to_sql());
        self.conditions
            .push_where(ConditionToken::clause(non_blank(graph_key), sql));
        self
    }

    pub fn where_sub_query(
        mut self,
        graph_key: &str,
        column: &str,
        condition: SubQueryCondition,
        sub_query: &str,
    ) -> Self {
        let sql = format!(
            "{} {}",
            qualify(graph_key, column),
            condition.to_sql(sub_query)
        );
        self.conditions
            .push_where(ConditionToken::clause(non_blank(graph_key), sql));
        self
    }

    pub fn order_by(mut self, graph_key: &str, column: &str) -> Self {
        self.conditions
            .push_order(OrderToken::Column(qualify(graph_key, column)));
        self
    }

    pub fn order_by_aggregate(mut self, func: AggregateFn, graph_key: &str, column: &str) -> Self {
        self.conditions
            .push_order(OrderToken::Column(func.apply(&qualify(graph_key, column))));
        self
    }

    pub fn group_by(mut self, graph_key: &str, column: &str) -> Self {
        self.conditions.push_group_by(non_blank(graph_key), column);
        self
    }

    pub fn having(mut self, graph_key: &str, column: &str, condition: SqlCondition) -> Self {
        let sql = format!("{} {}", qualify(graph_key, column), condition.to_sql());
        self.conditions
            .push_having(ConditionToken::clause(non_blank(graph_key), sql));
        self
    }

    pub fn having_aggregate(
        mut self,
        func: AggregateFn,
        graph_key: &str,
        column: &str,
        condition: SqlCondition,
    ) -> Self {
        let sql = format!(
            "{} {}",
            func.apply(&qualify(graph_key, column)),
            condition.to_sql()
        );
        self.conditions
            .push_having(ConditionToken::clause(non_blank(graph_key), sql));
        self
    }

    pub fn having_sub_query(
        mut self,
        graph_key: &str,
        column: &str,
        condition: SubQueryCondition,
        sub_query: &str,
    ) -> Self {
        let sql = format!(
            "{} {}",
            qualify(graph_key, column),
            condition.to_sql(sub_query)
        );
        self.conditions
            .push_having(ConditionToken::clause(non_blank(graph_key), sql));
        self
    }

    /// Select `graph_key.column` wrapped in `func`.
    pub fn aggregate_column(mut self, func: AggregateFn, graph_key: &str, column: &str) -> Self {
        self.conditions
            .set_aggregate(qualify(graph_key, column), func);
        self
    }

    pub fn build(self) -> QueryResult<JoinQuery> {
        let root_key = self
            .root_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(QueryError::MissingRequiredField {
                builder: "JoinQuery",
                field: "root_key",
            })?;
        log::trace!(
            "Built join query rooted at {} with {} declared joins",
            root_key,
            self.joins.len()
        );
        Ok(JoinQuery {
            root_key,
            joins: self.joins,
            conditions: self.conditions,
        })
    }
}
