//! Condition and operator vocabulary shared by every builder.
//!
//! These enums only render SQL fragments. Values are never inlined: every
//! comparison emits `?` placeholders which the caller binds in the order the
//! conditions were appended.

use serde::{Deserialize, Serialize};

// =============================================================================
// Comparisons against bound parameters
// =============================================================================

/// A comparison whose right-hand side is one or more `?` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlCondition {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Like,
    Between,
    IsNull,
    IsNotNull,
    /// `IN` with the given number of parameters.
    In(usize),
}

impl SqlCondition {
    /// Render the operator and its placeholders, e.g. `= ?` or `IN (?, ?)`.
    pub fn to_sql(&self) -> String {
        match self {
            SqlCondition::Equal => "= ?".into(),
            SqlCondition::NotEqual => "!= ?".into(),
            SqlCondition::GreaterThan => "> ?".into(),
            SqlCondition::LessThan => "< ?".into(),
            SqlCondition::GreaterThanOrEqual => ">= ?".into(),
            SqlCondition::LessThanOrEqual => "<= ?".into(),
            SqlCondition::Like => "LIKE ?".into(),
            SqlCondition::Between => "BETWEEN ? AND ?".into(),
            SqlCondition::IsNull => "IS NULL".into(),
            SqlCondition::IsNotNull => "IS NOT NULL".into(),
            SqlCondition::In(n) => {
                let params = vec!["?"; (*n).max(1)];
                format!("IN ({})", params.join(", "))
            }
        }
    }
}

// =============================================================================
// Comparisons against a sub-query
// =============================================================================

/// A comparison whose right-hand side is a caller supplied sub-query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubQueryCondition {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Like,
    In,
    IsNull,
    IsNotNull,
}

impl SubQueryCondition {
    /// Render the operator applied to `sub_query`, e.g. `IN (SELECT ...)`.
    ///
    /// `IsNull` and `IsNotNull` take no operand, so the sub-query is dropped.
    pub fn to_sql(&self, sub_query: &str) -> String {
        let op = match self {
            SubQueryCondition::Equal => "=",
            SubQueryCondition::NotEqual => "!=",
            SubQueryCondition::GreaterThan => ">",
            SubQueryCondition::LessThan => "<",
            SubQueryCondition::GreaterThanOrEqual => ">=",
            SubQueryCondition::LessThanOrEqual => "<=",
            SubQueryCondition::Like => "LIKE",
            SubQueryCondition::In => "IN",
            SubQueryCondition::IsNull => return "IS NULL".into(),
            SubQueryCondition::IsNotNull => return "IS NOT NULL".into(),
        };
        format!("{} ({})", op, sub_query.trim())
    }
}

// =============================================================================
// Aggregates
// =============================================================================

/// Aggregate function used to override a plain column selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFn {
    Avg,
    Sum,
    Count,
    Max,
    Min,
}

impl AggregateFn {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFn::Avg => "AVG",
            AggregateFn::Sum => "SUM",
            AggregateFn::Count => "COUNT",
            AggregateFn::Max => "MAX",
            AggregateFn::Min => "MIN",
        }
    }

    /// Wrap an expression: `Count.apply("surgeon.surgeon_id")` gives
    /// `COUNT(surgeon.surgeon_id)`.
    pub fn apply(&self, expr: &str) -> String {
        format!("{}({})", self.name(), expr)
    }
}

// =============================================================================
// Joins
// =============================================================================

/// Join used to attach a graph level to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    #[default]
    Inner,
    LeftOuter,
    RightOuter,
}

impl JoinType {
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::LeftOuter => "LEFT OUTER JOIN",
            JoinType::RightOuter => "RIGHT OUTER JOIN",
        }
    }
}
