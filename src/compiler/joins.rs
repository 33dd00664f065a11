//! Join-path assembly for [`JoinQuery`].
//!
//! The anchor table is emitted first. Declared joins are then walked in
//! declaration order; a level is joined only when the request selects or
//! filters on it, and any ancestor that is not yet joined is back-filled
//! right before it:
//!
//! ```text
//! declared: surgeon_department, surgeon_docSpeciality
//! emitted:  hospital_tbl rootObject
//!           INNER JOIN surgeon_tbl surgeon ...             (back-filled)
//!           INNER JOIN dept_tbl surgeon_department ...
//!           LEFT OUTER JOIN doc_speciality_tbl surgeon_docSpeciality ...
//! ```

use std::collections::BTreeSet;

use super::columns::{ColumnStyle, CompileContext};
use crate::builder::{AggregateColumns, JoinQuery};
use crate::condition::JoinType;
use crate::error::{QueryError, QueryResult};
use crate::graph::{is_in_scope, parent_level, reference_name};
use crate::metadata::MetadataProvider;

/// SELECT list and FROM clause of a join query.
pub(crate) struct JoinPlan {
    pub(crate) columns: Vec<String>,
    pub(crate) from: String,
}

struct JoinPlanner<'q, 'a, M: ?Sized> {
    ctx: &'q CompileContext<'a, M>,
    query: &'q JoinQuery,
    aggregates: &'q AggregateColumns,
    emitted: BTreeSet<String>,
    columns: Vec<String>,
    joins: Vec<String>,
}

/// `aggregates` must already be resolved to `level.column` keys.
pub(crate) fn plan_joins<M>(
    ctx: &mut CompileContext<'_, M>,
    query: &JoinQuery,
    aggregates: &AggregateColumns,
) -> QueryResult<JoinPlan>
where
    M: MetadataProvider + ?Sized,
{
    let anchor = query.root_key();
    let conditions = query.conditions();

    // Step 1: levels that can anchor a join
    let filtered: BTreeSet<&str> = conditions
        .where_tokens()
        .iter()
        .filter_map(|token| token.graph_key())
        .collect();
    let mut reachable: BTreeSet<&str> = ctx.requested_levels().collect();
    reachable.extend(query.joins().iter().map(|j| j.graph_key.as_str()));
    reachable.extend(filtered.iter().copied());

    // Step 2: every declared level must be in scope with a reachable parent
    for join in query.joins() {
        let level = join.graph_key.as_str();
        if level == anchor {
            continue;
        }
        if !is_in_scope(level, anchor) {
            return Err(QueryError::GraphKeyNotChildOfRoot {
                root: anchor.to_string(),
                graph_key: level.to_string(),
            });
        }
        let parent = parent_level(level);
        if parent != anchor && !reachable.contains(parent) {
            return Err(QueryError::AddGraphKey {
                graph_key: parent.to_string(),
            });
        }
    }

    // Step 3: fields needed for GROUP BY
    for column in conditions.group_by() {
        let level = column.graph_key.as_deref().unwrap_or(anchor);
        ctx.add_field_for_column(level, &column.column)?;
    }

    // Step 4: anchor table
    let anchor_entity = ctx.entity(anchor)?;
    ctx.ensure_key_fields(anchor)?;
    let emit: BTreeSet<String> = ctx
        .requested_levels()
        .chain(filtered.iter().copied())
        .map(str::to_string)
        .collect();

    let ctx: &CompileContext<'_, M> = ctx;
    let columns = ctx.select_columns(anchor, ColumnStyle::Qualified { anchor }, aggregates)?;
    let mut planner = JoinPlanner {
        ctx,
        query,
        aggregates,
        emitted: BTreeSet::from([anchor.to_string()]),
        columns,
        joins: Vec::new(),
    };

    // Step 5: declared joins the request needs
    for join in query.joins() {
        if emit.contains(&join.graph_key) {
            planner.ensure_joined(&join.graph_key, join.join_type)?;
        }
    }

    let mut from = format!("{} {}", anchor_entity.table, anchor);
    for clause in &planner.joins {
        from.push(' ');
        from.push_str(clause);
    }

    Ok(JoinPlan {
        columns: planner.columns,
        from,
    })
}

impl<M: MetadataProvider + ?Sized> JoinPlanner<'_, '_, M> {
    fn ensure_joined(&mut self, level: &str, join_type: JoinType) -> QueryResult<()> {
        if self.emitted.contains(level) {
            return Ok(());
        }
        let anchor = self.query.root_key();
        if !is_in_scope(level, anchor) {
            return Err(QueryError::GraphKeyNotChildOfRoot {
                root: anchor.to_string(),
                graph_key: level.to_string(),
            });
        }

        let parent = parent_level(level);
        if !self.emitted.contains(parent) {
            let parent_type = self.query.join_type(parent).unwrap_or(join_type);
            self.ensure_joined(parent, parent_type)?;
        }

        let columns =
            self.ctx
                .select_columns(level, ColumnStyle::Qualified { anchor }, self.aggregates)?;
        self.columns.extend(columns);
        self.joins.push(self.join_clause(level, join_type)?);
        self.emitted.insert(level.to_string());
        Ok(())
    }

    /// `<JOIN> <table> <level> ON <parent>.<col> = <level>.<col>`
    fn join_clause(&self, level: &str, join_type: JoinType) -> QueryResult<String> {
        let parent = parent_level(level);
        let reference = reference_name(level);
        let parent_entity = self.ctx.entity(parent)?;
        let child_entity = self.ctx.entity(level)?;

        let pair = parent_entity.first_join_pair(reference).ok_or_else(|| {
            QueryError::AssociationNotDefined {
                parent: parent_entity.name.clone(),
                child: child_entity.name.clone(),
                reference: reference.to_string(),
            }
        })?;

        Ok(format!(
            "{} {} {} ON {}.{} = {}.{}",
            join_type.keyword(),
            child_entity.table,
            level,
            parent,
            pair.parent,
            level,
            pair.child
        ))
    }
}
