//! SELECT-list generation for hand-written native templates.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::columns::{ColumnStyle, CompileContext};
use crate::builder::{AggregateColumns, TableAlias};
use crate::error::{QueryError, QueryResult};
use crate::metadata::MetadataProvider;

static ALIAS_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{(\w+)\}").unwrap());

/// Replace every `${alias}` with its graph level. Unknown aliases are left
/// untouched so the database reports them.
pub(crate) fn substitute_aliases(text: &str, aliases: &[TableAlias]) -> String {
    ALIAS_PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            aliases
                .iter()
                .find(|a| a.alias == caps[1])
                .map(|a| a.graph_key.clone())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn require_template(template: &str) -> QueryResult<&str> {
    let trimmed = template.trim();
    if trimmed.is_empty() {
        return Err(QueryError::EmptyQueryTemplate);
    }
    Ok(trimmed)
}

pub(crate) fn compile_simple<M>(
    ctx: &CompileContext<'_, M>,
    graph_key: &str,
    template: &str,
    aggregates: &AggregateColumns,
) -> QueryResult<String>
where
    M: MetadataProvider + ?Sized,
{
    let template = require_template(template)?;
    let aggregates = ctx.resolve_aggregates(aggregates, graph_key, ColumnStyle::Bare)?;

    let columns = ctx.select_columns(graph_key, ColumnStyle::Bare, &aggregates)?;
    if columns.is_empty() {
        log::debug!("No columns selected for native query on {}", graph_key);
        return Ok(String::new());
    }
    Ok(format!("SELECT {} {}", columns.join(", "), template))
}

pub(crate) fn compile_join<M>(
    ctx: &CompileContext<'_, M>,
    root_key: &str,
    template: &str,
    aliases: &[TableAlias],
    aggregates: &AggregateColumns,
) -> QueryResult<String>
where
    M: MetadataProvider + ?Sized,
{
    let template = substitute_aliases(require_template(template)?, aliases);
    let aggregates: AggregateColumns = aggregates
        .iter()
        .map(|(key, func)| (substitute_aliases(key, aliases), *func))
        .collect();
    let aggregates = ctx.resolve_aggregates(
        &aggregates,
        root_key,
        ColumnStyle::Qualified { anchor: root_key },
    )?;

    let mut seen = BTreeSet::new();
    let mut columns = Vec::new();
    for alias in aliases {
        let level = alias.graph_key.as_str();
        if ctx.graph().entity_for(level).is_none() || !seen.insert(level) {
            continue;
        }
        columns.extend(ctx.select_columns(
            level,
            ColumnStyle::Qualified { anchor: root_key },
            &aggregates,
        )?);
    }

    if columns.is_empty() {
        log::debug!("No aliased level of {} was requested", root_key);
        return Ok(String::new());
    }
    Ok(format!("SELECT {} {}", columns.join(", "), template))
}
