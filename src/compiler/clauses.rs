//! Clause stitching: turning accumulated tokens into the final statement.

use crate::builder::{ConditionToken, Conditions, OrderToken};

/// Render WHERE or HAVING tokens.
///
/// `AND` is placed between anything that closes an operand (a clause or `)`)
/// and anything that opens one (a clause or `(`). Parentheses hug their
/// contents; `OR` is surrounded by spaces.
pub(crate) fn render_conditions(tokens: &[ConditionToken]) -> String {
    let mut out = String::new();
    let mut prev: Option<&ConditionToken> = None;

    for token in tokens {
        let separator = match (prev, token) {
            (None, _) => "",
            (Some(ConditionToken::Open), _) => "",
            (Some(_), ConditionToken::Close) => "",
            (
                Some(ConditionToken::Clause { .. } | ConditionToken::Close),
                ConditionToken::Clause { .. } | ConditionToken::Open,
            ) => " AND ",
            _ => " ",
        };
        out.push_str(separator);
        out.push_str(match token {
            ConditionToken::Clause { sql, .. } => sql.as_str(),
            ConditionToken::Open => "(",
            ConditionToken::Close => ")",
            ConditionToken::Or => "OR",
        });
        prev = Some(token);
    }

    out
}

/// Render ORDER BY tokens. Directions attach to the preceding column.
pub(crate) fn render_order_by(tokens: &[OrderToken]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            OrderToken::Column(column) => {
                if !out.is_empty() {
                    out.push_str(", ");
                }
                out.push_str(column);
            }
            OrderToken::Asc => out.push_str(" ASC"),
            OrderToken::Desc => out.push_str(" DESC"),
        }
    }
    out.trim_start().to_string()
}

/// `SELECT <columns> FROM <from> [WHERE ..] [GROUP BY ..] [HAVING ..]
/// [ORDER BY ..] [LIMIT ..]`, or an empty string when nothing is selected.
pub(crate) fn assemble(columns: &[String], from: &str, conditions: &Conditions) -> String {
    if columns.is_empty() {
        log::debug!("No columns selected from {}; skipping query", from);
        return String::new();
    }

    let mut sql = format!("SELECT {} FROM {}", columns.join(", "), from);

    let filter = render_conditions(conditions.where_tokens());
    if !filter.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&filter);
    }

    let group_by: Vec<String> = conditions.group_by().iter().map(ToString::to_string).collect();
    if !group_by.is_empty() {
        sql.push_str(" GROUP BY ");
        sql.push_str(&group_by.join(", "));
    }

    let having = render_conditions(conditions.having_tokens());
    if !having.is_empty() {
        sql.push_str(" HAVING ");
        sql.push_str(&having);
    }

    let order_by = render_order_by(conditions.order_by());
    if !order_by.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&order_by);
    }

    if let Some(limit) = conditions.limit() {
        sql.push_str(" LIMIT ");
        sql.push_str(limit);
    }

    sql
}
