#[path = "../common/mod.rs"]
mod common;

use common::{hospital_name_request, hospital_store, validate_sql};
use insta::assert_snapshot;
use sqlshape::prelude::*;

fn compile(graph: &SelectionGraph, query: &SimpleQuery) -> QueryResult<String> {
    QueryCompiler::new(&hospital_store()).select_query(graph, query)
}

#[test]
fn test_primary_key_is_injected() {
    let query = SimpleQuery::builder()
        .graph_key(ROOT_LEVEL)
        .limit(1)
        .build()
        .unwrap();

    let sql = compile(&hospital_name_request(), &query).unwrap();
    assert_snapshot!(sql, @"SELECT hospital_id, name FROM hospital_tbl LIMIT 1");
    validate_sql(&sql).unwrap();
}

#[test]
fn test_where_order_and_limit() {
    let query = SimpleQuery::builder()
        .graph_key(ROOT_LEVEL)
        .where_condition("name", SqlCondition::Like)
        .or_where()
        .where_condition("city", SqlCondition::Equal)
        .order_by("name")
        .desc()
        .order_by("city")
        .limit_param()
        .build()
        .unwrap();

    let sql = compile(&hospital_name_request(), &query).unwrap();
    assert_snapshot!(
        sql,
        @"SELECT hospital_id, name FROM hospital_tbl WHERE name LIKE ? OR city = ? ORDER BY name DESC, city LIMIT ?"
    );
    validate_sql(&sql).unwrap();
}

#[test]
fn test_offset_form_overrides_limit() {
    let query = SimpleQuery::builder()
        .graph_key(ROOT_LEVEL)
        .limit(50)
        .offset_with_limit()
        .build()
        .unwrap();

    let sql = compile(&hospital_name_request(), &query).unwrap();
    assert!(sql.ends_with("FROM hospital_tbl LIMIT ?, ?"), "{}", sql);
}

#[test]
fn test_aggregate_suppresses_key_injection() {
    let graph = SelectionGraph::new("Hospital").with_level("surgeon", "Surgeon");
    let query = SimpleQuery::builder()
        .graph_key("surgeon")
        .aggregate_column(AggregateFn::Count, "surgeon_id")
        .build()
        .unwrap();

    let sql = compile(&graph, &query).unwrap();
    assert_snapshot!(sql, @"SELECT COUNT(surgeon_id) AS surgeon_id FROM surgeon_tbl");
    validate_sql(&sql).unwrap();
}

#[test]
fn test_group_by_column_is_selected() {
    let graph = SelectionGraph::new("Hospital").with_level("surgeon", "Surgeon");
    let query = SimpleQuery::builder()
        .graph_key("surgeon")
        .aggregate_column(AggregateFn::Count, "surgeon_id")
        .group_by("hospital_id")
        .having_aggregate(AggregateFn::Count, "surgeon_id", SqlCondition::GreaterThan)
        .order_by_aggregate(AggregateFn::Count, "surgeon_id")
        .desc()
        .build()
        .unwrap();

    let sql = compile(&graph, &query).unwrap();
    assert_snapshot!(
        sql,
        @"SELECT hospital_id, COUNT(surgeon_id) AS surgeon_id FROM surgeon_tbl GROUP BY hospital_id HAVING COUNT(surgeon_id) > ? ORDER BY COUNT(surgeon_id) DESC"
    );
    validate_sql(&sql).unwrap();
}

/// Adjacent HAVING clauses are joined with AND, the same as WHERE clauses.
/// Older generators emitted them back to back with no separator.
#[test]
fn test_having_clauses_are_joined_with_and() {
    let query = SimpleQuery::builder()
        .graph_key(ROOT_LEVEL)
        .group_by("city")
        .having_aggregate(AggregateFn::Count, "hospital_id", SqlCondition::GreaterThan)
        .having("city", SqlCondition::IsNotNull)
        .build()
        .unwrap();

    let sql = compile(&hospital_name_request(), &query).unwrap();
    assert_snapshot!(
        sql,
        @"SELECT hospital_id, city, name FROM hospital_tbl GROUP BY city HAVING COUNT(hospital_id) > ? AND city IS NOT NULL"
    );
    validate_sql(&sql).unwrap();
}

#[test]
fn test_sub_query_filter() {
    let query = SimpleQuery::builder()
        .graph_key(ROOT_LEVEL)
        .where_sub_query(
            "hospital_id",
            SubQueryCondition::In,
            "SELECT hospital_id FROM surgeon_tbl WHERE full_name LIKE ?",
        )
        .build()
        .unwrap();

    let sql = compile(&hospital_name_request(), &query).unwrap();
    assert_snapshot!(
        sql,
        @"SELECT hospital_id, name FROM hospital_tbl WHERE hospital_id IN (SELECT hospital_id FROM surgeon_tbl WHERE full_name LIKE ?)"
    );
    validate_sql(&sql).unwrap();
}

#[test]
fn test_compiling_twice_is_identical_and_leaves_graph_untouched() {
    let graph = hospital_name_request();
    let before = graph.clone();
    let query = SimpleQuery::builder()
        .graph_key(ROOT_LEVEL)
        .group_by("city")
        .build()
        .unwrap();

    let first = compile(&graph, &query).unwrap();
    let second = compile(&graph, &query).unwrap();
    assert_eq!(first, second);
    assert_eq!(graph, before);
}

#[test]
fn test_api_name_and_getter_fields_resolve() {
    let graph = SelectionGraph::new("Hospital").with_fields(ROOT_LEVEL, ["hospitalName", "getCity"]);
    let query = SimpleQuery::builder().graph_key(ROOT_LEVEL).build().unwrap();

    let sql = compile(&graph, &query).unwrap();
    assert_snapshot!(sql, @"SELECT hospital_id, city, name FROM hospital_tbl");
}

#[test]
fn test_unknown_field() {
    let graph = SelectionGraph::new("Hospital").with_fields(ROOT_LEVEL, ["nickname"]);
    let query = SimpleQuery::builder().graph_key(ROOT_LEVEL).build().unwrap();

    assert_eq!(
        compile(&graph, &query),
        Err(QueryError::field_not_found("nickname", "Hospital"))
    );
}

#[test]
fn test_unknown_aggregate_column() {
    let query = SimpleQuery::builder()
        .graph_key(ROOT_LEVEL)
        .aggregate_column(AggregateFn::Sum, "salary")
        .build()
        .unwrap();

    assert_eq!(
        compile(&hospital_name_request(), &query),
        Err(QueryError::AggregateColumnNotFound {
            column: "salary".into(),
            entity: "Hospital".into(),
        })
    );
}

#[test]
fn test_unknown_graph_level() {
    let query = SimpleQuery::builder().graph_key("pharmacy").build().unwrap();
    assert_eq!(
        compile(&hospital_name_request(), &query),
        Err(QueryError::UnknownGraphLevel {
            graph_key: "pharmacy".into()
        })
    );
}

#[test]
fn test_level_resolved_through_metadata_graph_map() {
    // The request never mentions surgeon_department; metadata knows it.
    let graph = SelectionGraph::new("Hospital");
    let query = SimpleQuery::builder()
        .graph_key("surgeon_department")
        .build()
        .unwrap();

    let sql = compile(&graph, &query).unwrap();
    assert_snapshot!(sql, @"SELECT dept_id FROM dept_tbl");
}

#[test]
fn test_empty_selection_yields_empty_sql() {
    let store = MetadataStore::from_entities(vec![EntityDef::new("AuditLog", "audit_tbl")
        .root()
        .field("message", "message")])
    .unwrap();
    let graph = SelectionGraph::new("AuditLog");
    let query = SimpleQuery::builder().graph_key(ROOT_LEVEL).build().unwrap();

    let sql = QueryCompiler::new(&store).select_query(&graph, &query).unwrap();
    assert_eq!(sql, "");
}

/// A WHERE group opened after a clause is preceded by AND, so the group
/// combines with the clause before it instead of running into it.
#[test]
fn test_where_group_after_clause_is_joined_with_and() {
    let query = SimpleQuery::builder()
        .graph_key(ROOT_LEVEL)
        .where_condition("city", SqlCondition::Equal)
        .where_open()
        .where_condition("name", SqlCondition::Like)
        .or_where()
        .where_condition("name", SqlCondition::IsNull)
        .where_close()
        .build()
        .unwrap();

    let sql = compile(&hospital_name_request(), &query).unwrap();
    assert_snapshot!(
        sql,
        @"SELECT hospital_id, name FROM hospital_tbl WHERE city = ? AND (name LIKE ? OR name IS NULL)"
    );
    validate_sql(&sql).unwrap();
}

#[test]
fn test_aggregate_key_qualified_with_own_level() {
    let spec: QuerySpec = serde_json::from_str(
        r#"{
            "kind": "simple",
            "query": {
                "graph_key": "rootObject",
                "conditions": {
                    "aggregates": {"rootObject.hospital_id": "count"},
                    "group_by": [{"column": "name"}]
                }
            }
        }"#,
    )
    .unwrap();

    let store = hospital_store();
    let sql = QueryCompiler::new(&store)
        .compile(&hospital_name_request(), &spec)
        .unwrap();
    assert_snapshot!(
        sql,
        @"SELECT name, COUNT(hospital_id) AS hospital_id FROM hospital_tbl GROUP BY name"
    );
    validate_sql(&sql).unwrap();
}

#[test]
fn test_aggregate_key_for_another_level_is_rejected() {
    let query = SimpleQuery::builder()
        .graph_key(ROOT_LEVEL)
        .aggregate_column(AggregateFn::Count, "surgeon.surgeon_id")
        .build()
        .unwrap();

    assert_eq!(
        compile(&hospital_name_request(), &query),
        Err(QueryError::AggregateColumnNotFound {
            column: "surgeon.surgeon_id".into(),
            entity: "Hospital".into(),
        })
    );
}
