#[path = "../common/mod.rs"]
mod common;

use common::{hospital_name_request, hospital_request, hospital_store, validate_sql};
use insta::assert_snapshot;
use sqlshape::prelude::*;

fn compile(graph: &SelectionGraph, query: &NativeQuery) -> QueryResult<String> {
    QueryCompiler::new(&hospital_store()).native_query(graph, query)
}

const HOSPITAL_SURGEON_TEMPLATE: &str = "FROM hospital_tbl ${h} \
    INNER JOIN surgeon_tbl ${s} ON ${h}.hospital_id = ${s}.hospital_id";

#[test]
fn test_simple_template() {
    let query = NativeQuery::simple()
        .graph_key(ROOT_LEVEL)
        .template("  FROM hospital_tbl WHERE city = ?\n")
        .build()
        .unwrap();

    let sql = compile(&hospital_name_request(), &query).unwrap();
    assert_snapshot!(sql, @"SELECT hospital_id, name FROM hospital_tbl WHERE city = ?");
    validate_sql(&sql).unwrap();
}

#[test]
fn test_simple_template_with_aggregate() {
    let graph = SelectionGraph::new("Hospital").with_level("surgeon", "Surgeon");
    let query = NativeQuery::simple()
        .graph_key("surgeon")
        .template("FROM surgeon_tbl WHERE hospital_id = ?")
        .aggregate_column(AggregateFn::Count, "surgeon_id")
        .build()
        .unwrap();

    let sql = compile(&graph, &query).unwrap();
    assert_snapshot!(
        sql,
        @"SELECT COUNT(surgeon_id) AS surgeon_id FROM surgeon_tbl WHERE hospital_id = ?"
    );
}

#[test]
fn test_join_template_substitutes_aliases() {
    let graph = hospital_request(&["name", "surgeon/fullName"]);
    let query = NativeQuery::join()
        .root_key(ROOT_LEVEL)
        .template(&format!("{} WHERE ${{s}}.full_name LIKE ?", HOSPITAL_SURGEON_TEMPLATE))
        .alias("h", ROOT_LEVEL)
        .alias("s", "surgeon")
        .build()
        .unwrap();

    let sql = compile(&graph, &query).unwrap();
    assert_snapshot!(
        sql,
        @"SELECT rootObject.hospital_id AS hospital_id, rootObject.name AS name, surgeon.surgeon_id AS surgeon_surgeon_id, surgeon.hospital_id AS surgeon_hospital_id, surgeon.full_name AS surgeon_full_name FROM hospital_tbl rootObject INNER JOIN surgeon_tbl surgeon ON rootObject.hospital_id = surgeon.hospital_id WHERE surgeon.full_name LIKE ?"
    );
    validate_sql(&sql).unwrap();
}

#[test]
fn test_join_template_aggregate_keys_use_aliases() {
    let graph = hospital_request(&["name", "surgeon/fullName"]);
    let query = NativeQuery::join()
        .root_key(ROOT_LEVEL)
        .template(&format!(
            "{} GROUP BY ${{h}}.name, ${{s}}.full_name",
            HOSPITAL_SURGEON_TEMPLATE
        ))
        .alias("h", ROOT_LEVEL)
        .alias("s", "surgeon")
        .aggregate_column(AggregateFn::Count, "${s}.surgeon_id")
        .build()
        .unwrap();

    let sql = compile(&graph, &query).unwrap();
    assert_snapshot!(
        sql,
        @"SELECT rootObject.name AS name, surgeon.full_name AS surgeon_full_name, COUNT(surgeon.surgeon_id) AS surgeon_surgeon_id FROM hospital_tbl rootObject INNER JOIN surgeon_tbl surgeon ON rootObject.hospital_id = surgeon.hospital_id GROUP BY rootObject.name, surgeon.full_name"
    );
    validate_sql(&sql).unwrap();
}

#[test]
fn test_unrequested_alias_levels_are_skipped() {
    let query = NativeQuery::join()
        .root_key(ROOT_LEVEL)
        .template("FROM surgeon_tbl ${s}")
        .alias("s", "surgeon")
        .build()
        .unwrap();

    assert_eq!(compile(&hospital_name_request(), &query).unwrap(), "");
}

#[test]
fn test_unknown_aggregate_in_template_query() {
    let graph = hospital_request(&["surgeon/fullName"]);
    let query = NativeQuery::join()
        .root_key(ROOT_LEVEL)
        .template(HOSPITAL_SURGEON_TEMPLATE)
        .alias("h", ROOT_LEVEL)
        .alias("s", "surgeon")
        .aggregate_column(AggregateFn::Max, "${s}.salary")
        .build()
        .unwrap();

    assert_eq!(
        compile(&graph, &query),
        Err(QueryError::AggregateColumnNotFound {
            column: "salary".into(),
            entity: "Surgeon".into(),
        })
    );
}

#[test]
fn test_blank_template_from_json_is_rejected() {
    let spec: QuerySpec = serde_json::from_str(
        r#"{"kind": "native", "query": {"form": "simple", "graph_key": "rootObject", "template": "   "}}"#,
    )
    .unwrap();

    let store = hospital_store();
    let result = QueryCompiler::new(&store).compile(&hospital_name_request(), &spec);
    assert_eq!(result, Err(QueryError::EmptyQueryTemplate));
}

#[test]
fn test_alias_outside_root_scope() {
    let graph = hospital_request(&["name", "surgeon/fullName"]);
    let query = NativeQuery::join()
        .root_key("surgeon")
        .template(
            "FROM surgeon_tbl ${s} INNER JOIN hospital_tbl ${h} ON ${h}.hospital_id = ${s}.hospital_id",
        )
        .alias("s", "surgeon")
        .alias("h", ROOT_LEVEL)
        .build()
        .unwrap();

    assert_eq!(
        compile(&graph, &query),
        Err(QueryError::GraphKeyNotChildOfRoot {
            root: "surgeon".into(),
            graph_key: ROOT_LEVEL.into(),
        })
    );
}
