#[path = "../common/mod.rs"]
mod common;

use std::collections::BTreeSet;
use std::path::PathBuf;

use common::{hospital_request, hospital_store};
use sqlshape::metadata::{MetadataError, MetadataProviderExt};
use sqlshape::prelude::*;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/hospital.toml")
}

fn file_store() -> MetadataStore {
    MetadataStore::from_file(fixture_path()).unwrap()
}

#[test]
fn test_graph_levels_from_file() {
    let store = file_store();
    assert_eq!(store.root_entities(), vec!["Hospital"]);

    let levels: Vec<(&str, &str)> = store
        .root_graph_map("Hospital")
        .unwrap()
        .iter()
        .map(|(level, entity)| (level.as_str(), entity.as_str()))
        .collect();
    assert_eq!(
        levels,
        vec![
            ("rootObject", "Hospital"),
            ("surgeon", "Surgeon"),
            ("surgeon_department", "Department"),
            ("surgeon_docSpeciality", "DocSpeciality"),
            ("surgeon_docSpeciality_speciality", "Speciality"),
            ("ward", "Ward"),
        ]
    );
}

#[test]
fn test_entity_lookups_from_file() {
    let store = file_store();

    let hospital = store.require_entity("Hospital").unwrap();
    assert_eq!(hospital.column_for_field("hospitalId"), Some("hospital_id"));
    assert_eq!(hospital.field_for_column("city"), Some("city"));
    assert_eq!(hospital.api_names.get("hospitalName").map(String::as_str), Some("name"));
    assert!(hospital.first_join_pair("ward").is_none());

    let surgeon = store.require_entity("Surgeon").unwrap();
    assert_eq!(surgeon.join_key_fields, vec!["surgeonId", "hospitalId"]);
    let pair = surgeon.first_join_pair("docSpeciality").unwrap();
    assert_eq!((pair.parent.as_str(), pair.child.as_str()), ("surgeon_id", "surgeon_id"));

    assert_eq!(
        store.entity_for_level("Hospital", "surgeon_docSpeciality_speciality"),
        Some("Speciality")
    );
    assert_eq!(
        store.require_entity("Pharmacy").unwrap_err(),
        QueryError::EntityMetadataMissing {
            entity: "Pharmacy".into()
        }
    );
}

#[test]
fn test_file_and_code_metadata_compile_alike() {
    let graph = hospital_request(&["name", "surgeon/department/deptName"]);
    let query = JoinQuery::builder()
        .root_key(ROOT_LEVEL)
        .join("surgeon", JoinType::Inner)
        .join("surgeon_department", JoinType::LeftOuter)
        .build()
        .unwrap();

    let from_file = QueryCompiler::new(&file_store())
        .join_query(&graph, &query)
        .unwrap();
    let from_code = QueryCompiler::new(&hospital_store())
        .join_query(&graph, &query)
        .unwrap();
    assert_eq!(from_file, from_code);
}

#[test]
fn test_selection_paths() {
    let graph = SelectionGraph::from_selection_paths(
        &file_store(),
        "Hospital",
        &["name", "surgeon/department/deptName", "ward"],
    )
    .unwrap();

    assert_eq!(
        graph.graph_levels().collect::<Vec<_>>(),
        vec!["rootObject", "surgeon", "surgeon_department"]
    );
    assert_eq!(graph.fields_for("surgeon"), Some(&BTreeSet::new()));
    assert_eq!(
        graph.fields_for("surgeon_department"),
        Some(&BTreeSet::from(["deptName".to_string()]))
    );
    assert_eq!(graph.entity_for("ward"), Some("Ward"));
    assert_eq!(graph.fields_for("ward"), None);
}

#[test]
fn test_selection_path_through_unknown_level() {
    let result =
        SelectionGraph::from_selection_paths(&file_store(), "Hospital", &["pharmacy/name"]);
    assert_eq!(
        result,
        Err(QueryError::UnknownGraphLevel {
            graph_key: "pharmacy".into()
        })
    );
}

#[test]
fn test_selection_paths_need_a_root_entity() {
    let result = SelectionGraph::from_selection_paths(&file_store(), "Surgeon", &["fullName"]);
    assert_eq!(
        result,
        Err(QueryError::EntityMetadataMissing {
            entity: "Surgeon".into()
        })
    );
    assert!(matches!(
        file_store().root_graph_map("Surgeon"),
        Err(MetadataError::UnknownRootEntity(name)) if name == "Surgeon"
    ));
}

#[test]
fn test_reference_cycle_is_rejected() {
    let result = MetadataStore::from_entities(vec![
        EntityDef::new("Hospital", "hospital_tbl")
            .root()
            .reference("surgeon", "Surgeon", &[("hospital_id", "hospital_id")]),
        EntityDef::new("Surgeon", "surgeon_tbl")
            .reference("hospital", "Hospital", &[("hospital_id", "hospital_id")]),
    ]);

    let err = result.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Entity references form a cycle between: Hospital, Surgeon"
    );
}

#[test]
fn test_reference_names_cannot_contain_separator() {
    let result = MetadataStore::from_entities(vec![
        EntityDef::new("Hospital", "hospital_tbl")
            .root()
            .reference("head_surgeon", "Surgeon", &[("head_id", "surgeon_id")]),
        EntityDef::new("Surgeon", "surgeon_tbl"),
    ]);
    assert!(matches!(
        result,
        Err(MetadataError::InvalidReferenceName { reference, .. }) if reference == "head_surgeon"
    ));
}

#[test]
fn test_reference_to_unknown_entity() {
    let result = MetadataStore::from_entities(vec![EntityDef::new("Hospital", "hospital_tbl")
        .root()
        .reference("pharmacy", "Pharmacy", &[("hospital_id", "hospital_id")])]);
    assert!(matches!(
        result,
        Err(MetadataError::UnknownReference { target, .. }) if target == "Pharmacy"
    ));
}

#[test]
fn test_missing_metadata_file() {
    let result = MetadataStore::from_file(fixture_path().with_file_name("missing.toml"));
    assert!(matches!(result, Err(MetadataError::Read(_))));
}

#[test]
fn test_conflicting_field_mapping_in_toml() {
    let result = MetadataStore::from_toml_str(
        r#"
[[entities]]
name = "Hospital"
table = "hospital_tbl"
root = true
fields = [
    { name = "hospitalId", column = "hospital_id", key = true },
    { name = "name", column = "name" },
    { name = "title", column = "name" },
]
"#,
    );

    let err = result.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Column 'name' of entity Hospital is mapped from both 'name' and 'title'"
    );
}

#[test]
fn test_repeated_identical_field_is_accepted() {
    let store = MetadataStore::from_entities(vec![EntityDef::new("Hospital", "hospital_tbl")
        .root()
        .key_field("hospitalId", "hospital_id")
        .join_eager_field("hospitalId", "hospital_id")])
    .unwrap();

    let meta = store.entity("Hospital").unwrap();
    assert_eq!(meta.column_for_field("hospitalId"), Some("hospital_id"));
    assert_eq!(meta.key_fields, vec!["hospitalId"]);
}
