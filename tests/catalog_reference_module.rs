use dirigo::catalog::{
    load_catalog, CatalogError, DirectiveCategory, FlowType, ReferenceStore, WILDCARD_SOURCE,
};
use tempfile::tempdir;

fn seeded_store(temp: &tempfile::TempDir) -> ReferenceStore {
    let store = ReferenceStore::open(&temp.path().join("reference.sqlite3")).expect("open store");
    store.ensure_schema().expect("ensure schema");
    store
        .insert_directive(
            "project_status",
            DirectiveCategory::Session,
            "report current project state",
            0.8,
        )
        .expect("insert root directive");
    store
        .insert_directive(
            "task_complete",
            DirectiveCategory::Completion,
            "mark the focused task complete",
            0.9,
        )
        .expect("insert completion directive");
    store
        .insert_directive(
            "consult_docs",
            DirectiveCategory::Reference,
            "look up reference material",
            0.5,
        )
        .expect("insert reference directive");
    store
        .set_root_directive("project_status")
        .expect("set root");
    store
}

#[test]
fn catalog_module_loads_directives_edges_and_root() {
    let temp = tempdir().expect("tempdir");
    let store = seeded_store(&temp);
    store
        .insert_edge(
            "task_complete",
            "project_status",
            FlowType::CompletionLoop,
            None,
            100,
        )
        .expect("insert loop edge");
    store
        .insert_edge(
            "project_status",
            "task_complete",
            FlowType::Canonical,
            Some(("has_incomplete_items", "true")),
            50,
        )
        .expect("insert conditional edge");
    store
        .insert_edge(WILDCARD_SOURCE, "consult_docs", FlowType::Canonical, None, 10)
        .expect("insert wildcard edge");

    let catalog = load_catalog(store.db_path()).expect("load catalog");

    assert!(catalog.contains("project_status"));
    assert!(catalog.contains("task_complete"));
    assert_eq!(catalog.root_directive().as_str(), "project_status");
    assert_eq!(catalog.edges().len(), 3);

    // Wildcard edges surface from every directive.
    let from_docs: Vec<_> = catalog.edges_from("consult_docs").collect();
    assert_eq!(from_docs.len(), 1);
    assert!(from_docs[0].from.is_wildcard());
}

#[test]
fn catalog_module_fails_when_completion_directive_lacks_loop_edge() {
    let temp = tempdir().expect("tempdir");
    let store = seeded_store(&temp);

    let err = load_catalog(store.db_path()).expect_err("missing loop");
    match err {
        CatalogError::CompletionLoopCount { directive, count } => {
            assert_eq!(directive, "task_complete");
            assert_eq!(count, 0);
        }
        other => panic!("expected CompletionLoopCount, got {other:?}"),
    }
}

#[test]
fn catalog_module_fails_when_loop_edge_targets_non_root() {
    let temp = tempdir().expect("tempdir");
    let store = seeded_store(&temp);
    store
        .insert_edge(
            "task_complete",
            "consult_docs",
            FlowType::CompletionLoop,
            None,
            100,
        )
        .expect("insert wrong loop edge");

    let err = load_catalog(store.db_path()).expect_err("wrong loop target");
    match err {
        CatalogError::CompletionLoopTarget {
            directive,
            target,
            root,
        } => {
            assert_eq!(directive, "task_complete");
            assert_eq!(target, "consult_docs");
            assert_eq!(root, "project_status");
        }
        other => panic!("expected CompletionLoopTarget, got {other:?}"),
    }
}

#[test]
fn catalog_module_fails_on_duplicate_loop_edges() {
    let temp = tempdir().expect("tempdir");
    let store = seeded_store(&temp);
    for _ in 0..2 {
        store
            .insert_edge(
                "task_complete",
                "project_status",
                FlowType::CompletionLoop,
                None,
                100,
            )
            .expect("insert loop edge");
    }

    let err = load_catalog(store.db_path()).expect_err("duplicate loops");
    assert!(matches!(
        err,
        CatalogError::CompletionLoopCount { count: 2, .. }
    ));
}

#[test]
fn catalog_module_excludes_wildcard_edges_from_loop_validation() {
    let temp = tempdir().expect("tempdir");
    let store = seeded_store(&temp);
    store
        .insert_edge(
            "task_complete",
            "project_status",
            FlowType::CompletionLoop,
            None,
            100,
        )
        .expect("insert loop edge");
    // A wildcard-sourced loop edge must not count toward any directive.
    store
        .insert_edge(
            WILDCARD_SOURCE,
            "project_status",
            FlowType::CompletionLoop,
            None,
            5,
        )
        .expect("insert wildcard loop edge");

    let catalog = load_catalog(store.db_path()).expect("load catalog");
    assert_eq!(catalog.edges().len(), 2);
}

#[test]
fn catalog_module_rejects_dangling_edge_endpoints() {
    let temp = tempdir().expect("tempdir");
    let store = seeded_store(&temp);
    store
        .insert_edge(
            "task_complete",
            "project_status",
            FlowType::CompletionLoop,
            None,
            100,
        )
        .expect("insert loop edge");
    store
        .insert_edge("project_status", "ghost_step", FlowType::Canonical, None, 10)
        .expect("insert dangling edge");

    let err = load_catalog(store.db_path()).expect_err("dangling endpoint");
    assert!(matches!(
        err,
        CatalogError::UnknownEdgeEndpoint { unknown, .. } if unknown == "ghost_step"
    ));
}

#[test]
fn catalog_module_rejects_half_specified_conditions() {
    let temp = tempdir().expect("tempdir");
    let store = seeded_store(&temp);
    store
        .insert_edge(
            "task_complete",
            "project_status",
            FlowType::CompletionLoop,
            None,
            100,
        )
        .expect("insert loop edge");

    // The typed writer cannot produce a half condition; write the row raw.
    let connection =
        rusqlite::Connection::open(store.db_path()).expect("open raw connection");
    connection
        .execute(
            "
            INSERT INTO flow_edges (
                from_directive, to_directive, flow_type,
                condition_key, condition_value, priority
            ) VALUES ('project_status', 'consult_docs', 'canonical', 'user_mode', NULL, 10)
            ",
            [],
        )
        .expect("insert half condition");

    let err = load_catalog(store.db_path()).expect_err("half condition");
    assert!(matches!(err, CatalogError::ConditionHalfSpecified { .. }));
}

#[test]
fn catalog_module_requires_a_root_directive() {
    let temp = tempdir().expect("tempdir");
    let store = ReferenceStore::open(&temp.path().join("reference.sqlite3")).expect("open store");
    store.ensure_schema().expect("ensure schema");
    store
        .insert_directive(
            "project_status",
            DirectiveCategory::Session,
            "report current project state",
            0.8,
        )
        .expect("insert directive");

    let err = load_catalog(store.db_path()).expect_err("root unset");
    assert!(matches!(err, CatalogError::RootDirectiveUnset));
}

#[test]
fn catalog_module_rejects_unknown_root_directive() {
    let temp = tempdir().expect("tempdir");
    let store = seeded_store(&temp);
    store.set_root_directive("ghost_step").expect("set root");
    store
        .insert_edge(
            "task_complete",
            "project_status",
            FlowType::CompletionLoop,
            None,
            100,
        )
        .expect("insert loop edge");

    let err = load_catalog(store.db_path()).expect_err("unknown root");
    assert!(matches!(err, CatalogError::RootDirectiveUnknown { .. }));
}

#[test]
fn catalog_module_rejects_confidence_outside_unit_interval() {
    let temp = tempdir().expect("tempdir");
    let store = seeded_store(&temp);
    store
        .insert_directive(
            "overconfident",
            DirectiveCategory::Planning,
            "plan with too much certainty",
            1.5,
        )
        .expect("insert directive");
    store
        .insert_edge(
            "task_complete",
            "project_status",
            FlowType::CompletionLoop,
            None,
            100,
        )
        .expect("insert loop edge");

    let err = load_catalog(store.db_path()).expect_err("bad confidence");
    assert!(matches!(err, CatalogError::InvalidConfidence { .. }));
}
