use dirigo::catalog::{DirectiveCategory, FlowType, ReferenceStore};
use dirigo::config::ProjectPaths;
use dirigo::hierarchy::{StateAction, TargetKind, WorkPriority, WorkStatus};
use dirigo::orchestrator::{Orchestrator, OrchestratorError};
use dirigo::reservation::{ArtifactKind, ContentMetadata};
use dirigo::shared::logging::operations_log_path;
use dirigo::status::DetailLevel;
use std::path::Path;
use tempfile::tempdir;

fn seed_reference(root: &Path) {
    let paths = ProjectPaths::new(root);
    let store = ReferenceStore::open(&paths.reference_db()).expect("open reference store");
    store.ensure_schema().expect("ensure schema");
    for (name, category) in [
        ("project_status", DirectiveCategory::Session),
        ("plan_next", DirectiveCategory::Planning),
        ("implement_item", DirectiveCategory::Implementation),
        ("task_complete", DirectiveCategory::Completion),
    ] {
        store
            .insert_directive(name, category, "workflow text", 0.7)
            .expect("insert directive");
    }
    store
        .set_root_directive("project_status")
        .expect("set root");
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
            "plan_next",
            FlowType::Conditional,
            Some(("has_incomplete_items", "true")),
            80,
        )
        .expect("insert conditional edge");
    store
        .insert_edge(
            "project_status",
            "implement_item",
            FlowType::Canonical,
            None,
            50,
        )
        .expect("insert canonical edge");
}

#[test]
fn orchestrator_module_drives_the_full_loop() {
    let temp = tempdir().expect("tempdir");
    seed_reference(temp.path());
    let orchestrator = Orchestrator::open(temp.path()).expect("open orchestrator");

    // Fresh project: nothing to do yet, the canonical edge wins.
    let snapshot = orchestrator
        .get_status(DetailLevel::Quick)
        .expect("initial status");
    assert!(!snapshot.flags.is_initialized);
    let resolved = orchestrator
        .resolve_next("project_status", &snapshot)
        .expect("resolve");
    assert_eq!(resolved[0].to.as_str(), "implement_item");
    assert!(!resolved
        .iter()
        .find(|edge| edge.to.as_str() == "plan_next")
        .expect("conditional edge present")
        .matched);

    let stage = orchestrator
        .update_state(
            StateAction::Create {
                name: "foundation".to_string(),
                parent: None,
                priority: WorkPriority::High,
            },
            TargetKind::Stage,
            None,
        )
        .expect("create stage");
    assert_eq!(stage.status, WorkStatus::Pending);

    // With open work the conditional branch matches and outranks canonical.
    let snapshot = orchestrator
        .get_status(DetailLevel::Quick)
        .expect("status after create");
    assert!(snapshot.flags.is_initialized);
    assert!(snapshot.flags.has_incomplete_items);
    let resolved = orchestrator
        .resolve_next("project_status", &snapshot)
        .expect("resolve again");
    assert_eq!(resolved[0].to.as_str(), "plan_next");
    assert!(resolved[0].matched);

    orchestrator
        .update_state(StateAction::Start, TargetKind::Stage, Some(stage.id))
        .expect("start stage");
    orchestrator
        .add_note(TargetKind::Stage, stage.id, "kickoff agreed")
        .expect("add note");
    assert_eq!(
        orchestrator
            .notes_for(TargetKind::Stage, stage.id)
            .expect("notes")
            .len(),
        1
    );

    let encoded = orchestrator
        .get_status_json(DetailLevel::Summary)
        .expect("snapshot json");
    assert!(encoded.contains("\"counts\""));
    assert!(encoded.contains("\"is_initialized\":true"));

    let log_path = operations_log_path(temp.path());
    let log = std::fs::read_to_string(&log_path).expect("read log");
    assert!(log.lines().count() >= 2);
    assert!(log.lines().all(|line| line.starts_with("ts=")));
}

#[test]
fn orchestrator_module_runs_the_reservation_protocol() {
    let temp = tempdir().expect("tempdir");
    seed_reference(temp.path());
    let orchestrator = Orchestrator::open(temp.path()).expect("open orchestrator");

    let file = orchestrator
        .reserve(ArtifactKind::File, "src/totals.rs", None)
        .expect("reserve file");
    let function = orchestrator
        .reserve(ArtifactKind::Function, "calc_total", Some(file.id))
        .expect("reserve function");
    assert!(function.is_reserved);

    let err = orchestrator
        .reserve(ArtifactKind::Function, "calc_total", Some(file.id))
        .expect_err("collision");
    assert!(matches!(err, OrchestratorError::Reservation(_)));

    let finalized = orchestrator
        .finalize(
            function.id,
            &ContentMetadata::Function {
                signature: "fn calc_total(items: &[LineItem]) -> Decimal".to_string(),
                role: "sums line items into an order total".to_string(),
            },
        )
        .expect("finalize");
    assert!(!finalized.is_reserved);

    orchestrator.release(file.id).expect("release file");
    assert!(orchestrator
        .artifact(file.id)
        .expect("lookup released")
        .is_none());

    // The finalized function is not stale; nothing is.
    assert!(orchestrator
        .list_stale_reservations(i64::MAX)
        .expect("stale list")
        .is_empty());
}

#[test]
fn orchestrator_module_refuses_to_open_over_a_broken_catalog() {
    let temp = tempdir().expect("tempdir");
    let paths = ProjectPaths::new(temp.path());
    let store = ReferenceStore::open(&paths.reference_db()).expect("open reference store");
    store.ensure_schema().expect("ensure schema");
    store
        .insert_directive(
            "project_status",
            DirectiveCategory::Session,
            "workflow text",
            0.7,
        )
        .expect("insert root");
    store
        .insert_directive(
            "task_complete",
            DirectiveCategory::Completion,
            "workflow text",
            0.7,
        )
        .expect("insert completion directive");
    store
        .set_root_directive("project_status")
        .expect("set root");
    // No completion_loop edge: the loop-back invariant is violated.

    let err = Orchestrator::open(temp.path()).expect_err("open must fail");
    assert!(matches!(err, OrchestratorError::Catalog(_)));
}

#[test]
fn orchestrator_module_reads_settings_from_the_project_root() {
    let temp = tempdir().expect("tempdir");
    seed_reference(temp.path());
    std::fs::write(temp.path().join("dirigo.yaml"), "recent_window: 2\n")
        .expect("write settings");

    let orchestrator = Orchestrator::open(temp.path()).expect("open orchestrator");
    assert_eq!(orchestrator.settings().recent_window, 2);
}

#[test]
fn orchestrator_module_rejects_invalid_settings() {
    let temp = tempdir().expect("tempdir");
    seed_reference(temp.path());
    std::fs::write(temp.path().join("dirigo.yaml"), "recent_window: 0\n")
        .expect("write settings");

    let err = Orchestrator::open(temp.path()).expect_err("open must fail");
    assert!(matches!(err, OrchestratorError::Config(_)));
}
