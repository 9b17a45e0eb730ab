use dirigo::automation::{AutomationError, AutomationStore, FlowStatus};
use dirigo::preferences::{PreferenceError, PreferencesStore, UserMode};
use rusqlite::params;
use tempfile::tempdir;

#[test]
fn preferences_module_defaults_to_development_mode() {
    let temp = tempdir().expect("tempdir");
    let store =
        PreferencesStore::open(&temp.path().join("preferences.sqlite3")).expect("open store");
    store.ensure_schema().expect("ensure schema");

    assert_eq!(store.user_mode().expect("mode"), UserMode::Development);

    store
        .set_user_mode(UserMode::AutomationBuild, 100)
        .expect("set mode");
    assert_eq!(store.user_mode().expect("mode"), UserMode::AutomationBuild);

    store
        .set_user_mode(UserMode::Development, 110)
        .expect("set mode back");
    assert_eq!(store.user_mode().expect("mode"), UserMode::Development);
}

#[test]
fn preferences_module_round_trips_arbitrary_keys() {
    let temp = tempdir().expect("tempdir");
    let store =
        PreferencesStore::open(&temp.path().join("preferences.sqlite3")).expect("open store");
    store.ensure_schema().expect("ensure schema");

    assert_eq!(store.get_value("editor").expect("get"), None);
    store.set_value("editor", "helix", 100).expect("set");
    assert_eq!(
        store.get_value("editor").expect("get").as_deref(),
        Some("helix")
    );
    store.set_value("editor", "zed", 110).expect("overwrite");
    assert_eq!(
        store.get_value("editor").expect("get").as_deref(),
        Some("zed")
    );
}

#[test]
fn preferences_module_rejects_unknown_stored_modes() {
    let temp = tempdir().expect("tempdir");
    let db_path = temp.path().join("preferences.sqlite3");
    let store = PreferencesStore::open(&db_path).expect("open store");
    store.ensure_schema().expect("ensure schema");

    let connection = rusqlite::Connection::open(&db_path).expect("raw connection");
    connection
        .execute(
            "INSERT INTO preferences (key, value, updated_at) VALUES ('user_mode', ?1, 100)",
            params!["vacation"],
        )
        .expect("corrupt mode");

    let err = store.user_mode().expect_err("invalid mode");
    assert!(matches!(
        err,
        PreferenceError::InvalidUserMode { value } if value == "vacation"
    ));
}

#[test]
fn automation_module_upserts_and_lists_flows() {
    let temp = tempdir().expect("tempdir");
    let store =
        AutomationStore::open(&temp.path().join("automation.sqlite3")).expect("open store");
    store.ensure_schema().expect("ensure schema");

    assert_eq!(store.active_flow_count().expect("count"), 0);

    let created = store
        .upsert_flow("nightly-docs", FlowStatus::Active, 100)
        .expect("create flow");
    store
        .upsert_flow("weekly-report", FlowStatus::Paused, 110)
        .expect("create second flow");
    assert_eq!(store.active_flow_count().expect("count"), 1);

    let updated = store
        .upsert_flow("nightly-docs", FlowStatus::Paused, 120)
        .expect("pause flow");
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.status, FlowStatus::Paused);
    assert_eq!(store.active_flow_count().expect("count"), 0);

    let flows = store.list_flows().expect("list flows");
    assert_eq!(flows.len(), 2);
    // Name order.
    assert_eq!(flows[0].name, "nightly-docs");
    assert_eq!(flows[1].name, "weekly-report");
}

#[test]
fn automation_module_rejects_unknown_stored_statuses() {
    let temp = tempdir().expect("tempdir");
    let db_path = temp.path().join("automation.sqlite3");
    let store = AutomationStore::open(&db_path).expect("open store");
    store.ensure_schema().expect("ensure schema");

    let connection = rusqlite::Connection::open(&db_path).expect("raw connection");
    connection
        .execute(
            "INSERT INTO automation_flows (name, status, updated_at) VALUES ('broken', 'zombie', 100)",
            [],
        )
        .expect("corrupt status");

    let err = store.list_flows().expect_err("invalid status");
    assert!(matches!(
        err,
        AutomationError::InvalidFlowStatus { value } if value == "zombie"
    ));
}
