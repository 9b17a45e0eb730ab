//! The facade the driving agent talks to. Owns the loaded catalog, the four
//! store handles and the settings, and appends an operation log line for
//! every mutation. Logging is best-effort and never fails an operation.

use crate::automation::{AutomationError, AutomationFlowRecord, AutomationStore, FlowStatus};
use crate::catalog::{load_catalog, Catalog, CatalogError};
use crate::config::{load_settings, ConfigError, ProjectPaths, Settings};
use crate::flow::{resolve_next, FlowError, ResolvedEdge};
use crate::hierarchy::{
    update_state, BatchUpdate, HierarchyError, NoteRecord, ProjectRepository, StateAction,
    TargetKind, WorkRecord,
};
use crate::preferences::{PreferenceError, PreferencesStore, UserMode};
use crate::reservation::{
    ArtifactKind, ArtifactRecord, ArtifactStore, ContentMetadata, ReservationError,
};
use crate::shared::logging::append_operation_log_line;
use crate::status::{DetailLevel, StateSnapshot, StatusAggregator, StatusError};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
    #[error(transparent)]
    Reservation(#[from] ReservationError),
    #[error(transparent)]
    Status(#[from] StatusError),
    #[error(transparent)]
    Preference(#[from] PreferenceError),
    #[error(transparent)]
    Automation(#[from] AutomationError),
    #[error("failed to encode snapshot: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug)]
pub struct Orchestrator {
    paths: ProjectPaths,
    settings: Settings,
    catalog: Catalog,
    project: ProjectRepository,
    artifacts: ArtifactStore,
    preferences: PreferencesStore,
    automation: AutomationStore,
}

impl Orchestrator {
    /// Opens a project root. Catalog validation failures are fatal here:
    /// an orchestrator over an inconsistent flow graph must not serve
    /// requests.
    pub fn open(root: &Path) -> Result<Self, OrchestratorError> {
        let paths = ProjectPaths::new(root);
        let settings = load_settings(&paths.settings_file())?;

        let catalog = load_catalog(&paths.reference_db())?;

        let project = ProjectRepository::open(&paths.project_db())?;
        project.ensure_schema()?;
        let artifacts = ArtifactStore::open(&paths.project_db())?;
        artifacts.ensure_schema()?;
        let preferences = PreferencesStore::open(&paths.preferences_db())?;
        preferences.ensure_schema()?;
        let automation = AutomationStore::open(&paths.automation_db())?;
        automation.ensure_schema()?;

        Ok(Self {
            paths,
            settings,
            catalog,
            project,
            artifacts,
            preferences,
            automation,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    pub fn resolve_next(
        &self,
        current_directive: &str,
        snapshot: &StateSnapshot,
    ) -> Result<Vec<ResolvedEdge>, OrchestratorError> {
        Ok(resolve_next(&self.catalog, current_directive, snapshot)?)
    }

    pub fn get_status(&self, detail: DetailLevel) -> Result<StateSnapshot, OrchestratorError> {
        let snapshot = StatusAggregator::new(&self.project)
            .with_preferences(&self.preferences)
            .with_automation(&self.automation)
            .with_recent_window(self.settings.recent_window)
            .get_status(detail, now())?;
        Ok(snapshot)
    }

    /// The snapshot as JSON, for the external driver consuming status over
    /// a text boundary.
    pub fn get_status_json(&self, detail: DetailLevel) -> Result<String, OrchestratorError> {
        let snapshot = self.get_status(detail)?;
        serde_json::to_string(&snapshot).map_err(|source| OrchestratorError::Encode { source })
    }

    pub fn update_state(
        &self,
        action: StateAction,
        kind: TargetKind,
        target: Option<i64>,
    ) -> Result<WorkRecord, OrchestratorError> {
        let record = update_state(&self.project, action, kind, target, now())?;
        self.log(&format!(
            "update kind={} id={} status={}",
            record.kind, record.id, record.status
        ));
        Ok(record)
    }

    /// One transaction; the first failure rolls every update back.
    pub fn apply_batch_atomic(
        &self,
        updates: &[BatchUpdate],
    ) -> Result<Vec<WorkRecord>, OrchestratorError> {
        let applied = self.project.apply_batch_atomic(updates, now())?;
        self.log(&format!("batch_atomic applied={}", applied.len()));
        Ok(applied)
    }

    /// Continues past individual failures; the caller handles partial
    /// success.
    pub fn apply_batch_best_effort(
        &self,
        updates: &[BatchUpdate],
    ) -> Result<Vec<Result<WorkRecord, HierarchyError>>, OrchestratorError> {
        let results = self.project.apply_batch_best_effort(updates, now())?;
        let succeeded = results.iter().filter(|result| result.is_ok()).count();
        self.log(&format!(
            "batch_best_effort attempted={} succeeded={}",
            results.len(),
            succeeded
        ));
        Ok(results)
    }

    pub fn reserve(
        &self,
        kind: ArtifactKind,
        name: &str,
        parent_file_id: Option<i64>,
    ) -> Result<ArtifactRecord, OrchestratorError> {
        let record = self.artifacts.reserve(kind, name, parent_file_id, now())?;
        self.log(&format!(
            "reserve kind={} name={} id={}",
            record.kind, record.name, record.id
        ));
        Ok(record)
    }

    pub fn finalize(
        &self,
        id: i64,
        metadata: &ContentMetadata,
    ) -> Result<ArtifactRecord, OrchestratorError> {
        let record = self.artifacts.finalize(id, metadata, now())?;
        self.log(&format!("finalize id={} kind={}", record.id, record.kind));
        Ok(record)
    }

    pub fn release(&self, id: i64) -> Result<(), OrchestratorError> {
        self.artifacts.release(id)?;
        self.log(&format!("release id={id}"));
        Ok(())
    }

    pub fn artifact(&self, id: i64) -> Result<Option<ArtifactRecord>, OrchestratorError> {
        Ok(self.artifacts.get(id)?)
    }

    /// Reservations abandoned before `older_than`, surfaced for the operator
    /// to release. There is no automatic expiry.
    pub fn list_stale_reservations(
        &self,
        older_than: i64,
    ) -> Result<Vec<ArtifactRecord>, OrchestratorError> {
        Ok(self.artifacts.list_stale_reservations(older_than)?)
    }

    pub fn add_note(
        &self,
        kind: TargetKind,
        id: i64,
        content: &str,
    ) -> Result<NoteRecord, OrchestratorError> {
        Ok(self.project.add_note(kind, id, content, now())?)
    }

    pub fn notes_for(
        &self,
        kind: TargetKind,
        id: i64,
    ) -> Result<Vec<NoteRecord>, OrchestratorError> {
        Ok(self.project.notes_for(kind, id)?)
    }

    pub fn user_mode(&self) -> Result<UserMode, OrchestratorError> {
        Ok(self.preferences.user_mode()?)
    }

    pub fn set_user_mode(&self, mode: UserMode) -> Result<(), OrchestratorError> {
        self.preferences.set_user_mode(mode, now())?;
        self.log(&format!("set_user_mode mode={mode}"));
        Ok(())
    }

    pub fn upsert_automation_flow(
        &self,
        name: &str,
        status: FlowStatus,
    ) -> Result<AutomationFlowRecord, OrchestratorError> {
        let record = self.automation.upsert_flow(name, status, now())?;
        self.log(&format!(
            "automation_flow name={} status={}",
            record.name, record.status
        ));
        Ok(record)
    }

    pub fn automation_flows(&self) -> Result<Vec<AutomationFlowRecord>, OrchestratorError> {
        Ok(self.automation.list_flows()?)
    }

    fn log(&self, message: &str) {
        let line = format!("ts={} {message}", now());
        let _ = append_operation_log_line(self.paths.root(), &line);
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
