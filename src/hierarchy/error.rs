use crate::hierarchy::{StatusAction, TargetKind, WorkStatus};
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{kind} `{id}` not found")]
    NotFound { kind: TargetKind, id: i64 },
    #[error("{kind} `{id}` cannot `{action}` from status `{from}`")]
    InvalidTransition {
        kind: TargetKind,
        id: i64,
        action: StatusAction,
        from: WorkStatus,
    },
    #[error("{kind} does not support the blocked status")]
    BlockedUnsupported { kind: TargetKind },
    #[error("invalid status value `{value}` in project store")]
    InvalidStatus { value: String },
    #[error("invalid priority value `{value}` in project store")]
    InvalidPriority { value: String },
    #[error("invalid target kind value `{value}` in project store")]
    InvalidKind { value: String },
    #[error("{kind} requires a {expected} parent, got {actual}")]
    InvalidParent {
        kind: TargetKind,
        expected: String,
        actual: String,
    },
    #[error("{kind} name must be non-empty")]
    EmptyName { kind: TargetKind },
    #[error("action `{action}` requires an existing target id")]
    MissingTarget { action: String },
}
