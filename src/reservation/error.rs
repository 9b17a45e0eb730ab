use crate::reservation::{ArtifactKind, ArtifactState};
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{kind} name must be non-empty")]
    EmptyName { kind: ArtifactKind },
    #[error("{kind} name `{name}` is already claimed by a {held} artifact")]
    NameCollision {
        kind: ArtifactKind,
        name: String,
        held: ArtifactState,
    },
    #[error("artifact `{id}` is {state}, expected a live reservation")]
    InvalidState { id: i64, state: ArtifactState },
    #[error("artifact `{id}` is a {kind}, metadata describes a {metadata_kind}")]
    MetadataMismatch {
        id: i64,
        kind: ArtifactKind,
        metadata_kind: ArtifactKind,
    },
    #[error("parent file `{parent_file_id}` for {kind} `{name}` not found")]
    UnknownParentFile {
        kind: ArtifactKind,
        name: String,
        parent_file_id: i64,
    },
}
