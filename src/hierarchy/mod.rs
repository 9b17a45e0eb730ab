mod domain;
mod error;
mod repository;
mod updates;

pub use domain::{
    NoteRecord, StatusAction, TargetKind, WorkPriority, WorkRecord, WorkStatus,
};
pub use error::HierarchyError;
pub use repository::{BatchUpdate, ProjectRepository};
pub use updates::{update_state, StateAction};
