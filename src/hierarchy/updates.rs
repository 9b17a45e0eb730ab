use crate::hierarchy::error::HierarchyError;
use crate::hierarchy::{
    ProjectRepository, StatusAction, TargetKind, WorkPriority, WorkRecord,
};

/// The typed `update_state` surface. Status transitions route through the
/// closed `StatusAction` matrix; everything else is an explicit field edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateAction {
    Create {
        name: String,
        parent: Option<(TargetKind, i64)>,
        priority: WorkPriority,
    },
    Start,
    Pause,
    Block,
    Complete,
    Rename { name: String },
    SetPriority { priority: WorkPriority },
    Archive,
}

pub fn update_state(
    repository: &ProjectRepository,
    action: StateAction,
    kind: TargetKind,
    target: Option<i64>,
    now: i64,
) -> Result<WorkRecord, HierarchyError> {
    match action {
        StateAction::Create {
            name,
            parent,
            priority,
        } => repository.create(kind, &name, parent, priority, now),
        StateAction::Start => {
            repository.apply(kind, require(target, "start")?, StatusAction::Start, now)
        }
        StateAction::Pause => {
            repository.apply(kind, require(target, "pause")?, StatusAction::Pause, now)
        }
        StateAction::Block => {
            repository.apply(kind, require(target, "block")?, StatusAction::Block, now)
        }
        StateAction::Complete => repository.apply(
            kind,
            require(target, "complete")?,
            StatusAction::Complete,
            now,
        ),
        StateAction::Rename { name } => {
            repository.rename(kind, require(target, "rename")?, &name, now)
        }
        StateAction::SetPriority { priority } => {
            repository.set_priority(kind, require(target, "set_priority")?, priority, now)
        }
        StateAction::Archive => repository.archive(kind, require(target, "archive")?, now),
    }
}

fn require(target: Option<i64>, action: &str) -> Result<i64, HierarchyError> {
    target.ok_or_else(|| HierarchyError::MissingTarget {
        action: action.to_string(),
    })
}
