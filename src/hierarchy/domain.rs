use serde::{Deserialize, Serialize};

/// The five hierarchy levels plus items, lowest level last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Stage,
    Milestone,
    Task,
    Subtask,
    Sidequest,
    Item,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Stage => "stage",
            TargetKind::Milestone => "milestone",
            TargetKind::Task => "task",
            TargetKind::Subtask => "subtask",
            TargetKind::Sidequest => "sidequest",
            TargetKind::Item => "item",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "stage" => Some(TargetKind::Stage),
            "milestone" => Some(TargetKind::Milestone),
            "task" => Some(TargetKind::Task),
            "subtask" => Some(TargetKind::Subtask),
            "sidequest" => Some(TargetKind::Sidequest),
            "item" => Some(TargetKind::Item),
            _ => None,
        }
    }

    pub(crate) fn table(self) -> &'static str {
        match self {
            TargetKind::Stage => "stages",
            TargetKind::Milestone => "milestones",
            TargetKind::Task => "tasks",
            TargetKind::Subtask => "subtasks",
            TargetKind::Sidequest => "sidequests",
            TargetKind::Item => "items",
        }
    }

    /// Only interruptible mid-tree levels support the blocked status.
    pub fn allows_blocked(self) -> bool {
        matches!(
            self,
            TargetKind::Task | TargetKind::Subtask | TargetKind::Sidequest
        )
    }

    pub fn expected_parents(self) -> &'static [TargetKind] {
        match self {
            TargetKind::Stage => &[],
            TargetKind::Milestone => &[TargetKind::Stage],
            TargetKind::Task => &[TargetKind::Milestone],
            TargetKind::Subtask | TargetKind::Sidequest => &[TargetKind::Task],
            TargetKind::Item => &[TargetKind::Task, TargetKind::Subtask, TargetKind::Sidequest],
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl WorkStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkStatus::Pending => "pending",
            WorkStatus::InProgress => "in_progress",
            WorkStatus::Completed => "completed",
            WorkStatus::Blocked => "blocked",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(WorkStatus::Pending),
            "in_progress" => Some(WorkStatus::InProgress),
            "completed" => Some(WorkStatus::Completed),
            "blocked" => Some(WorkStatus::Blocked),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, WorkStatus::Completed)
    }
}

impl std::fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl WorkPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkPriority::Low => "low",
            WorkPriority::Medium => "medium",
            WorkPriority::High => "high",
            WorkPriority::Critical => "critical",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "low" => Some(WorkPriority::Low),
            "medium" => Some(WorkPriority::Medium),
            "high" => Some(WorkPriority::High),
            "critical" => Some(WorkPriority::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for WorkPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-row status transitions. The matrix is closed: anything outside it
/// is a constraint violation, reported with the offending from-status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusAction {
    Start,
    Pause,
    Block,
    Complete,
}

impl StatusAction {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusAction::Start => "start",
            StatusAction::Pause => "pause",
            StatusAction::Block => "block",
            StatusAction::Complete => "complete",
        }
    }

    pub fn next_status(self, from: WorkStatus) -> Option<WorkStatus> {
        match (self, from) {
            (StatusAction::Start, WorkStatus::Pending)
            | (StatusAction::Start, WorkStatus::Blocked) => Some(WorkStatus::InProgress),
            (StatusAction::Pause, WorkStatus::InProgress) => Some(WorkStatus::Pending),
            (StatusAction::Block, WorkStatus::InProgress) => Some(WorkStatus::Blocked),
            (StatusAction::Complete, WorkStatus::InProgress) => Some(WorkStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for StatusAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified row view over all six hierarchy tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRecord {
    pub kind: TargetKind,
    pub id: i64,
    pub name: String,
    pub status: WorkStatus,
    pub priority: WorkPriority,
    pub parent_kind: Option<TargetKind>,
    pub parent_id: Option<i64>,
    /// Completion-path stages are ordered; other levels carry no position.
    pub position: Option<i64>,
    pub archived: bool,
    pub created_at: i64,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: i64,
    pub target_kind: TargetKind,
    pub target_id: i64,
    pub content: String,
    pub created_at: i64,
}
