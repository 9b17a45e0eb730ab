use crate::hierarchy::{TargetKind, WorkRecord};
use crate::preferences::UserMode;
use serde::{Deserialize, Serialize};

/// How much of the hierarchy the snapshot carries. Counts, focus and flags
/// are always present; detail only changes verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    #[default]
    Quick,
    Summary,
    Detailed,
}

impl DetailLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            DetailLevel::Quick => "quick",
            DetailLevel::Summary => "summary",
            DetailLevel::Detailed => "detailed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "quick" => Some(DetailLevel::Quick),
            "summary" => Some(DetailLevel::Summary),
            "detailed" => Some(DetailLevel::Detailed),
            _ => None,
        }
    }
}

impl std::fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub blocked: u64,
}

impl LevelCounts {
    pub fn total(self) -> u64 {
        self.pending + self.in_progress + self.completed + self.blocked
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotCounts {
    pub stages: LevelCounts,
    pub milestones: LevelCounts,
    pub tasks: LevelCounts,
    pub subtasks: LevelCounts,
    pub sidequests: LevelCounts,
    pub items: LevelCounts,
}

/// The single unit of work the caller should treat as current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusItem {
    pub kind: TargetKind,
    pub id: i64,
    pub name: String,
    pub started_at: Option<i64>,
    /// When a subtask or sidequest holds focus, the task it pauses.
    pub paused_task_id: Option<i64>,
}

/// The closed set of values flow conditions may be evaluated against. Adding
/// a condition key means adding a field here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFlags {
    pub is_initialized: bool,
    pub has_incomplete_items: bool,
    pub has_active_sidequest: bool,
    pub user_mode: UserMode,
    pub automation_active: bool,
}

impl SnapshotFlags {
    /// Condition lookup by key. Unknown keys yield `None` and therefore
    /// never match an edge condition.
    pub fn value(&self, key: &str) -> Option<String> {
        match key {
            "is_initialized" => Some(self.is_initialized.to_string()),
            "has_incomplete_items" => Some(self.has_incomplete_items.to_string()),
            "has_active_sidequest" => Some(self.has_active_sidequest.to_string()),
            "user_mode" => Some(self.user_mode.as_str().to_string()),
            "automation_active" => Some(self.automation_active.to_string()),
            _ => None,
        }
    }
}

/// A record whose children are all complete and which is therefore eligible
/// for its completion directive. Surfaced, never auto-applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecommendation {
    pub kind: TargetKind,
    pub id: i64,
    pub name: String,
}

/// Per-level record lists, used for both incomplete work and recent
/// completions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSets {
    pub stages: Vec<WorkRecord>,
    pub milestones: Vec<WorkRecord>,
    pub tasks: Vec<WorkRecord>,
    pub subtasks: Vec<WorkRecord>,
    pub sidequests: Vec<WorkRecord>,
    pub items: Vec<WorkRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskNode {
    pub record: WorkRecord,
    pub items: Vec<WorkRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidequestNode {
    pub record: WorkRecord,
    pub items: Vec<WorkRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNode {
    pub record: WorkRecord,
    pub subtasks: Vec<SubtaskNode>,
    pub sidequests: Vec<SidequestNode>,
    pub items: Vec<WorkRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneNode {
    pub record: WorkRecord,
    pub tasks: Vec<TaskNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageNode {
    pub record: WorkRecord,
    pub milestones: Vec<MilestoneNode>,
}

/// Point-in-time aggregated project state. Built fresh on every call and
/// never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub generated_at: i64,
    pub detail: DetailLevel,
    pub counts: SnapshotCounts,
    pub focus: Option<FocusItem>,
    pub flags: SnapshotFlags,
    pub recommendations: Vec<CompletionRecommendation>,
    pub incomplete: Option<WorkSets>,
    pub recent_completed: Option<WorkSets>,
    pub tree: Option<Vec<StageNode>>,
}
