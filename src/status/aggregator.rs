use crate::automation::AutomationStore;
use crate::hierarchy::{ProjectRepository, TargetKind, WorkRecord, WorkStatus};
use crate::preferences::{PreferencesStore, UserMode};
use crate::status::error::StatusError;
use crate::status::snapshot::{
    CompletionRecommendation, DetailLevel, FocusItem, LevelCounts, MilestoneNode, SidequestNode,
    SnapshotCounts, SnapshotFlags, StageNode, StateSnapshot, SubtaskNode, TaskNode, WorkSets,
};
use std::collections::HashMap;

/// Read-composition over the project store and the optional sibling stores.
/// Every `get_status` call re-reads; nothing is cached between calls, and
/// sibling stores are read independently rather than inside one transaction.
pub struct StatusAggregator<'a> {
    project: &'a ProjectRepository,
    preferences: Option<&'a PreferencesStore>,
    automation: Option<&'a AutomationStore>,
    recent_window: usize,
}

struct Levels {
    stages: Vec<WorkRecord>,
    milestones: Vec<WorkRecord>,
    tasks: Vec<WorkRecord>,
    subtasks: Vec<WorkRecord>,
    sidequests: Vec<WorkRecord>,
    items: Vec<WorkRecord>,
}

impl Levels {
    fn all(&self) -> impl Iterator<Item = &WorkRecord> {
        self.stages
            .iter()
            .chain(&self.milestones)
            .chain(&self.tasks)
            .chain(&self.subtasks)
            .chain(&self.sidequests)
            .chain(&self.items)
    }
}

impl<'a> StatusAggregator<'a> {
    pub fn new(project: &'a ProjectRepository) -> Self {
        Self {
            project,
            preferences: None,
            automation: None,
            recent_window: crate::config::DEFAULT_RECENT_WINDOW,
        }
    }

    pub fn with_preferences(mut self, preferences: &'a PreferencesStore) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn with_automation(mut self, automation: &'a AutomationStore) -> Self {
        self.automation = Some(automation);
        self
    }

    pub fn with_recent_window(mut self, recent_window: usize) -> Self {
        self.recent_window = recent_window;
        self
    }

    pub fn get_status(
        &self,
        detail: DetailLevel,
        now: i64,
    ) -> Result<StateSnapshot, StatusError> {
        let levels = Levels {
            stages: self.project.load_all(TargetKind::Stage)?,
            milestones: self.project.load_all(TargetKind::Milestone)?,
            tasks: self.project.load_all(TargetKind::Task)?,
            subtasks: self.project.load_all(TargetKind::Subtask)?,
            sidequests: self.project.load_all(TargetKind::Sidequest)?,
            items: self.project.load_all(TargetKind::Item)?,
        };

        let counts = SnapshotCounts {
            stages: count_level(&levels.stages),
            milestones: count_level(&levels.milestones),
            tasks: count_level(&levels.tasks),
            subtasks: count_level(&levels.subtasks),
            sidequests: count_level(&levels.sidequests),
            items: count_level(&levels.items),
        };

        let focus = select_focus(&levels);
        let flags = self.compose_flags(&levels)?;
        let recommendations = completion_recommendations(&levels);

        let (incomplete, recent_completed, tree) = match detail {
            DetailLevel::Quick => (None, None, None),
            DetailLevel::Summary => (
                Some(incomplete_sets(&levels)),
                Some(recent_completed_sets(&levels, Some(self.recent_window))),
                Some(build_tree(&levels)),
            ),
            DetailLevel::Detailed => (
                Some(incomplete_sets(&levels)),
                Some(recent_completed_sets(&levels, None)),
                Some(build_tree(&levels)),
            ),
        };

        Ok(StateSnapshot {
            generated_at: now,
            detail,
            counts,
            focus,
            flags,
            recommendations,
            incomplete,
            recent_completed,
            tree,
        })
    }

    fn compose_flags(&self, levels: &Levels) -> Result<SnapshotFlags, StatusError> {
        let user_mode = match self.preferences {
            Some(store) => store.user_mode()?,
            None => UserMode::default(),
        };
        let automation_active = match self.automation {
            Some(store) => store.active_flow_count()? > 0,
            None => false,
        };
        Ok(SnapshotFlags {
            is_initialized: !levels.stages.is_empty(),
            has_incomplete_items: levels.all().any(|record| !record.status.is_terminal()),
            has_active_sidequest: levels
                .sidequests
                .iter()
                .any(|record| record.status == WorkStatus::InProgress),
            user_mode,
            automation_active,
        })
    }
}

fn count_level(records: &[WorkRecord]) -> LevelCounts {
    let mut counts = LevelCounts::default();
    for record in records {
        match record.status {
            WorkStatus::Pending => counts.pending += 1,
            WorkStatus::InProgress => counts.in_progress += 1,
            WorkStatus::Completed => counts.completed += 1,
            WorkStatus::Blocked => counts.blocked += 1,
        }
    }
    counts
}

/// Sidequest > subtask > task, most recently started wins inside a level.
/// Interrupt work always outranks planned work for attention purposes.
fn select_focus(levels: &Levels) -> Option<FocusItem> {
    for records in [&levels.sidequests, &levels.subtasks, &levels.tasks] {
        let active = records
            .iter()
            .filter(|record| record.status == WorkStatus::InProgress)
            .max_by_key(|record| (record.started_at, record.id));
        if let Some(record) = active {
            let paused_task_id = match record.kind {
                TargetKind::Subtask | TargetKind::Sidequest => record.parent_id,
                _ => None,
            };
            return Some(FocusItem {
                kind: record.kind,
                id: record.id,
                name: record.name.clone(),
                started_at: record.started_at,
                paused_task_id,
            });
        }
    }
    None
}

fn all_completed(records: &[&WorkRecord]) -> bool {
    !records.is_empty() && records.iter().all(|record| record.status.is_terminal())
}

/// Records whose children are all complete. Completion cascades upward as a
/// recommendation only; the caller must invoke the completion directive.
fn completion_recommendations(levels: &Levels) -> Vec<CompletionRecommendation> {
    let mut items_by_parent: HashMap<(TargetKind, i64), Vec<&WorkRecord>> = HashMap::new();
    for item in &levels.items {
        if let (Some(parent_kind), Some(parent_id)) = (item.parent_kind, item.parent_id) {
            items_by_parent
                .entry((parent_kind, parent_id))
                .or_default()
                .push(item);
        }
    }
    let subtasks_by_task = group_by_parent(&levels.subtasks);
    let sidequests_by_task = group_by_parent(&levels.sidequests);
    let tasks_by_milestone = group_by_parent(&levels.tasks);
    let milestones_by_stage = group_by_parent(&levels.milestones);

    let mut out = Vec::new();

    for record in levels.subtasks.iter().chain(&levels.sidequests) {
        if record.status.is_terminal() {
            continue;
        }
        let children = items_by_parent
            .get(&(record.kind, record.id))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        if all_completed(children) {
            out.push(recommend(record));
        }
    }

    for task in &levels.tasks {
        if task.status.is_terminal() {
            continue;
        }
        let mut children: Vec<&WorkRecord> = Vec::new();
        if let Some(subtasks) = subtasks_by_task.get(&task.id) {
            children.extend(subtasks);
        }
        if let Some(sidequests) = sidequests_by_task.get(&task.id) {
            children.extend(sidequests);
        }
        if let Some(items) = items_by_parent.get(&(TargetKind::Task, task.id)) {
            children.extend(items);
        }
        if all_completed(&children) {
            out.push(recommend(task));
        }
    }

    for milestone in &levels.milestones {
        if milestone.status.is_terminal() {
            continue;
        }
        let children = tasks_by_milestone
            .get(&milestone.id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        if all_completed(children) {
            out.push(recommend(milestone));
        }
    }

    for stage in &levels.stages {
        if stage.status.is_terminal() {
            continue;
        }
        let children = milestones_by_stage
            .get(&stage.id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        if all_completed(children) {
            out.push(recommend(stage));
        }
    }

    out
}

fn recommend(record: &WorkRecord) -> CompletionRecommendation {
    CompletionRecommendation {
        kind: record.kind,
        id: record.id,
        name: record.name.clone(),
    }
}

fn group_by_parent(records: &[WorkRecord]) -> HashMap<i64, Vec<&WorkRecord>> {
    let mut grouped: HashMap<i64, Vec<&WorkRecord>> = HashMap::new();
    for record in records {
        if let Some(parent_id) = record.parent_id {
            grouped.entry(parent_id).or_default().push(record);
        }
    }
    grouped
}

fn incomplete_sets(levels: &Levels) -> WorkSets {
    let keep = |records: &[WorkRecord]| {
        records
            .iter()
            .filter(|record| !record.status.is_terminal())
            .cloned()
            .collect::<Vec<_>>()
    };
    WorkSets {
        stages: keep(&levels.stages),
        milestones: keep(&levels.milestones),
        tasks: keep(&levels.tasks),
        subtasks: keep(&levels.subtasks),
        sidequests: keep(&levels.sidequests),
        items: keep(&levels.items),
    }
}

/// Completed records, most recent first. `window` of `None` keeps the whole
/// history.
fn recent_completed_sets(levels: &Levels, window: Option<usize>) -> WorkSets {
    let keep = |records: &[WorkRecord]| {
        let mut completed: Vec<WorkRecord> = records
            .iter()
            .filter(|record| record.status.is_terminal())
            .cloned()
            .collect();
        completed.sort_by(|a, b| {
            (b.completed_at, b.id).cmp(&(a.completed_at, a.id))
        });
        if let Some(limit) = window {
            completed.truncate(limit);
        }
        completed
    };
    WorkSets {
        stages: keep(&levels.stages),
        milestones: keep(&levels.milestones),
        tasks: keep(&levels.tasks),
        subtasks: keep(&levels.subtasks),
        sidequests: keep(&levels.sidequests),
        items: keep(&levels.items),
    }
}

/// Nests the already-loaded rows; no second read pass.
fn build_tree(levels: &Levels) -> Vec<StageNode> {
    let mut items_by_parent: HashMap<(TargetKind, i64), Vec<WorkRecord>> = HashMap::new();
    for item in &levels.items {
        if let (Some(parent_kind), Some(parent_id)) = (item.parent_kind, item.parent_id) {
            items_by_parent
                .entry((parent_kind, parent_id))
                .or_default()
                .push(item.clone());
        }
    }

    let mut tasks_by_milestone: HashMap<i64, Vec<TaskNode>> = HashMap::new();
    for task in &levels.tasks {
        let Some(milestone_id) = task.parent_id else {
            continue;
        };
        let subtasks = levels
            .subtasks
            .iter()
            .filter(|subtask| subtask.parent_id == Some(task.id))
            .map(|subtask| SubtaskNode {
                record: subtask.clone(),
                items: items_by_parent
                    .get(&(TargetKind::Subtask, subtask.id))
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect();
        let sidequests = levels
            .sidequests
            .iter()
            .filter(|sidequest| sidequest.parent_id == Some(task.id))
            .map(|sidequest| SidequestNode {
                record: sidequest.clone(),
                items: items_by_parent
                    .get(&(TargetKind::Sidequest, sidequest.id))
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect();
        tasks_by_milestone
            .entry(milestone_id)
            .or_default()
            .push(TaskNode {
                record: task.clone(),
                subtasks,
                sidequests,
                items: items_by_parent
                    .get(&(TargetKind::Task, task.id))
                    .cloned()
                    .unwrap_or_default(),
            });
    }

    let mut milestones_by_stage: HashMap<i64, Vec<MilestoneNode>> = HashMap::new();
    for milestone in &levels.milestones {
        let Some(stage_id) = milestone.parent_id else {
            continue;
        };
        milestones_by_stage
            .entry(stage_id)
            .or_default()
            .push(MilestoneNode {
                record: milestone.clone(),
                tasks: tasks_by_milestone.remove(&milestone.id).unwrap_or_default(),
            });
    }

    let mut stages: Vec<StageNode> = levels
        .stages
        .iter()
        .map(|stage| StageNode {
            record: stage.clone(),
            milestones: milestones_by_stage.remove(&stage.id).unwrap_or_default(),
        })
        .collect();
    stages.sort_by_key(|node| (node.record.position, node.record.id));
    stages
}
