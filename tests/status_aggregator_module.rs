use dirigo::automation::{AutomationStore, FlowStatus};
use dirigo::hierarchy::{
    ProjectRepository, StatusAction, TargetKind, WorkPriority, WorkStatus,
};
use dirigo::preferences::{PreferencesStore, UserMode};
use dirigo::status::{DetailLevel, StatusAggregator};
use tempfile::tempdir;

fn repository(temp: &tempfile::TempDir) -> ProjectRepository {
    let repo =
        ProjectRepository::open(&temp.path().join("project.sqlite3")).expect("open repository");
    repo.ensure_schema().expect("ensure schema");
    repo
}

fn chain(repo: &ProjectRepository, now: i64) -> (i64, i64, i64) {
    let stage = repo
        .create(TargetKind::Stage, "foundation", None, WorkPriority::Medium, now)
        .expect("create stage");
    let milestone = repo
        .create(
            TargetKind::Milestone,
            "auth flows",
            Some((TargetKind::Stage, stage.id)),
            WorkPriority::Medium,
            now,
        )
        .expect("create milestone");
    let task = repo
        .create(
            TargetKind::Task,
            "login endpoint",
            Some((TargetKind::Milestone, milestone.id)),
            WorkPriority::Medium,
            now,
        )
        .expect("create task");
    (stage.id, milestone.id, task.id)
}

fn complete(repo: &ProjectRepository, kind: TargetKind, id: i64, now: i64) {
    repo.apply(kind, id, StatusAction::Start, now).expect("start");
    repo.apply(kind, id, StatusAction::Complete, now + 1)
        .expect("complete");
}

#[test]
fn status_module_sidequests_outrank_subtasks_and_tasks_for_focus() {
    let temp = tempdir().expect("tempdir");
    let repo = repository(&temp);
    let (_, _, task_id) = chain(&repo, 100);

    repo.apply(TargetKind::Task, task_id, StatusAction::Start, 110)
        .expect("start task");
    let subtask = repo
        .create(
            TargetKind::Subtask,
            "session cookie",
            Some((TargetKind::Task, task_id)),
            WorkPriority::Medium,
            111,
        )
        .expect("create subtask");
    repo.apply(TargetKind::Subtask, subtask.id, StatusAction::Start, 120)
        .expect("start subtask");
    let sidequest = repo
        .create(
            TargetKind::Sidequest,
            "debug flaky test",
            Some((TargetKind::Task, task_id)),
            WorkPriority::High,
            112,
        )
        .expect("create sidequest");
    repo.apply(TargetKind::Sidequest, sidequest.id, StatusAction::Start, 115)
        .expect("start sidequest");

    let aggregator = StatusAggregator::new(&repo);
    let snapshot = aggregator
        .get_status(DetailLevel::Quick, 200)
        .expect("quick snapshot");

    // The sidequest started before the subtask, yet still holds focus.
    let focus = snapshot.focus.expect("focus present");
    assert_eq!(focus.kind, TargetKind::Sidequest);
    assert_eq!(focus.id, sidequest.id);
    assert_eq!(focus.paused_task_id, Some(task_id));
    assert!(snapshot.flags.has_active_sidequest);

    // With the sidequest done, the subtask takes over.
    complete(&repo, TargetKind::Sidequest, sidequest.id, 130);
    let snapshot = aggregator
        .get_status(DetailLevel::Quick, 201)
        .expect("second snapshot");
    let focus = snapshot.focus.expect("focus present");
    assert_eq!(focus.kind, TargetKind::Subtask);
    assert_eq!(focus.paused_task_id, Some(task_id));

    // And with the subtask done, the task itself.
    complete(&repo, TargetKind::Subtask, subtask.id, 140);
    let snapshot = aggregator
        .get_status(DetailLevel::Quick, 202)
        .expect("third snapshot");
    let focus = snapshot.focus.expect("focus present");
    assert_eq!(focus.kind, TargetKind::Task);
    assert_eq!(focus.paused_task_id, None);
}

#[test]
fn status_module_most_recently_started_wins_within_a_level() {
    let temp = tempdir().expect("tempdir");
    let repo = repository(&temp);
    let (_, milestone_id, _) = chain(&repo, 100);

    let earlier = repo
        .create(
            TargetKind::Task,
            "logout endpoint",
            Some((TargetKind::Milestone, milestone_id)),
            WorkPriority::Medium,
            101,
        )
        .expect("create earlier task");
    let later = repo
        .create(
            TargetKind::Task,
            "token refresh",
            Some((TargetKind::Milestone, milestone_id)),
            WorkPriority::Medium,
            102,
        )
        .expect("create later task");
    repo.apply(TargetKind::Task, earlier.id, StatusAction::Start, 110)
        .expect("start earlier");
    repo.apply(TargetKind::Task, later.id, StatusAction::Start, 120)
        .expect("start later");

    let snapshot = StatusAggregator::new(&repo)
        .get_status(DetailLevel::Quick, 200)
        .expect("snapshot");
    assert_eq!(snapshot.focus.expect("focus").id, later.id);
}

#[test]
fn status_module_detail_level_changes_verbosity_never_counts() {
    let temp = tempdir().expect("tempdir");
    let repo = repository(&temp);
    let (_, _, task_id) = chain(&repo, 100);
    repo.apply(TargetKind::Task, task_id, StatusAction::Start, 110)
        .expect("start task");

    let aggregator = StatusAggregator::new(&repo);
    let quick = aggregator
        .get_status(DetailLevel::Quick, 200)
        .expect("quick");
    let detailed = aggregator
        .get_status(DetailLevel::Detailed, 200)
        .expect("detailed");

    assert_eq!(quick.counts, detailed.counts);
    assert!(quick.incomplete.is_none());
    assert!(quick.tree.is_none());
    assert!(detailed.incomplete.is_some());
    assert!(detailed.tree.is_some());
    assert_eq!(quick.counts.tasks.in_progress, 1);
    assert_eq!(quick.counts.stages.pending, 1);
}

#[test]
fn status_module_incomplete_milestone_is_not_recommended() {
    let temp = tempdir().expect("tempdir");
    let repo = repository(&temp);
    let (_, milestone_id, first_task) = chain(&repo, 100);
    let second_task = repo
        .create(
            TargetKind::Task,
            "logout endpoint",
            Some((TargetKind::Milestone, milestone_id)),
            WorkPriority::Medium,
            101,
        )
        .expect("create second task");
    let third_task = repo
        .create(
            TargetKind::Task,
            "token refresh",
            Some((TargetKind::Milestone, milestone_id)),
            WorkPriority::Medium,
            102,
        )
        .expect("create third task");

    complete(&repo, TargetKind::Task, first_task, 110);
    complete(&repo, TargetKind::Task, second_task.id, 120);
    repo.apply(TargetKind::Task, third_task.id, StatusAction::Start, 130)
        .expect("start third task");

    let snapshot = StatusAggregator::new(&repo)
        .get_status(DetailLevel::Summary, 200)
        .expect("summary");

    assert!(!snapshot
        .recommendations
        .iter()
        .any(|rec| rec.kind == TargetKind::Milestone));
    let incomplete = snapshot.incomplete.expect("incomplete sets");
    assert_eq!(incomplete.tasks.len(), 1);
    assert_eq!(incomplete.tasks[0].id, third_task.id);
    assert_eq!(incomplete.tasks[0].status, WorkStatus::InProgress);
}

#[test]
fn status_module_completion_recommendations_cascade_upward() {
    let temp = tempdir().expect("tempdir");
    let repo = repository(&temp);
    let (stage_id, milestone_id, task_id) = chain(&repo, 100);

    let item = repo
        .create(
            TargetKind::Item,
            "write handler",
            Some((TargetKind::Task, task_id)),
            WorkPriority::Medium,
            101,
        )
        .expect("create item");
    complete(&repo, TargetKind::Item, item.id, 110);

    let snapshot = StatusAggregator::new(&repo)
        .get_status(DetailLevel::Summary, 200)
        .expect("summary");

    // All the task's children are done, so the task is eligible. The
    // milestone is not: its task is still open. Nothing auto-completes.
    let kinds: Vec<_> = snapshot
        .recommendations
        .iter()
        .map(|rec| rec.kind)
        .collect();
    assert_eq!(kinds, vec![TargetKind::Task]);
    let reloaded = repo.get(TargetKind::Task, task_id).expect("reload task");
    assert_eq!(reloaded.status, WorkStatus::Pending);

    // Completing the task makes the milestone eligible, then the stage.
    complete(&repo, TargetKind::Task, task_id, 120);
    let snapshot = StatusAggregator::new(&repo)
        .get_status(DetailLevel::Summary, 201)
        .expect("second summary");
    let kinds: Vec<_> = snapshot
        .recommendations
        .iter()
        .map(|rec| rec.kind)
        .collect();
    assert_eq!(kinds, vec![TargetKind::Milestone]);

    complete(&repo, TargetKind::Milestone, milestone_id, 130);
    let snapshot = StatusAggregator::new(&repo)
        .get_status(DetailLevel::Summary, 202)
        .expect("third summary");
    assert!(snapshot
        .recommendations
        .iter()
        .any(|rec| rec.kind == TargetKind::Stage && rec.id == stage_id));
}

#[test]
fn status_module_childless_records_are_never_recommended() {
    let temp = tempdir().expect("tempdir");
    let repo = repository(&temp);
    chain(&repo, 100);

    let snapshot = StatusAggregator::new(&repo)
        .get_status(DetailLevel::Summary, 200)
        .expect("summary");
    assert!(snapshot.recommendations.is_empty());
}

#[test]
fn status_module_summary_windows_recent_completions_detailed_does_not() {
    let temp = tempdir().expect("tempdir");
    let repo = repository(&temp);
    let (_, _, task_id) = chain(&repo, 100);

    for index in 0..7 {
        let item = repo
            .create(
                TargetKind::Item,
                &format!("item {index}"),
                Some((TargetKind::Task, task_id)),
                WorkPriority::Medium,
                200 + index,
            )
            .expect("create item");
        complete(&repo, TargetKind::Item, item.id, 300 + index * 10);
    }

    let aggregator = StatusAggregator::new(&repo).with_recent_window(5);
    let summary = aggregator
        .get_status(DetailLevel::Summary, 400)
        .expect("summary");
    let recent = summary.recent_completed.expect("recent sets");
    assert_eq!(recent.items.len(), 5);
    // Most recent completion first.
    assert_eq!(recent.items[0].name, "item 6");

    let detailed = aggregator
        .get_status(DetailLevel::Detailed, 400)
        .expect("detailed");
    assert_eq!(detailed.recent_completed.expect("recent sets").items.len(), 7);
}

#[test]
fn status_module_tree_nests_the_hierarchy_in_one_pass() {
    let temp = tempdir().expect("tempdir");
    let repo = repository(&temp);
    let (stage_id, milestone_id, task_id) = chain(&repo, 100);
    let subtask = repo
        .create(
            TargetKind::Subtask,
            "session cookie",
            Some((TargetKind::Task, task_id)),
            WorkPriority::Medium,
            101,
        )
        .expect("create subtask");
    repo.create(
        TargetKind::Item,
        "write handler",
        Some((TargetKind::Subtask, subtask.id)),
        WorkPriority::Medium,
        102,
    )
    .expect("create item");

    let snapshot = StatusAggregator::new(&repo)
        .get_status(DetailLevel::Summary, 200)
        .expect("summary");
    let tree = snapshot.tree.expect("tree");
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].record.id, stage_id);
    assert_eq!(tree[0].milestones.len(), 1);
    assert_eq!(tree[0].milestones[0].record.id, milestone_id);
    let task_node = &tree[0].milestones[0].tasks[0];
    assert_eq!(task_node.record.id, task_id);
    assert_eq!(task_node.subtasks.len(), 1);
    assert_eq!(task_node.subtasks[0].items.len(), 1);
}

#[test]
fn status_module_composes_flags_from_sibling_stores() {
    let temp = tempdir().expect("tempdir");
    let repo = repository(&temp);

    let preferences =
        PreferencesStore::open(&temp.path().join("preferences.sqlite3")).expect("open prefs");
    preferences.ensure_schema().expect("prefs schema");
    preferences
        .set_user_mode(UserMode::AutomationBuild, 100)
        .expect("set mode");

    let automation =
        AutomationStore::open(&temp.path().join("automation.sqlite3")).expect("open automation");
    automation.ensure_schema().expect("automation schema");
    automation
        .upsert_flow("nightly-docs", FlowStatus::Active, 100)
        .expect("upsert flow");

    let snapshot = StatusAggregator::new(&repo)
        .with_preferences(&preferences)
        .with_automation(&automation)
        .get_status(DetailLevel::Quick, 200)
        .expect("snapshot");

    // No stages yet: the project is uninitialized and has no open work.
    assert!(!snapshot.flags.is_initialized);
    assert!(!snapshot.flags.has_incomplete_items);
    assert_eq!(snapshot.flags.user_mode, UserMode::AutomationBuild);
    assert!(snapshot.flags.automation_active);

    chain(&repo, 300);
    let snapshot = StatusAggregator::new(&repo)
        .with_preferences(&preferences)
        .with_automation(&automation)
        .get_status(DetailLevel::Quick, 301)
        .expect("second snapshot");
    assert!(snapshot.flags.is_initialized);
    assert!(snapshot.flags.has_incomplete_items);

    automation
        .upsert_flow("nightly-docs", FlowStatus::Paused, 310)
        .expect("pause flow");
    let snapshot = StatusAggregator::new(&repo)
        .with_automation(&automation)
        .get_status(DetailLevel::Quick, 311)
        .expect("third snapshot");
    assert!(!snapshot.flags.automation_active);
    // Without the preferences store the mode falls back to development.
    assert_eq!(snapshot.flags.user_mode, UserMode::Development);
}
