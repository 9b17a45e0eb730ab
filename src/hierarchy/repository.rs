use crate::hierarchy::error::HierarchyError;
use crate::hierarchy::{NoteRecord, StatusAction, TargetKind, WorkPriority, WorkRecord, WorkStatus};
use crate::store::{
    ensure_schema_version, open_connection, sql_error, PROJECT_SCHEMA_VERSION,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// The mutable per-project store: the five-level work hierarchy plus notes.
/// Connections are opened per call; every status transition is a single-row
/// update.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    db_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchUpdate {
    pub kind: TargetKind,
    pub id: i64,
    pub action: StatusAction,
}

fn sql(source: rusqlite::Error) -> HierarchyError {
    HierarchyError::Store(sql_error(source))
}

type RawRow = (
    i64,
    String,
    String,
    String,
    Option<String>,
    Option<i64>,
    Option<i64>,
    bool,
    i64,
    Option<i64>,
    Option<i64>,
    i64,
);

fn base_select(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::Stage => {
            "SELECT id, name, status, priority, NULL, NULL, position, archived,
                    created_at, started_at, completed_at, updated_at
             FROM stages"
        }
        TargetKind::Milestone => {
            "SELECT id, name, status, priority, 'stage', stage_id, NULL, archived,
                    created_at, started_at, completed_at, updated_at
             FROM milestones"
        }
        TargetKind::Task => {
            "SELECT id, name, status, priority, 'milestone', milestone_id, NULL, archived,
                    created_at, started_at, completed_at, updated_at
             FROM tasks"
        }
        TargetKind::Subtask => {
            "SELECT id, name, status, priority, 'task', task_id, NULL, archived,
                    created_at, started_at, completed_at, updated_at
             FROM subtasks"
        }
        TargetKind::Sidequest => {
            "SELECT id, name, status, priority, 'task', task_id, NULL, archived,
                    created_at, started_at, completed_at, updated_at
             FROM sidequests"
        }
        TargetKind::Item => {
            "SELECT id, name, status, priority, parent_kind, parent_id, NULL, archived,
                    created_at, started_at, completed_at, updated_at
             FROM items"
        }
    }
}

fn map_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
    ))
}

fn decode_row(kind: TargetKind, raw: RawRow) -> Result<WorkRecord, HierarchyError> {
    let (
        id,
        name,
        status_raw,
        priority_raw,
        parent_kind_raw,
        parent_id,
        position,
        archived,
        created_at,
        started_at,
        completed_at,
        updated_at,
    ) = raw;
    let status = WorkStatus::parse(&status_raw).ok_or(HierarchyError::InvalidStatus {
        value: status_raw,
    })?;
    let priority =
        WorkPriority::parse(&priority_raw).ok_or(HierarchyError::InvalidPriority {
            value: priority_raw,
        })?;
    let parent_kind = match parent_kind_raw {
        None => None,
        Some(raw) => Some(
            TargetKind::parse(&raw).ok_or(HierarchyError::InvalidKind { value: raw })?,
        ),
    };
    Ok(WorkRecord {
        kind,
        id,
        name,
        status,
        priority,
        parent_kind,
        parent_id,
        position,
        archived,
        created_at,
        started_at,
        completed_at,
        updated_at,
    })
}

fn get_on(
    connection: &Connection,
    kind: TargetKind,
    id: i64,
) -> Result<WorkRecord, HierarchyError> {
    let statement = format!("{} WHERE id = ?1 AND archived = 0", base_select(kind));
    let raw = connection
        .query_row(&statement, params![id], map_raw)
        .optional()
        .map_err(sql)?;
    decode_row(kind, raw.ok_or(HierarchyError::NotFound { kind, id })?)
}

fn apply_on(
    connection: &Connection,
    kind: TargetKind,
    id: i64,
    action: StatusAction,
    now: i64,
) -> Result<WorkRecord, HierarchyError> {
    if action == StatusAction::Block && !kind.allows_blocked() {
        return Err(HierarchyError::BlockedUnsupported { kind });
    }
    let record = get_on(connection, kind, id)?;
    let next = action
        .next_status(record.status)
        .ok_or(HierarchyError::InvalidTransition {
            kind,
            id,
            action,
            from: record.status,
        })?;
    let table = kind.table();
    match next {
        WorkStatus::InProgress => {
            let statement = format!(
                "UPDATE {table} SET status = ?1, started_at = COALESCE(started_at, ?2), updated_at = ?2 WHERE id = ?3"
            );
            connection
                .execute(&statement, params![next.as_str(), now, id])
                .map_err(sql)?;
        }
        WorkStatus::Completed => {
            let statement = format!(
                "UPDATE {table} SET status = ?1, completed_at = ?2, updated_at = ?2 WHERE id = ?3"
            );
            connection
                .execute(&statement, params![next.as_str(), now, id])
                .map_err(sql)?;
        }
        WorkStatus::Pending | WorkStatus::Blocked => {
            let statement =
                format!("UPDATE {table} SET status = ?1, updated_at = ?2 WHERE id = ?3");
            connection
                .execute(&statement, params![next.as_str(), now, id])
                .map_err(sql)?;
        }
    }
    get_on(connection, kind, id)
}

impl ProjectRepository {
    pub fn open(db_path: &Path) -> Result<Self, HierarchyError> {
        let repository = Self {
            db_path: db_path.to_path_buf(),
        };
        let _ = repository.connect()?;
        Ok(repository)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn ensure_schema(&self) -> Result<(), HierarchyError> {
        let connection = self.connect()?;
        connection
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS stages (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    status TEXT NOT NULL,
                    priority TEXT NOT NULL,
                    position INTEGER NOT NULL,
                    archived INTEGER NOT NULL DEFAULT 0,
                    created_at INTEGER NOT NULL,
                    started_at INTEGER,
                    completed_at INTEGER,
                    updated_at INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS milestones (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    status TEXT NOT NULL,
                    priority TEXT NOT NULL,
                    stage_id INTEGER NOT NULL REFERENCES stages(id),
                    archived INTEGER NOT NULL DEFAULT 0,
                    created_at INTEGER NOT NULL,
                    started_at INTEGER,
                    completed_at INTEGER,
                    updated_at INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS tasks (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    status TEXT NOT NULL,
                    priority TEXT NOT NULL,
                    milestone_id INTEGER NOT NULL REFERENCES milestones(id),
                    archived INTEGER NOT NULL DEFAULT 0,
                    created_at INTEGER NOT NULL,
                    started_at INTEGER,
                    completed_at INTEGER,
                    updated_at INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS subtasks (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    status TEXT NOT NULL,
                    priority TEXT NOT NULL,
                    task_id INTEGER NOT NULL REFERENCES tasks(id),
                    archived INTEGER NOT NULL DEFAULT 0,
                    created_at INTEGER NOT NULL,
                    started_at INTEGER,
                    completed_at INTEGER,
                    updated_at INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS sidequests (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    status TEXT NOT NULL,
                    priority TEXT NOT NULL,
                    task_id INTEGER NOT NULL REFERENCES tasks(id),
                    archived INTEGER NOT NULL DEFAULT 0,
                    created_at INTEGER NOT NULL,
                    started_at INTEGER,
                    completed_at INTEGER,
                    updated_at INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS items (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    status TEXT NOT NULL,
                    priority TEXT NOT NULL,
                    parent_kind TEXT NOT NULL,
                    parent_id INTEGER NOT NULL,
                    archived INTEGER NOT NULL DEFAULT 0,
                    created_at INTEGER NOT NULL,
                    started_at INTEGER,
                    completed_at INTEGER,
                    updated_at INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS notes (
                    id INTEGER PRIMARY KEY,
                    target_kind TEXT NOT NULL,
                    target_id INTEGER NOT NULL,
                    content TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_milestones_stage ON milestones(stage_id);
                CREATE INDEX IF NOT EXISTS idx_tasks_milestone ON tasks(milestone_id);
                CREATE INDEX IF NOT EXISTS idx_subtasks_task ON subtasks(task_id);
                CREATE INDEX IF NOT EXISTS idx_sidequests_task ON sidequests(task_id);
                CREATE INDEX IF NOT EXISTS idx_items_parent ON items(parent_kind, parent_id);
                CREATE INDEX IF NOT EXISTS idx_notes_target ON notes(target_kind, target_id);
                ",
            )
            .map_err(sql)?;
        ensure_schema_version(&connection, "project", PROJECT_SCHEMA_VERSION)?;
        Ok(())
    }

    pub fn create(
        &self,
        kind: TargetKind,
        name: &str,
        parent: Option<(TargetKind, i64)>,
        priority: WorkPriority,
        now: i64,
    ) -> Result<WorkRecord, HierarchyError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HierarchyError::EmptyName { kind });
        }
        let expected = kind.expected_parents();
        let connection = self.connect()?;
        let parent = match (expected.is_empty(), parent) {
            (true, None) => None,
            (true, Some((parent_kind, _))) => {
                return Err(HierarchyError::InvalidParent {
                    kind,
                    expected: "no".to_string(),
                    actual: parent_kind.to_string(),
                })
            }
            (false, None) => {
                return Err(HierarchyError::InvalidParent {
                    kind,
                    expected: expected_parents_label(expected),
                    actual: "none".to_string(),
                })
            }
            (false, Some((parent_kind, parent_id))) => {
                if !expected.contains(&parent_kind) {
                    return Err(HierarchyError::InvalidParent {
                        kind,
                        expected: expected_parents_label(expected),
                        actual: parent_kind.to_string(),
                    });
                }
                // Parent must exist and not be archived.
                get_on(&connection, parent_kind, parent_id)?;
                Some((parent_kind, parent_id))
            }
        };

        match kind {
            TargetKind::Stage => {
                connection
                    .execute(
                        "
                        INSERT INTO stages (name, status, priority, position, archived, created_at, updated_at)
                        VALUES (?1, 'pending', ?2,
                                (SELECT COALESCE(MAX(position), 0) + 1 FROM stages),
                                0, ?3, ?3)
                        ",
                        params![name, priority.as_str(), now],
                    )
                    .map_err(sql)?;
            }
            TargetKind::Milestone | TargetKind::Task | TargetKind::Subtask | TargetKind::Sidequest => {
                let Some((_, parent_id)) = parent else {
                    return Err(HierarchyError::InvalidParent {
                        kind,
                        expected: expected_parents_label(expected),
                        actual: "none".to_string(),
                    });
                };
                let parent_column = match kind {
                    TargetKind::Milestone => "stage_id",
                    TargetKind::Task => "milestone_id",
                    _ => "task_id",
                };
                let statement = format!(
                    "INSERT INTO {} (name, status, priority, {parent_column}, archived, created_at, updated_at)
                     VALUES (?1, 'pending', ?2, ?3, 0, ?4, ?4)",
                    kind.table()
                );
                connection
                    .execute(&statement, params![name, priority.as_str(), parent_id, now])
                    .map_err(sql)?;
            }
            TargetKind::Item => {
                let Some((parent_kind, parent_id)) = parent else {
                    return Err(HierarchyError::InvalidParent {
                        kind,
                        expected: expected_parents_label(expected),
                        actual: "none".to_string(),
                    });
                };
                connection
                    .execute(
                        "
                        INSERT INTO items (name, status, priority, parent_kind, parent_id, archived, created_at, updated_at)
                        VALUES (?1, 'pending', ?2, ?3, ?4, 0, ?5, ?5)
                        ",
                        params![name, priority.as_str(), parent_kind.as_str(), parent_id, now],
                    )
                    .map_err(sql)?;
            }
        }

        let id = connection.last_insert_rowid();
        get_on(&connection, kind, id)
    }

    pub fn get(&self, kind: TargetKind, id: i64) -> Result<WorkRecord, HierarchyError> {
        let connection = self.connect()?;
        get_on(&connection, kind, id)
    }

    /// All live (non-archived) records of one level, id order.
    pub fn load_all(&self, kind: TargetKind) -> Result<Vec<WorkRecord>, HierarchyError> {
        let connection = self.connect()?;
        let statement = format!("{} WHERE archived = 0 ORDER BY id ASC", base_select(kind));
        let mut prepared = connection.prepare(&statement).map_err(sql)?;
        let rows = prepared.query_map([], map_raw).map_err(sql)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(decode_row(kind, row.map_err(sql)?)?);
        }
        Ok(out)
    }

    pub fn apply(
        &self,
        kind: TargetKind,
        id: i64,
        action: StatusAction,
        now: i64,
    ) -> Result<WorkRecord, HierarchyError> {
        let connection = self.connect()?;
        apply_on(&connection, kind, id, action, now)
    }

    /// One transaction; the first failure rolls everything back.
    pub fn apply_batch_atomic(
        &self,
        updates: &[BatchUpdate],
        now: i64,
    ) -> Result<Vec<WorkRecord>, HierarchyError> {
        let mut connection = self.connect()?;
        let tx = connection.transaction().map_err(sql)?;
        let mut applied = Vec::with_capacity(updates.len());
        for update in updates {
            applied.push(apply_on(&tx, update.kind, update.id, update.action, now)?);
        }
        tx.commit().map_err(sql)?;
        Ok(applied)
    }

    /// Continues past individual failures; callers get a per-item result.
    pub fn apply_batch_best_effort(
        &self,
        updates: &[BatchUpdate],
        now: i64,
    ) -> Result<Vec<Result<WorkRecord, HierarchyError>>, HierarchyError> {
        let connection = self.connect()?;
        Ok(updates
            .iter()
            .map(|update| apply_on(&connection, update.kind, update.id, update.action, now))
            .collect())
    }

    pub fn rename(
        &self,
        kind: TargetKind,
        id: i64,
        name: &str,
        now: i64,
    ) -> Result<WorkRecord, HierarchyError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HierarchyError::EmptyName { kind });
        }
        let connection = self.connect()?;
        get_on(&connection, kind, id)?;
        let statement = format!(
            "UPDATE {} SET name = ?1, updated_at = ?2 WHERE id = ?3",
            kind.table()
        );
        connection
            .execute(&statement, params![name, now, id])
            .map_err(sql)?;
        get_on(&connection, kind, id)
    }

    pub fn set_priority(
        &self,
        kind: TargetKind,
        id: i64,
        priority: WorkPriority,
        now: i64,
    ) -> Result<WorkRecord, HierarchyError> {
        let connection = self.connect()?;
        get_on(&connection, kind, id)?;
        let statement = format!(
            "UPDATE {} SET priority = ?1, updated_at = ?2 WHERE id = ?3",
            kind.table()
        );
        connection
            .execute(&statement, params![priority.as_str(), now, id])
            .map_err(sql)?;
        get_on(&connection, kind, id)
    }

    /// The explicit removal path. Archived rows disappear from every read
    /// but the row itself is kept.
    pub fn archive(
        &self,
        kind: TargetKind,
        id: i64,
        now: i64,
    ) -> Result<WorkRecord, HierarchyError> {
        let connection = self.connect()?;
        let mut record = get_on(&connection, kind, id)?;
        let statement = format!(
            "UPDATE {} SET archived = 1, updated_at = ?1 WHERE id = ?2",
            kind.table()
        );
        connection.execute(&statement, params![now, id]).map_err(sql)?;
        record.archived = true;
        record.updated_at = now;
        Ok(record)
    }

    pub fn add_note(
        &self,
        kind: TargetKind,
        id: i64,
        content: &str,
        now: i64,
    ) -> Result<NoteRecord, HierarchyError> {
        let connection = self.connect()?;
        get_on(&connection, kind, id)?;
        connection
            .execute(
                "INSERT INTO notes (target_kind, target_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![kind.as_str(), id, content, now],
            )
            .map_err(sql)?;
        Ok(NoteRecord {
            id: connection.last_insert_rowid(),
            target_kind: kind,
            target_id: id,
            content: content.to_string(),
            created_at: now,
        })
    }

    pub fn notes_for(&self, kind: TargetKind, id: i64) -> Result<Vec<NoteRecord>, HierarchyError> {
        let connection = self.connect()?;
        let mut statement = connection
            .prepare(
                "
                SELECT id, target_kind, target_id, content, created_at
                FROM notes
                WHERE target_kind = ?1 AND target_id = ?2
                ORDER BY created_at ASC, id ASC
                ",
            )
            .map_err(sql)?;
        let rows = statement
            .query_map(params![kind.as_str(), id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })
            .map_err(sql)?;
        let mut out = Vec::new();
        for row in rows {
            let (id, kind_raw, target_id, content, created_at) = row.map_err(sql)?;
            let target_kind = TargetKind::parse(&kind_raw)
                .ok_or(HierarchyError::InvalidKind { value: kind_raw })?;
            out.push(NoteRecord {
                id,
                target_kind,
                target_id,
                content,
                created_at,
            });
        }
        Ok(out)
    }

    fn connect(&self) -> Result<Connection, HierarchyError> {
        Ok(open_connection(&self.db_path)?)
    }
}

fn expected_parents_label(expected: &[TargetKind]) -> String {
    expected
        .iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join(" or ")
}
