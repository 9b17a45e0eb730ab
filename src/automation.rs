//! User-defined automation sibling store. Like preferences, it is only ever
//! read-composed into snapshots; cross-store writes never share a
//! transaction.

use crate::store::{
    ensure_schema_version, open_connection, sql_error, StoreError, AUTOMATION_SCHEMA_VERSION,
};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    Active,
    Paused,
}

impl FlowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowStatus::Active => "active",
            FlowStatus::Paused => "paused",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(FlowStatus::Active),
            "paused" => Some(FlowStatus::Paused),
            _ => None,
        }
    }
}

impl std::fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationFlowRecord {
    pub id: i64,
    pub name: String,
    pub status: FlowStatus,
    pub updated_at: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum AutomationError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid automation flow status `{value}` in automation store")]
    InvalidFlowStatus { value: String },
}

fn sql(source: rusqlite::Error) -> AutomationError {
    AutomationError::Store(sql_error(source))
}

#[derive(Debug, Clone)]
pub struct AutomationStore {
    db_path: PathBuf,
}

impl AutomationStore {
    pub fn open(db_path: &Path) -> Result<Self, AutomationError> {
        let store = Self {
            db_path: db_path.to_path_buf(),
        };
        let _ = store.connect()?;
        Ok(store)
    }

    pub fn ensure_schema(&self) -> Result<(), AutomationError> {
        let connection = self.connect()?;
        connection
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS automation_flows (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    status TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                );
                ",
            )
            .map_err(sql)?;
        ensure_schema_version(&connection, "automation", AUTOMATION_SCHEMA_VERSION)?;
        Ok(())
    }

    pub fn upsert_flow(
        &self,
        name: &str,
        status: FlowStatus,
        now: i64,
    ) -> Result<AutomationFlowRecord, AutomationError> {
        let connection = self.connect()?;
        connection
            .execute(
                "
                INSERT INTO automation_flows (name, status, updated_at) VALUES (?1, ?2, ?3)
                ON CONFLICT(name) DO UPDATE SET status=excluded.status, updated_at=excluded.updated_at
                ",
                params![name, status.as_str(), now],
            )
            .map_err(sql)?;
        let (id, updated_at): (i64, i64) = connection
            .query_row(
                "SELECT id, updated_at FROM automation_flows WHERE name = ?1",
                params![name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(sql)?;
        Ok(AutomationFlowRecord {
            id,
            name: name.to_string(),
            status,
            updated_at,
        })
    }

    pub fn list_flows(&self) -> Result<Vec<AutomationFlowRecord>, AutomationError> {
        let connection = self.connect()?;
        let mut statement = connection
            .prepare("SELECT id, name, status, updated_at FROM automation_flows ORDER BY name ASC")
            .map_err(sql)?;
        let rows = statement
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })
            .map_err(sql)?;
        let mut out = Vec::new();
        for row in rows {
            let (id, name, status_raw, updated_at) = row.map_err(sql)?;
            let status = FlowStatus::parse(&status_raw)
                .ok_or(AutomationError::InvalidFlowStatus { value: status_raw })?;
            out.push(AutomationFlowRecord {
                id,
                name,
                status,
                updated_at,
            });
        }
        Ok(out)
    }

    pub fn active_flow_count(&self) -> Result<u64, AutomationError> {
        let connection = self.connect()?;
        let count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM automation_flows WHERE status = 'active'",
                [],
                |row| row.get(0),
            )
            .map_err(sql)?;
        Ok(count as u64)
    }

    fn connect(&self) -> Result<Connection, AutomationError> {
        Ok(open_connection(&self.db_path)?)
    }
}
