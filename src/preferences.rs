//! User preferences sibling store. Read-composed into status snapshots;
//! never written in the same transaction as any other store.

use crate::store::{
    ensure_schema_version, open_connection, sql_error, StoreError, PREFERENCES_SCHEMA_VERSION,
};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const USER_MODE_KEY: &str = "user_mode";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserMode {
    #[default]
    Development,
    AutomationBuild,
}

impl UserMode {
    pub fn as_str(self) -> &'static str {
        match self {
            UserMode::Development => "development",
            UserMode::AutomationBuild => "automation_build",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "development" => Some(UserMode::Development),
            "automation_build" => Some(UserMode::AutomationBuild),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid user mode `{value}` in preferences store")]
    InvalidUserMode { value: String },
}

fn sql(source: rusqlite::Error) -> PreferenceError {
    PreferenceError::Store(sql_error(source))
}

#[derive(Debug, Clone)]
pub struct PreferencesStore {
    db_path: PathBuf,
}

impl PreferencesStore {
    pub fn open(db_path: &Path) -> Result<Self, PreferenceError> {
        let store = Self {
            db_path: db_path.to_path_buf(),
        };
        let _ = store.connect()?;
        Ok(store)
    }

    pub fn ensure_schema(&self) -> Result<(), PreferenceError> {
        let connection = self.connect()?;
        connection
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS preferences (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                );
                ",
            )
            .map_err(sql)?;
        ensure_schema_version(&connection, "preferences", PREFERENCES_SCHEMA_VERSION)?;
        Ok(())
    }

    pub fn set_value(&self, key: &str, value: &str, now: i64) -> Result<(), PreferenceError> {
        let connection = self.connect()?;
        connection
            .execute(
                "
                INSERT INTO preferences (key, value, updated_at) VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=excluded.updated_at
                ",
                params![key, value, now],
            )
            .map_err(sql)?;
        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let connection = self.connect()?;
        connection
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql)
    }

    pub fn set_user_mode(&self, mode: UserMode, now: i64) -> Result<(), PreferenceError> {
        self.set_value(USER_MODE_KEY, mode.as_str(), now)
    }

    /// Defaults to regular development when nothing is stored.
    pub fn user_mode(&self) -> Result<UserMode, PreferenceError> {
        match self.get_value(USER_MODE_KEY)? {
            None => Ok(UserMode::default()),
            Some(raw) => {
                UserMode::parse(&raw).ok_or(PreferenceError::InvalidUserMode { value: raw })
            }
        }
    }

    fn connect(&self) -> Result<Connection, PreferenceError> {
        Ok(open_connection(&self.db_path)?)
    }
}
