//! Shared SQLite access for the four independently versioned stores.
//!
//! Every store carries its own `store_meta` schema-version marker so
//! migrations apply per store, never across store boundaries.

use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::Path;

pub const REFERENCE_SCHEMA_VERSION: i64 = 1;
pub const PROJECT_SCHEMA_VERSION: i64 = 1;
pub const PREFERENCES_SCHEMA_VERSION: i64 = 1;
pub const AUTOMATION_SCHEMA_VERSION: i64 = 1;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite open failed at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to create store parent {path}: {source}")]
    CreateParent {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("sqlite statement failed: {source}")]
    Sql {
        #[source]
        source: rusqlite::Error,
    },
    #[error("store `{store}` schema version {found} is newer than supported version {supported}")]
    SchemaVersionUnsupported {
        store: String,
        found: i64,
        supported: i64,
    },
    #[error("store `{store}` has invalid schema version marker `{value}`")]
    InvalidSchemaVersion { store: String, value: String },
}

pub(crate) fn sql_error(source: rusqlite::Error) -> StoreError {
    StoreError::Sql { source }
}

pub fn open_connection(db_path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).map_err(|source| StoreError::CreateParent {
            path: parent.display().to_string(),
            source,
        })?;
    }
    let connection = Connection::open(db_path).map_err(|source| StoreError::Open {
        path: db_path.display().to_string(),
        source,
    })?;
    connection
        .execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .map_err(sql_error)?;
    Ok(connection)
}

/// Reads or seeds the store's schema-version marker. A marker newer than
/// `supported` is a hard error; an older marker is bumped in place.
pub fn ensure_schema_version(
    connection: &Connection,
    store: &str,
    supported: i64,
) -> Result<(), StoreError> {
    connection
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS store_meta (key TEXT PRIMARY KEY, value TEXT NOT NULL);",
        )
        .map_err(sql_error)?;

    let existing: Option<String> = connection
        .query_row(
            "SELECT value FROM store_meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(sql_error)?;

    match existing {
        None => {
            connection
                .execute(
                    "INSERT INTO store_meta (key, value) VALUES ('schema_version', ?1)",
                    params![supported.to_string()],
                )
                .map_err(sql_error)?;
            Ok(())
        }
        Some(raw) => {
            let found = raw
                .parse::<i64>()
                .map_err(|_| StoreError::InvalidSchemaVersion {
                    store: store.to_string(),
                    value: raw.clone(),
                })?;
            if found > supported {
                return Err(StoreError::SchemaVersionUnsupported {
                    store: store.to_string(),
                    found,
                    supported,
                });
            }
            if found < supported {
                connection
                    .execute(
                        "UPDATE store_meta SET value = ?1 WHERE key = 'schema_version'",
                        params![supported.to_string()],
                    )
                    .map_err(sql_error)?;
            }
            Ok(())
        }
    }
}

pub fn schema_version(connection: &Connection) -> Result<Option<i64>, StoreError> {
    let raw: Option<String> = connection
        .query_row(
            "SELECT value FROM store_meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(sql_error)?;
    Ok(raw.and_then(|value| value.parse().ok()))
}
