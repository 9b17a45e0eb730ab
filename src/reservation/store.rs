use crate::reservation::error::ReservationError;
use crate::reservation::{ArtifactKind, ArtifactRecord, ArtifactState, ContentMetadata};
use crate::store::{
    ensure_schema_version, open_connection, sql_error, PROJECT_SCHEMA_VERSION,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// Two-phase artifact naming over the project store's artifact table.
///
/// `reserve` claims a name and allocates the stable id; `finalize` commits
/// content metadata; `release` abandons a reservation that was never
/// finalized. Each transition is a single guarded statement, so no locking
/// beyond the row's uniqueness constraint is needed.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    db_path: PathBuf,
}

fn sql(source: rusqlite::Error) -> ReservationError {
    ReservationError::Store(sql_error(source))
}

const ARTIFACT_COLUMNS: &str =
    "id, kind, name, is_reserved, parent_file_id, path, checksum, signature, role, created_at, finalized_at";

type RawArtifact = (
    i64,
    String,
    String,
    bool,
    Option<i64>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    i64,
    Option<i64>,
);

fn map_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawArtifact> {
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
    ))
}

fn decode(raw: RawArtifact) -> ArtifactRecord {
    let (
        id,
        kind_raw,
        name,
        is_reserved,
        parent_file_id,
        path,
        checksum,
        signature,
        role,
        created_at,
        finalized_at,
    ) = raw;
    // The kind column only ever holds values written through ArtifactKind.
    let kind = ArtifactKind::parse(&kind_raw).unwrap_or(ArtifactKind::File);
    ArtifactRecord {
        id,
        kind,
        name,
        is_reserved,
        parent_file_id,
        path,
        checksum,
        signature,
        role,
        created_at,
        finalized_at,
    }
}

impl ArtifactStore {
    pub fn open(db_path: &Path) -> Result<Self, ReservationError> {
        let store = Self {
            db_path: db_path.to_path_buf(),
        };
        let _ = store.connect()?;
        Ok(store)
    }

    pub fn ensure_schema(&self) -> Result<(), ReservationError> {
        let connection = self.connect()?;
        connection
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS artifacts (
                    id INTEGER PRIMARY KEY,
                    kind TEXT NOT NULL,
                    name TEXT NOT NULL,
                    is_reserved INTEGER NOT NULL,
                    parent_file_id INTEGER REFERENCES artifacts(id),
                    path TEXT,
                    checksum TEXT,
                    signature TEXT,
                    role TEXT,
                    created_at INTEGER NOT NULL,
                    finalized_at INTEGER,
                    UNIQUE (kind, name)
                );

                CREATE INDEX IF NOT EXISTS idx_artifacts_reserved
                    ON artifacts(is_reserved, created_at);
                ",
            )
            .map_err(sql)?;
        ensure_schema_version(&connection, "project", PROJECT_SCHEMA_VERSION)?;
        Ok(())
    }

    /// Claims `name` and allocates the stable identifier. The uniqueness
    /// constraint spans reserved and finalized rows, so the collision check
    /// covers both states in one statement.
    pub fn reserve(
        &self,
        kind: ArtifactKind,
        name: &str,
        parent_file_id: Option<i64>,
        now: i64,
    ) -> Result<ArtifactRecord, ReservationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ReservationError::EmptyName { kind });
        }
        let connection = self.connect()?;

        if let Some(parent_id) = parent_file_id {
            let parent = self.get_on(&connection, parent_id)?;
            if parent.map(|record| record.kind) != Some(ArtifactKind::File) {
                return Err(ReservationError::UnknownParentFile {
                    kind,
                    name: name.to_string(),
                    parent_file_id: parent_id,
                });
            }
        }

        let inserted = connection
            .execute(
                "
                INSERT INTO artifacts (kind, name, is_reserved, parent_file_id, created_at)
                VALUES (?1, ?2, 1, ?3, ?4)
                ON CONFLICT(kind, name) DO NOTHING
                ",
                params![kind.as_str(), name, parent_file_id, now],
            )
            .map_err(sql)?;

        if inserted == 0 {
            let held = self
                .lookup_on(&connection, kind, name)?
                .map(|existing| existing.state())
                .unwrap_or(ArtifactState::Unknown);
            return Err(ReservationError::NameCollision {
                kind,
                name: name.to_string(),
                held,
            });
        }

        let id = connection.last_insert_rowid();
        self.get_on(&connection, id)?
            .ok_or(ReservationError::InvalidState {
                id,
                state: ArtifactState::Unknown,
            })
    }

    /// Flips a live reservation into a content-backed record. Requires the
    /// identifier to be currently reserved and the metadata variant to match
    /// the artifact's kind.
    pub fn finalize(
        &self,
        id: i64,
        metadata: &ContentMetadata,
        now: i64,
    ) -> Result<ArtifactRecord, ReservationError> {
        let connection = self.connect()?;
        let existing = match self.get_on(&connection, id)? {
            None => {
                return Err(ReservationError::InvalidState {
                    id,
                    state: ArtifactState::Unknown,
                })
            }
            Some(record) if !record.is_reserved => {
                return Err(ReservationError::InvalidState {
                    id,
                    state: ArtifactState::Finalized,
                })
            }
            Some(record) => record,
        };
        if metadata.kind() != existing.kind {
            return Err(ReservationError::MetadataMismatch {
                id,
                kind: existing.kind,
                metadata_kind: metadata.kind(),
            });
        }

        match metadata {
            ContentMetadata::File { path, checksum } => {
                connection
                    .execute(
                        "
                        UPDATE artifacts
                        SET is_reserved = 0, path = ?1, checksum = ?2, finalized_at = ?3
                        WHERE id = ?4 AND is_reserved = 1
                        ",
                        params![path, checksum, now, id],
                    )
                    .map_err(sql)?;
            }
            ContentMetadata::Function { signature, role }
            | ContentMetadata::Type { signature, role } => {
                connection
                    .execute(
                        "
                        UPDATE artifacts
                        SET is_reserved = 0, signature = ?1, role = ?2, finalized_at = ?3
                        WHERE id = ?4 AND is_reserved = 1
                        ",
                        params![signature, role, now, id],
                    )
                    .map_err(sql)?;
            }
        }

        self.get_on(&connection, id)?
            .ok_or(ReservationError::InvalidState {
                id,
                state: ArtifactState::Unknown,
            })
    }

    /// Abandons a reservation, freeing the name for reuse. Hard delete, not
    /// a soft flag: the name becomes immediately reclaimable.
    pub fn release(&self, id: i64) -> Result<(), ReservationError> {
        let connection = self.connect()?;
        let deleted = connection
            .execute(
                "DELETE FROM artifacts WHERE id = ?1 AND is_reserved = 1",
                params![id],
            )
            .map_err(sql)?;
        if deleted == 1 {
            return Ok(());
        }
        let state = self
            .get_on(&connection, id)?
            .map(|record| record.state())
            .unwrap_or(ArtifactState::Unknown);
        Err(ReservationError::InvalidState { id, state })
    }

    pub fn get(&self, id: i64) -> Result<Option<ArtifactRecord>, ReservationError> {
        let connection = self.connect()?;
        self.get_on(&connection, id)
    }

    pub fn lookup(
        &self,
        kind: ArtifactKind,
        name: &str,
    ) -> Result<Option<ArtifactRecord>, ReservationError> {
        let connection = self.connect()?;
        self.lookup_on(&connection, kind, name)
    }

    /// Reservations older than `older_than`, oldest first. There is no
    /// auto-expiry; surfacing stale reservations to the operator is the
    /// cleanup path.
    pub fn list_stale_reservations(
        &self,
        older_than: i64,
    ) -> Result<Vec<ArtifactRecord>, ReservationError> {
        let connection = self.connect()?;
        let statement = format!(
            "SELECT {ARTIFACT_COLUMNS} FROM artifacts
             WHERE is_reserved = 1 AND created_at <= ?1
             ORDER BY created_at ASC, id ASC"
        );
        let mut prepared = connection.prepare(&statement).map_err(sql)?;
        let rows = prepared.query_map(params![older_than], map_raw).map_err(sql)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(decode(row.map_err(sql)?));
        }
        Ok(out)
    }

    fn get_on(
        &self,
        connection: &Connection,
        id: i64,
    ) -> Result<Option<ArtifactRecord>, ReservationError> {
        let statement = format!("SELECT {ARTIFACT_COLUMNS} FROM artifacts WHERE id = ?1");
        let raw = connection
            .query_row(&statement, params![id], map_raw)
            .optional()
            .map_err(sql)?;
        Ok(raw.map(decode))
    }

    fn lookup_on(
        &self,
        connection: &Connection,
        kind: ArtifactKind,
        name: &str,
    ) -> Result<Option<ArtifactRecord>, ReservationError> {
        let statement =
            format!("SELECT {ARTIFACT_COLUMNS} FROM artifacts WHERE kind = ?1 AND name = ?2");
        let raw = connection
            .query_row(&statement, params![kind.as_str(), name], map_raw)
            .optional()
            .map_err(sql)?;
        Ok(raw.map(decode))
    }

    fn connect(&self) -> Result<Connection, ReservationError> {
        Ok(open_connection(&self.db_path)?)
    }
}
