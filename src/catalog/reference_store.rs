use crate::catalog::error::CatalogError;
use crate::catalog::{DirectiveCategory, FlowType, WILDCARD_SOURCE};
use crate::shared::ids::{validate_identifier_value, DirectiveName};
use crate::store::{
    ensure_schema_version, open_connection, sql_error, REFERENCE_SCHEMA_VERSION,
};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// Writer side of the read-only reference store. Used for seeding and
/// catalog updates between runs; the running engine never writes here.
pub struct ReferenceStore {
    db_path: PathBuf,
}

impl ReferenceStore {
    pub fn open(db_path: &Path) -> Result<Self, CatalogError> {
        let store = Self {
            db_path: db_path.to_path_buf(),
        };
        // Fail fast when the path is unusable.
        let _ = store.connect()?;
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn ensure_schema(&self) -> Result<(), CatalogError> {
        let connection = self.connect()?;
        connection
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS directives (
                    name TEXT PRIMARY KEY,
                    category TEXT NOT NULL,
                    workflow TEXT NOT NULL,
                    confidence_threshold REAL NOT NULL
                );

                CREATE TABLE IF NOT EXISTS flow_edges (
                    id INTEGER PRIMARY KEY,
                    from_directive TEXT NOT NULL,
                    to_directive TEXT NOT NULL,
                    flow_type TEXT NOT NULL,
                    condition_key TEXT,
                    condition_value TEXT,
                    priority INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS catalog_meta (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_flow_edges_from
                    ON flow_edges(from_directive);
                ",
            )
            .map_err(sql_error)?;
        ensure_schema_version(&connection, "reference", REFERENCE_SCHEMA_VERSION)?;
        Ok(())
    }

    pub fn insert_directive(
        &self,
        name: &str,
        category: DirectiveCategory,
        workflow: &str,
        confidence_threshold: f64,
    ) -> Result<(), CatalogError> {
        let name =
            DirectiveName::parse(name).map_err(|reason| CatalogError::InvalidDirectiveName {
                name: name.to_string(),
                reason,
            })?;
        let connection = self.connect()?;
        connection
            .execute(
                "
                INSERT INTO directives (name, category, workflow, confidence_threshold)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(name) DO UPDATE SET
                    category=excluded.category,
                    workflow=excluded.workflow,
                    confidence_threshold=excluded.confidence_threshold
                ",
                params![
                    name.as_str(),
                    category.as_str(),
                    workflow,
                    confidence_threshold
                ],
            )
            .map_err(sql_error)?;
        Ok(())
    }

    pub fn insert_edge(
        &self,
        from_directive: &str,
        to_directive: &str,
        flow_type: FlowType,
        condition: Option<(&str, &str)>,
        priority: i64,
    ) -> Result<(), CatalogError> {
        if from_directive != WILDCARD_SOURCE {
            validate_identifier_value("directive name", from_directive).map_err(|reason| {
                CatalogError::InvalidDirectiveName {
                    name: from_directive.to_string(),
                    reason,
                }
            })?;
        }
        let connection = self.connect()?;
        connection
            .execute(
                "
                INSERT INTO flow_edges (
                    from_directive, to_directive, flow_type,
                    condition_key, condition_value, priority
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
                params![
                    from_directive,
                    to_directive,
                    flow_type.as_str(),
                    condition.map(|(key, _)| key),
                    condition.map(|(_, value)| value),
                    priority
                ],
            )
            .map_err(sql_error)?;
        Ok(())
    }

    pub fn set_root_directive(&self, name: &str) -> Result<(), CatalogError> {
        let connection = self.connect()?;
        connection
            .execute(
                "
                INSERT INTO catalog_meta (key, value) VALUES ('root_directive', ?1)
                ON CONFLICT(key) DO UPDATE SET value=excluded.value
                ",
                params![name],
            )
            .map_err(sql_error)?;
        Ok(())
    }

    pub(crate) fn connect(&self) -> Result<Connection, CatalogError> {
        Ok(open_connection(&self.db_path)?)
    }
}
