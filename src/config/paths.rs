use std::path::{Path, PathBuf};

pub const STORES_DIR: &str = "stores";
pub const SETTINGS_FILE_NAME: &str = "dirigo.yaml";

/// Root-anchored locations for the four stores and the settings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn reference_db(&self) -> PathBuf {
        self.root.join(STORES_DIR).join("reference.sqlite3")
    }

    pub fn project_db(&self) -> PathBuf {
        self.root.join(STORES_DIR).join("project.sqlite3")
    }

    pub fn preferences_db(&self) -> PathBuf {
        self.root.join(STORES_DIR).join("preferences.sqlite3")
    }

    pub fn automation_db(&self) -> PathBuf {
        self.root.join(STORES_DIR).join("automation.sqlite3")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE_NAME)
    }
}
