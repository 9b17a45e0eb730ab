use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_RECENT_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Trailing window of recently completed records per hierarchy level in
    /// `summary` snapshots.
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
}

fn default_recent_window() -> usize {
    DEFAULT_RECENT_WINDOW
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recent_window: DEFAULT_RECENT_WINDOW,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recent_window == 0 {
            return Err(ConfigError::Validation(
                "recent_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads settings from the project's yaml file, defaulting when absent.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let settings: Settings = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    settings.validate()?;
    Ok(settings)
}
