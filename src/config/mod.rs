mod error;
mod paths;
mod settings;

pub use error::ConfigError;
pub use paths::{ProjectPaths, SETTINGS_FILE_NAME, STORES_DIR};
pub use settings::{load_settings, Settings, DEFAULT_RECENT_WINDOW};
