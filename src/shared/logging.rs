use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn operations_log_path(project_root: &Path) -> PathBuf {
    project_root.join("logs/orchestrator.log")
}

pub fn append_operation_log_line(project_root: &Path, line: &str) -> std::io::Result<()> {
    let path = operations_log_path(project_root);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    writeln!(file, "{line}")
}
