use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const LOG_FOLDER_NAME: &str = "assessment_logs";
const APP_DIR_NAME: &str = "clinical-assessment";
const MAX_WALK_UP: usize = 12;

/// Folder the binary runs from, or the working directory.
pub fn resolve_executable_folder() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Nearest existing `assessment_logs/` at or above `start`.
pub fn find_log_folder_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .take(MAX_WALK_UP)
        .map(|dir| dir.join(LOG_FOLDER_NAME))
        .find(|candidate| candidate.is_dir())
}

/// Resolve (and create) the log folder.
///
/// Order: `configured`, an existing `assessment_logs/` above the working directory, the
/// platform data dir, then next to the executable.
pub fn resolve_log_folder(configured: Option<&Path>) -> Result<PathBuf> {
    let dir = match configured {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()
            .ok()
            .and_then(|cwd| find_log_folder_from(&cwd))
            .or_else(|| dirs::data_local_dir().map(|d| d.join(APP_DIR_NAME).join("logs")))
            .unwrap_or_else(|| resolve_executable_folder().join(LOG_FOLDER_NAME)),
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log folder {}", dir.display()))?;
    Ok(dir)
}
