//! Path Utilities
//!
//! Functions for resolving application directories.
//! Everything lives under ~/.code-insight/.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the application directory (~/.code-insight/)
pub fn code_insight_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".code-insight"))
}

/// Get the config file path (~/.code-insight/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(code_insight_dir()?.join("config.json"))
}

/// Get the database file path (~/.code-insight/analyses.db)
pub fn database_path() -> AppResult<PathBuf> {
    Ok(code_insight_dir()?.join("analyses.db"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Get the application directory, creating if it doesn't exist
pub fn ensure_code_insight_dir() -> AppResult<PathBuf> {
    let path = code_insight_dir()?;
    ensure_dir(&path)?;
    Ok(path)
}
