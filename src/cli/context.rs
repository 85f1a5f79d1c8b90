use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::core::errors::{Result, RevtrailError};

static REVTRAIL_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Initialize the global store directory path.
/// If `custom` is provided, uses that path; otherwise defaults to `.revtrail`.
pub fn init(custom: Option<&str>) {
    let dir = custom
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".revtrail"));
    let _ = REVTRAIL_DIR.set(dir);
}

/// Get the current store directory path.
pub fn revtrail_dir() -> &'static Path {
    REVTRAIL_DIR
        .get()
        .map(|p| p.as_path())
        .unwrap_or(Path::new(".revtrail"))
}

/// The store directory, or an error pointing at `revtrail init`.
pub fn require_initialized() -> Result<&'static Path> {
    let dir = revtrail_dir();
    if !dir.join("config.toml").exists() {
        return Err(RevtrailError::InvalidConfig {
            detail: format!(
                "revtrail not initialized in {}. Run 'revtrail init' first.",
                dir.display()
            ),
        });
    }
    Ok(dir)
}
