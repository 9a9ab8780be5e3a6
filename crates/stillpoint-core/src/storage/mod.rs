mod config;
pub mod database;
pub mod draft;

pub use config::{ApiConfig, AudioConfig, Config, PracticeConfig};
pub use database::{Database, PracticeRecord, Stats};
pub use draft::{pending_draft, Draft, DraftStore, MemoryDraftStore, SqliteDraftStore};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns `~/.config/stillpoint[-dev]/` based on STILLPOINT_ENV.
///
/// Set STILLPOINT_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STILLPOINT_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("stillpoint-dev")
    } else {
        base_dir.join("stillpoint")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
