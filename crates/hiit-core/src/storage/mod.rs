mod config;
pub mod database;

pub use config::{Config, CuesConfig, TimerConfig};
pub use database::{Database, WorkoutRecord, WorkoutStats};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/hiit[-dev]/` based on HIIT_ENV.
///
/// Set HIIT_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("HIIT_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("hiit-dev")
    } else {
        base_dir.join("hiit")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
