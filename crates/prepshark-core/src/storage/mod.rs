mod config;
pub mod database;
pub mod migrations;
mod practice_store;

pub use config::{Config, EntitlementsConfig, LoggingConfig, PracticeConfig, QuestionsConfig};
pub use database::{Database, ImportSummary};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `PREPSHARK_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/prepshark/`, or `~/.config/prepshark-dev/` when
/// `PREPSHARK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("PREPSHARK_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("PREPSHARK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("prepshark-dev")
            } else {
                base_dir.join("prepshark")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
