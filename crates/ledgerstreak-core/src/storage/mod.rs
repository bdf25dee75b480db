mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, DatabaseConfig, MilestonesConfig, ScoringConfig};
pub use database::SqliteScoreStore;

use std::path::PathBuf;

use crate::error::Result;

/// Returns the data directory, creating it if needed.
///
/// Resolution order:
/// - `LEDGERSTREAK_DATA_DIR` if set
/// - `~/.config/ledgerstreak-dev/` when `LEDGERSTREAK_ENV=dev`
/// - `~/.config/ledgerstreak/`
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("LEDGERSTREAK_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env =
                std::env::var("LEDGERSTREAK_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("ledgerstreak-dev")
            } else {
                base_dir.join("ledgerstreak")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
