//! Unified path management for Focus files.
//!
//! All paths are resolved via AppPaths from the version-migrate crate.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/focus/             # Config directory
//! ├── config.toml              # Application configuration
//! └── logs/                    # Application logs
//!     └── focus.log.YYYY-MM-DD
//!
//! ~/.local/share/focus/        # Data directory
//! └── store/                   # Durable store (one file per key)
//!     └── focus.timer.snapshot.json
//! ```

use std::path::PathBuf;

use focus_core::error::{FocusError, Result};
use version_migrate::AppPaths;

pub struct FocusPaths;

impl FocusPaths {
    fn app_paths() -> AppPaths {
        AppPaths::new("focus")
    }

    pub fn config_dir() -> Result<PathBuf> {
        Self::app_paths()
            .config_dir()
            .map_err(|_| FocusError::config("Cannot determine config directory"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        Self::app_paths()
            .data_dir()
            .map_err(|_| FocusError::config("Cannot determine data directory"))
    }

    /// Path to `config.toml`.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Directory of the durable store shared by every page.
    pub fn store_dir() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("store"))
    }

    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("logs"))
    }
}
