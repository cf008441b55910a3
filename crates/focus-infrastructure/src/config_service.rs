//! Configuration service implementation.
//!
//! Loads `config.toml` (~/.config/focus/config.toml) and applies environment
//! overrides:
//!
//! - `FOCUS_COLLECTOR_URL`: collector endpoint
//! - `FOCUS_USER`: user identity

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use focus_core::config::FocusConfig;
use focus_core::error::{FocusError, Result};

use crate::paths::FocusPaths;

pub const ENV_COLLECTOR_URL: &str = "FOCUS_COLLECTOR_URL";
pub const ENV_USER: &str = "FOCUS_USER";

/// Loads and caches the application configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration, loaded on first access.
    config: Arc<RwLock<Option<FocusConfig>>>,
}

impl ConfigService {
    /// Uses the platform config file.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(FocusPaths::config_file()?))
    }

    /// Uses an explicit config file (for `--config` and tests).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading it from file if not cached.
    ///
    /// A missing file yields the defaults; a malformed file is an error.
    pub fn get_config(&self) -> Result<FocusConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let mut loaded = Self::load_file(&self.path)?;
        apply_env_overrides(&mut loaded, |key| env::var(key).ok());

        {
            let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = None;
    }

    fn load_file(path: &Path) -> Result<FocusConfig> {
        if !path.exists() {
            tracing::debug!(
                "[ConfigService] {} not found, using defaults",
                path.display()
            );
            return Ok(FocusConfig::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            FocusError::io(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: FocusConfig = toml::from_str(&content)?;
        tracing::debug!("[ConfigService] Loaded {}", path.display());
        Ok(config)
    }
}

/// Applies environment overrides through `lookup` (normally `std::env::var`).
///
/// Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut FocusConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = non_empty(ENV_COLLECTOR_URL) {
        tracing::debug!("[ConfigService] Collector endpoint from {}", ENV_COLLECTOR_URL);
        config.collector.endpoint = url;
    }
    if let Some(user) = non_empty(ENV_USER) {
        config.profile.user_id = Some(user);
    }
}
