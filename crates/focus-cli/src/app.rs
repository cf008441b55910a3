//! Wiring of the production adapters.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use focus_application::{IndicatorView, TimerPage, TimerPageDeps, TimerPageOptions};
use focus_core::clock::SystemClock;
use focus_core::config::FocusConfig;
use focus_core::page::PageContext;
use focus_core::session::SnapshotRepository;
use focus_infrastructure::{
    ConfigService, FileStore, FocusPaths, HttpLogCollector, StoreSnapshotRepository,
};

use crate::notifier::TerminalNotifier;

/// User id for pages opened without `--user` or a configured profile.
pub const DEFAULT_USER: &str = "local";

pub struct App {
    pub config: FocusConfig,
    repository: Arc<StoreSnapshotRepository>,
    collector: Arc<HttpLogCollector>,
    clock: Arc<SystemClock>,
}

impl App {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let service = match config_path {
            Some(path) => ConfigService::with_path(path),
            None => ConfigService::new()?,
        };
        let config = service.get_config()?;

        let store_dir = match &config.store.dir {
            Some(dir) => dir.clone(),
            None => FocusPaths::store_dir()?,
        };
        tracing::debug!("[App] Store at {}", store_dir.display());
        let store = Arc::new(FileStore::new(store_dir, config.store.capacity_bytes));

        Ok(Self {
            repository: Arc::new(StoreSnapshotRepository::new(store)),
            collector: Arc::new(HttpLogCollector::from_config(&config.collector)),
            clock: Arc::new(SystemClock),
            config,
        })
    }

    /// Identity of the page this invocation opens.
    ///
    /// Without an explicit task (or user) the active session's own is used,
    /// so commands like `pause` act on it instead of discarding it.
    pub fn page_context(&self, user: Option<&str>, task: Option<&str>) -> PageContext {
        let stored = self
            .repository
            .load()
            .ok()
            .flatten()
            .filter(|snapshot| snapshot.active);

        let user_id = user
            .map(str::to_string)
            .or_else(|| self.config.profile.user_id.clone())
            .or_else(|| {
                stored
                    .as_ref()
                    .map(|s| s.user_id.clone())
                    .filter(|u| !u.is_empty())
            })
            .unwrap_or_else(|| DEFAULT_USER.to_string());
        let task_name = task
            .map(str::to_string)
            .or_else(|| stored.map(|s| s.task_name));

        PageContext::new(user_id, task_name.as_deref())
    }

    pub fn attach(&self, page: PageContext) -> Result<TimerPage> {
        let deps = TimerPageDeps {
            repository: self.repository.clone(),
            collector: self.collector.clone(),
            clock: self.clock.clone(),
            notifier: Arc::new(TerminalNotifier),
        };
        Ok(TimerPage::attach(
            deps,
            TimerPageOptions::from_config(&self.config),
            page,
        )?)
    }

    pub fn mount_indicator(&self) -> Result<IndicatorView> {
        Ok(IndicatorView::mount(
            self.repository.clone(),
            self.clock.clone(),
            self.config.timer.indicator_interval(),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_core::session::SessionMode;
    use tempfile::TempDir;

    fn app_in(temp_dir: &TempDir, profile: &str) -> App {
        let config_path = temp_dir.path().join("config.toml");
        let store_dir = temp_dir.path().join("store");
        std::fs::write(
            &config_path,
            format!(
                "{}\n[store]\ndir = {:?}\n",
                profile,
                store_dir.to_string_lossy()
            ),
        )
        .unwrap();
        App::load(Some(config_path)).unwrap()
    }

    #[tokio::test]
    async fn test_page_context_follows_active_session() {
        let temp_dir = TempDir::new().unwrap();
        let app = app_in(&temp_dir, "");

        let idle = app.page_context(None, None);
        assert_eq!(idle.user_id, DEFAULT_USER);
        assert_eq!(idle.task_name, "Untitled");

        let page = app
            .attach(app.page_context(Some("alice"), Some("Essay")))
            .unwrap();
        page.start(SessionMode::Work, None, None).unwrap();
        drop(page);

        let resumed = app.page_context(None, None);
        assert_eq!(resumed.user_id, "alice");
        assert_eq!(resumed.task_name, "Essay");
    }

    #[tokio::test]
    async fn test_profile_user_wins_over_stored_user() {
        let temp_dir = TempDir::new().unwrap();
        let app = app_in(&temp_dir, "[profile]\nuser_id = \"bob\"\n");
        assert_eq!(app.page_context(None, Some("Essay")).user_id, "bob");
        assert_eq!(app.page_context(Some("carol"), None).user_id, "carol");
    }
}
