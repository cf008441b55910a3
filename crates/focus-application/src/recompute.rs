//! Periodic recompute task.
//!
//! The render cadence of a page. It never accumulates time itself: each tick
//! only asks the owner to recompute from timestamps, so skipped or delayed
//! ticks cause no drift.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;

/// A cancellable repeating task owned by the component that attached it.
///
/// Aborted by [`RecomputeTask::stop`] and on drop, so a page that goes away
/// never leaves a timer behind.
pub struct RecomputeTask {
    handle: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
}

impl RecomputeTask {
    /// Spawns the task on `runtime`. `on_tick` runs once per `interval`
    /// (first tick immediately) until it returns false or the task is stopped.
    pub fn spawn<F>(
        runtime: &tokio::runtime::Handle,
        interval: Duration,
        log_tag: &str,
        mut on_tick: F,
    ) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let tag = log_tag.to_string();
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = ticks.clone();

        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                counter.fetch_add(1, Ordering::Relaxed);
                if !on_tick() {
                    tracing::debug!("[{}] Recompute loop finished", tag);
                    break;
                }
            }
        });

        Self {
            handle: Some(handle),
            ticks,
        }
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for RecomputeTask {
    fn drop(&mut self) {
        self.stop();
    }
}
