//! Read-only session indicator for pages other than the timer page.
//!
//! Reads the slot once at mount and, if a session is active, recomputes a
//! compact frame on its own interval. It never writes to the store and never
//! reacts to later store changes until it is mounted again.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use url::form_urlencoded;

use focus_core::clock::Clock;
use focus_core::error::{FocusError, Result};
use focus_core::session::{SessionMode, SessionSnapshot, SnapshotRepository, TimerReading};

use crate::recompute::RecomputeTask;

const LOG_TAG: &str = "Indicator";

/// Link back to the timer page of `task_name`.
pub fn timer_link(user_id: &str, task_name: &str) -> String {
    let user: String = form_urlencoded::byte_serialize(user_id.as_bytes()).collect();
    let task: String = form_urlencoded::byte_serialize(task_name.as_bytes()).collect();
    format!("/timer/{}?task={}", user, task)
}

/// One rendered state of the indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorFrame {
    pub task_name: String,
    pub mode: SessionMode,
    /// "SESSION" or "BREAK".
    pub label: &'static str,
    /// `MM:SS` remaining, or `+MM:SS` in overtime.
    pub display: String,
    pub overtime: bool,
    pub running: bool,
    pub return_link: String,
}

impl IndicatorFrame {
    fn compute(snapshot: &SessionSnapshot, now: chrono::DateTime<chrono::Utc>) -> Self {
        let reading = TimerReading::new(
            snapshot.mode,
            snapshot.run_state,
            snapshot.current_elapsed(now),
            snapshot.current_duration(),
        );
        Self {
            task_name: snapshot.task_name.clone(),
            mode: snapshot.mode,
            label: snapshot.mode.label(),
            display: reading.display(),
            overtime: reading.is_overtime(),
            running: reading.is_running(),
            return_link: timer_link(&snapshot.user_id, &snapshot.task_name),
        }
    }
}

pub struct IndicatorView {
    snapshot: Option<SessionSnapshot>,
    clock: Arc<dyn Clock>,
    frame_tx: watch::Sender<Option<IndicatorFrame>>,
    task: Mutex<Option<RecomputeTask>>,
}

impl IndicatorView {
    /// Mounts the indicator. Hidden (no frame, no task) unless the slot holds
    /// an active session; an unreadable or unavailable store also hides it.
    ///
    /// Must be called inside a tokio runtime.
    pub fn mount(
        repository: Arc<dyn SnapshotRepository>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|_| FocusError::internal("indicator requires a tokio runtime"))?;

        let snapshot = match repository.load() {
            Ok(snapshot) => snapshot.filter(|s| s.active),
            Err(e) => {
                tracing::debug!("[{}] Hidden, store not readable: {}", LOG_TAG, e);
                None
            }
        };

        let initial = snapshot
            .as_ref()
            .map(|s| IndicatorFrame::compute(s, clock.now()));
        let (frame_tx, _) = watch::channel(initial);

        let view = Self {
            snapshot,
            clock,
            frame_tx,
            task: Mutex::new(None),
        };

        if let Some(snapshot) = view.snapshot.clone() {
            tracing::debug!(
                "[{}] Showing {} for '{}'",
                LOG_TAG,
                snapshot.mode,
                snapshot.task_name
            );
            let clock = view.clock.clone();
            let tx = view.frame_tx.clone();
            let task = RecomputeTask::spawn(&runtime, interval, LOG_TAG, move || {
                let frame = IndicatorFrame::compute(&snapshot, clock.now());
                tx.send_if_modified(|current| {
                    if current.as_ref() == Some(&frame) {
                        false
                    } else {
                        *current = Some(frame);
                        true
                    }
                });
                true
            });
            *view.task.lock().unwrap_or_else(|e| e.into_inner()) = Some(task);
        }

        Ok(view)
    }

    pub fn is_visible(&self) -> bool {
        self.snapshot.is_some()
    }

    /// The latest frame, or `None` when hidden.
    pub fn frame(&self) -> Option<IndicatorFrame> {
        self.frame_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<IndicatorFrame>> {
        self.frame_tx.subscribe()
    }

    /// Stops the recompute task.
    pub fn unmount(&self) {
        if let Some(mut task) = self.task.lock().unwrap_or_else(|e| e.into_inner()).take() {
            task.stop();
        }
    }
}

impl Drop for IndicatorView {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use focus_core::clock::ManualClock;
    use focus_core::session::{
        PhaseDurations, PhaseOutcome, PhaseRules, SessionMachine, SessionMetadata,
    };
    use focus_core::store::DurableStore;
    use focus_infrastructure::{MemoryStore, SNAPSHOT_KEY, StoreSnapshotRepository};

    fn setup() -> (Arc<StoreSnapshotRepository>, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::default());
        let repository = Arc::new(StoreSnapshotRepository::new(store.clone()));
        (repository, store, Arc::new(ManualClock::new(Utc::now())))
    }

    #[test]
    fn test_timer_link_encodes_task() {
        assert_eq!(timer_link("user1", "Essay"), "/timer/user1?task=Essay");
        assert_eq!(
            timer_link("user 1", "Write & edit"),
            "/timer/user+1?task=Write+%26+edit"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_without_session() {
        let (repository, _store, clock) = setup();
        let view = IndicatorView::mount(repository, clock, Duration::from_secs(1)).unwrap();
        assert!(!view.is_visible());
        assert_eq!(view.frame(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_break_counts_down() {
        let (repository, _store, clock) = setup();
        let durations = PhaseDurations::new(Duration::from_secs(1500), Duration::from_secs(600));
        let mut machine = SessionMachine::idle(PhaseRules {
            defaults: durations,
            ..PhaseRules::default()
        });
        let metadata = SessionMetadata::new("user1", "Essay");
        machine
            .start(SessionMode::Work, metadata.clone(), clock.now())
            .unwrap();
        machine
            .end_phase(PhaseOutcome::Advance, None, clock.now())
            .unwrap();
        machine
            .start(SessionMode::Break, metadata, clock.now())
            .unwrap();
        clock.advance(Duration::from_secs(200));
        repository.save(machine.snapshot().unwrap()).unwrap();

        let view = IndicatorView::mount(repository, clock.clone(), Duration::from_secs(1)).unwrap();
        let frame = view.frame().unwrap();
        assert_eq!(frame.label, "BREAK");
        assert_eq!(frame.display, "06:40");
        assert!(frame.running);
        assert_eq!(frame.return_link, "/timer/user1?task=Essay");

        let mut rx = view.subscribe();
        clock.advance(Duration::from_secs(500));
        tokio::time::sleep(Duration::from_millis(1100)).await;
        rx.changed().await.unwrap();
        let frame = rx.borrow().clone().unwrap();
        assert!(frame.overtime);
        assert_eq!(frame.display, "+01:40");
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_session_is_frozen() {
        let (repository, _store, clock) = setup();
        let mut machine = SessionMachine::idle(PhaseRules::default());
        machine
            .start(
                SessionMode::Work,
                SessionMetadata::new("user1", "Essay"),
                clock.now(),
            )
            .unwrap();
        clock.advance(Duration::from_secs(60));
        machine.pause(clock.now()).unwrap();
        repository.save(machine.snapshot().unwrap()).unwrap();

        let view = IndicatorView::mount(repository, clock.clone(), Duration::from_secs(1)).unwrap();
        clock.advance(Duration::from_secs(3600));
        tokio::time::sleep(Duration::from_secs(2)).await;
        let frame = view.frame().unwrap();
        assert_eq!(frame.display, "24:00");
        assert!(!frame.running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_never_writes() {
        let (repository, store, clock) = setup();
        let snapshot = SessionSnapshot::started(
            SessionMode::Work,
            SessionMetadata::new("user1", "Essay"),
            PhaseDurations::default(),
            clock.now(),
        );
        repository.save(&snapshot).unwrap();
        let before = store.get(SNAPSHOT_KEY).unwrap();

        let view = IndicatorView::mount(repository, clock.clone(), Duration::from_secs(1)).unwrap();
        clock.advance(Duration::from_secs(30 * 60));
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(view.frame().unwrap().overtime);
        view.unmount();

        assert_eq!(store.get(SNAPSHOT_KEY).unwrap(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_store_hides_indicator() {
        let (repository, store, clock) = setup();
        store.set_available(false);
        let view = IndicatorView::mount(repository, clock, Duration::from_secs(1)).unwrap();
        assert!(!view.is_visible());
    }
}
