//! The timer page: the single writer of the session slot.
//!
//! A `TimerPage` is one attach of a page onto the shared store. It owns the
//! state machine for the lifetime of the page, persists after every mutation,
//! drives the completion detector from its recompute task and hands finished
//! phases to log delivery without waiting for the collector.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use focus_core::clock::Clock;
use focus_core::config::{FocusConfig, UnloadPolicy};
use focus_core::delivery::{DeliveryContext, LogCollector};
use focus_core::error::{FocusError, Result};
use focus_core::page::PageContext;
use focus_core::session::{
    CompletionDetector, FinalizedSessionRecord, MachineStatus, Notifier, PhaseDurations,
    PhaseOutcome, PhaseRules, SessionMachine, SessionMetadata, SessionMode, SnapshotRepository,
    TimerReading,
};

use crate::delivery::{DeliveryFailure, DeliveryRouter, RetryPolicy};
use crate::reconciler::{ReconcileOutcome, Reconciler, is_stale};
use crate::recompute::RecomputeTask;

const LOG_TAG: &str = "TimerPage";

/// Ports a timer page is wired to.
#[derive(Clone)]
pub struct TimerPageDeps {
    pub repository: Arc<dyn SnapshotRepository>,
    pub collector: Arc<dyn LogCollector>,
    pub clock: Arc<dyn Clock>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerPageOptions {
    pub rules: PhaseRules,
    pub retry: RetryPolicy,
    pub recompute_interval: Duration,
    pub unload_policy: UnloadPolicy,
}

impl Default for TimerPageOptions {
    fn default() -> Self {
        Self {
            rules: PhaseRules::default(),
            retry: RetryPolicy::default(),
            recompute_interval: Duration::from_millis(250),
            unload_policy: UnloadPolicy::Keep,
        }
    }
}

impl TimerPageOptions {
    pub fn from_config(config: &FocusConfig) -> Self {
        Self {
            rules: config.timer.phase_rules(),
            retry: RetryPolicy::from_config(&config.collector),
            recompute_interval: config.timer.recompute_interval(),
            unload_policy: config.timer.unload_policy,
        }
    }
}

/// What the page renders.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerView {
    pub status: MachineStatus,
    pub task_name: String,
    pub reading: Option<TimerReading>,
    pub durations: PhaseDurations,
    pub pending: bool,
    pub degraded: bool,
}

/// Result of [`TimerPage::unload`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnloadReport {
    /// Records re-sent by beacon because their foreground delivery had not
    /// finished.
    pub resent: usize,
    /// Record of the phase ended by `UnloadPolicy::Finalize`.
    pub finalized: Option<Uuid>,
}

struct InFlight {
    record: FinalizedSessionRecord,
    handle: Option<JoinHandle<()>>,
}

struct PageInner {
    page: PageContext,
    machine: Mutex<SessionMachine>,
    repository: Arc<dyn SnapshotRepository>,
    clock: Arc<dyn Clock>,
    detector: CompletionDetector,
    router: DeliveryRouter,
    in_flight: Mutex<HashMap<Uuid, InFlight>>,
    view_tx: watch::Sender<TimerView>,
    failure_tx: mpsc::UnboundedSender<DeliveryFailure>,
    degraded: AtomicBool,
    runtime: Handle,
    options: TimerPageOptions,
}

pub struct TimerPage {
    inner: Arc<PageInner>,
    recompute: Mutex<Option<RecomputeTask>>,
    failure_rx: Mutex<Option<mpsc::UnboundedReceiver<DeliveryFailure>>>,
    outcome: ReconcileOutcome,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl TimerPage {
    /// Attaches a timer page: reconciles the stored slot and, if a session
    /// exists, starts the recompute task.
    ///
    /// Must be called inside a tokio runtime.
    pub fn attach(deps: TimerPageDeps, options: TimerPageOptions, page: PageContext) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|_| FocusError::internal("timer page requires a tokio runtime"))?;

        let reconciled = Reconciler::new(deps.repository.clone(), options.rules).attach(&page);
        tracing::info!(
            "[{}] Attached for '{}' ({:?})",
            LOG_TAG,
            page.task_name,
            reconciled.outcome
        );

        let (failure_tx, failure_rx) = mpsc::unbounded_channel();
        let initial_view = build_view(
            &reconciled.machine,
            &page,
            deps.clock.now(),
            reconciled.degraded,
        );
        let (view_tx, _) = watch::channel(initial_view);

        let inner = Arc::new(PageInner {
            page,
            machine: Mutex::new(reconciled.machine),
            repository: deps.repository,
            clock: deps.clock,
            detector: CompletionDetector::new(deps.notifier),
            router: DeliveryRouter::new(deps.collector, options.retry),
            in_flight: Mutex::new(HashMap::new()),
            view_tx,
            failure_tx,
            degraded: AtomicBool::new(reconciled.degraded),
            runtime,
            options,
        });

        let page = Self {
            inner,
            recompute: Mutex::new(None),
            failure_rx: Mutex::new(Some(failure_rx)),
            outcome: reconciled.outcome,
        };
        if !lock(&page.inner.machine).is_idle() {
            page.start_recompute();
        }
        Ok(page)
    }

    pub fn page(&self) -> &PageContext {
        &self.inner.page
    }

    /// How the stored slot was handled at attach.
    pub fn reconcile_outcome(&self) -> &ReconcileOutcome {
        &self.outcome
    }

    pub fn is_degraded(&self) -> bool {
        self.inner.degraded.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> MachineStatus {
        lock(&self.inner.machine).status()
    }

    pub fn current_elapsed(&self) -> Duration {
        let now = self.inner.clock.now();
        lock(&self.inner.machine).current_elapsed(now)
    }

    pub fn view(&self) -> TimerView {
        self.inner.view_tx.borrow().clone()
    }

    /// Receives a new view on every recompute and mutation.
    pub fn subscribe(&self) -> watch::Receiver<TimerView> {
        self.inner.view_tx.subscribe()
    }

    /// Foreground deliveries that exhausted their attempts. Can be taken once.
    pub fn take_failures(&self) -> Option<mpsc::UnboundedReceiver<DeliveryFailure>> {
        lock(&self.failure_rx).take()
    }

    /// Records handed to foreground delivery and not yet settled.
    pub fn in_flight(&self) -> usize {
        lock(&self.inner.in_flight).len()
    }

    /// Starts `mode`.
    ///
    /// Rejected with [`FocusError::ActiveElsewhere`] when the slot holds an
    /// active session for another task or user, for instance one started in
    /// a different tab after this page attached.
    pub fn start(
        &self,
        mode: SessionMode,
        location: Option<String>,
        feeling_at_start: Option<String>,
    ) -> Result<()> {
        self.check_slot_owner()?;

        let metadata = SessionMetadata::new(
            self.inner.page.user_id.clone(),
            self.inner.page.task_name.clone(),
        )
        .with_location(location)
        .with_feeling(feeling_at_start);

        self.mutate("start", |machine, now| machine.start(mode, metadata, now))?;
        tracing::info!(
            "[{}] Started {} for '{}'",
            LOG_TAG,
            mode,
            self.inner.page.task_name
        );
        self.start_recompute();
        Ok(())
    }

    pub fn pause(&self) -> Result<()> {
        self.mutate("pause", |machine, now| machine.pause(now))
    }

    pub fn resume(&self) -> Result<()> {
        self.mutate("resume", |machine, now| machine.resume(now))
    }

    /// Ends the current phase and hands its record to foreground delivery.
    ///
    /// Returns as soon as the new state is persisted; delivery continues in
    /// the background. Returns the id of the record, if the phase produced
    /// one.
    pub fn end_phase(
        &self,
        outcome: PhaseOutcome,
        feeling_at_end: Option<String>,
    ) -> Result<Option<Uuid>> {
        let record =
            self.mutate("end phase", |machine, now| machine.end_phase(outcome, feeling_at_end, now))?;

        if lock(&self.inner.machine).is_idle() {
            self.stop_recompute();
        }

        Ok(record.map(|record| {
            let id = record.record_id;
            PageInner::dispatch_foreground(&self.inner, record);
            id
        }))
    }

    pub fn adjust_duration(&self, mode: SessionMode, duration: Duration) -> Result<Duration> {
        self.mutate("adjust duration", |machine, _| {
            machine.adjust_duration(mode, duration)
        })
    }

    pub fn step_duration(&self, mode: SessionMode, delta_minutes: i64) -> Result<Duration> {
        self.mutate("step duration", |machine, _| {
            machine.step_duration(mode, delta_minutes)
        })
    }

    /// Runs one recompute cycle now (completion check and view refresh).
    pub fn recompute(&self) -> TimerView {
        self.inner.recompute();
        self.view()
    }

    /// (Re)starts the recompute task, replacing any previous one.
    pub fn start_recompute(&self) {
        let mut slot = lock(&self.recompute);
        if let Some(mut previous) = slot.take() {
            previous.stop();
        }

        let weak: Weak<PageInner> = Arc::downgrade(&self.inner);
        let task = RecomputeTask::spawn(
            &self.inner.runtime,
            self.inner.options.recompute_interval,
            LOG_TAG,
            move || match weak.upgrade() {
                Some(inner) => {
                    inner.recompute();
                    true
                }
                None => false,
            },
        );
        *slot = Some(task);
    }

    pub fn stop_recompute(&self) {
        if let Some(mut task) = lock(&self.recompute).take() {
            task.stop();
        }
    }

    pub fn is_recomputing(&self) -> bool {
        lock(&self.recompute)
            .as_ref()
            .is_some_and(RecomputeTask::is_running)
    }

    /// Waits until every foreground delivery started by this page settles.
    pub async fn flush_deliveries(&self) {
        let handles: Vec<JoinHandle<()>> = lock(&self.inner.in_flight)
            .values_mut()
            .filter_map(|entry| entry.handle.take())
            .collect();
        for handle in handles {
            let _ = handle.await;
        }
    }

    /// Page-hide hook.
    ///
    /// Stops the recompute task, optionally finalizes the running phase
    /// (`UnloadPolicy::Finalize`), writes the slot once more and re-sends
    /// every record whose foreground delivery has not finished through the
    /// unload transport. Never blocks on the network.
    pub fn unload(&self) -> UnloadReport {
        self.stop_recompute();
        let mut report = UnloadReport::default();

        if self.inner.options.unload_policy == UnloadPolicy::Finalize {
            let now = self.inner.clock.now();
            let finalized = {
                let mut machine = lock(&self.inner.machine);
                let started = machine.snapshot().is_some_and(|s| s.has_started());
                if started {
                    match machine.end_phase(PhaseOutcome::Terminate, None, now) {
                        Ok(record) => record,
                        Err(e) => {
                            tracing::warn!("[{}] Finalize on unload failed: {}", LOG_TAG, e);
                            None
                        }
                    }
                } else {
                    None
                }
            };
            if let Some(record) = finalized {
                report.finalized = Some(record.record_id);
                self.inner.router.unload().send(record);
            }
        }

        self.inner.persist();

        let pending: Vec<InFlight> = lock(&self.inner.in_flight).drain().map(|(_, v)| v).collect();
        for entry in pending {
            if let Some(handle) = entry.handle {
                handle.abort();
            }
            self.inner.router.unload().send(entry.record);
            report.resent += 1;
        }

        tracing::info!(
            "[{}] Unloaded '{}' (resent {}, finalized {})",
            LOG_TAG,
            self.inner.page.task_name,
            report.resent,
            report.finalized.is_some()
        );
        report
    }

    /// Applies `op` to the machine, then persists and publishes.
    ///
    /// A rejected operation leaves the machine and the store untouched.
    fn mutate<T, F>(&self, operation: &str, op: F) -> Result<T>
    where
        F: FnOnce(&mut SessionMachine, chrono::DateTime<chrono::Utc>) -> Result<T>,
    {
        let now = self.inner.clock.now();
        let result = {
            let mut machine = lock(&self.inner.machine);
            op(&mut machine, now)
        };
        match result {
            Ok(value) => {
                self.inner.persist();
                self.inner.publish(now);
                Ok(value)
            }
            Err(e) => {
                tracing::debug!("[{}] {} rejected: {}", LOG_TAG, operation, e);
                Err(e)
            }
        }
    }

    fn check_slot_owner(&self) -> Result<()> {
        match self.inner.repository.load() {
            Ok(Some(stored)) if is_stale(&stored, &self.inner.page) => {
                tracing::warn!(
                    "[{}] Refusing to start '{}': '{}' is active elsewhere",
                    LOG_TAG,
                    self.inner.page.task_name,
                    stored.task_name
                );
                Err(FocusError::ActiveElsewhere {
                    task_name: stored.task_name,
                })
            }
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::debug!("[{}] Slot check skipped: {}", LOG_TAG, e);
                Ok(())
            }
        }
    }
}

impl Drop for TimerPage {
    fn drop(&mut self) {
        self.stop_recompute();
    }
}

impl PageInner {
    fn recompute(&self) {
        let now = self.clock.now();
        let fired = {
            let mut machine = lock(&self.machine);
            self.detector.observe(&mut machine, now)
        };
        if fired {
            tracing::info!("[{}] Phase target reached for '{}'", LOG_TAG, self.page.task_name);
            self.persist();
        }
        self.publish(now);
    }

    /// Writes the current state to the slot; a failure degrades the page to
    /// in-memory operation.
    fn persist(&self) {
        let result = {
            let machine = lock(&self.machine);
            match machine.snapshot() {
                Some(snapshot) => self.repository.save(snapshot),
                None => self.repository.clear(),
            }
        };
        match result {
            Ok(()) => {
                self.degraded.store(false, Ordering::SeqCst);
            }
            Err(e) => {
                if !self.degraded.swap(true, Ordering::SeqCst) {
                    tracing::warn!(
                        "[{}] Persistence unavailable, continuing in memory: {}",
                        LOG_TAG,
                        e
                    );
                }
            }
        }
    }

    fn publish(&self, now: chrono::DateTime<chrono::Utc>) {
        let view = {
            let machine = lock(&self.machine);
            build_view(&machine, &self.page, now, self.degraded.load(Ordering::SeqCst))
        };
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }

    fn dispatch_foreground(inner: &Arc<PageInner>, record: FinalizedSessionRecord) {
        let id = record.record_id;
        let delivery = inner.router.for_context(DeliveryContext::Foreground);
        let weak = Arc::downgrade(inner);
        let failure_tx = inner.failure_tx.clone();
        let payload = record.clone();

        // Hold the map lock across the spawn so the task cannot settle before
        // its entry exists.
        let mut in_flight = lock(&inner.in_flight);
        let handle = inner.runtime.spawn(async move {
            let result = delivery.deliver(payload.clone()).await;
            if let Some(inner) = weak.upgrade() {
                lock(&inner.in_flight).remove(&id);
            }
            if let Err(error) = result {
                let _ = failure_tx.send(DeliveryFailure {
                    record: payload,
                    error,
                });
            }
        });
        in_flight.insert(
            id,
            InFlight {
                record,
                handle: Some(handle),
            },
        );
    }
}

fn build_view(
    machine: &SessionMachine,
    page: &PageContext,
    now: chrono::DateTime<chrono::Utc>,
    degraded: bool,
) -> TimerView {
    TimerView {
        status: machine.status(),
        task_name: machine
            .snapshot()
            .map(|s| s.task_name.clone())
            .unwrap_or_else(|| page.task_name.clone()),
        reading: machine.reading(now),
        durations: machine.durations(),
        pending: machine.is_pending(),
        degraded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::IndicatorView;
    use crate::testing::{MockCollector, MockNotifier};
    use chrono::Utc;
    use focus_core::clock::ManualClock;
    use focus_core::store::DurableStore;
    use focus_infrastructure::{MemoryStore, SNAPSHOT_KEY, StoreSnapshotRepository};

    struct Harness {
        store: Arc<MemoryStore>,
        repository: Arc<StoreSnapshotRepository>,
        collector: Arc<MockCollector>,
        clock: Arc<ManualClock>,
        notifier: Arc<MockNotifier>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_collector(MockCollector::default())
        }

        fn with_collector(collector: MockCollector) -> Self {
            let store = Arc::new(MemoryStore::default());
            Self {
                repository: Arc::new(StoreSnapshotRepository::new(store.clone())),
                store,
                collector: Arc::new(collector),
                clock: Arc::new(ManualClock::new(Utc::now())),
                notifier: Arc::new(MockNotifier::default()),
            }
        }

        fn deps(&self) -> TimerPageDeps {
            TimerPageDeps {
                repository: self.repository.clone(),
                collector: self.collector.clone(),
                clock: self.clock.clone(),
                notifier: self.notifier.clone(),
            }
        }

        fn attach(&self, task: &str) -> TimerPage {
            self.attach_with(task, TimerPageOptions::default())
        }

        fn attach_with(&self, task: &str, options: TimerPageOptions) -> TimerPage {
            TimerPage::attach(self.deps(), options, PageContext::new("user1", Some(task))).unwrap()
        }

        fn short_phases() -> TimerPageOptions {
            TimerPageOptions {
                rules: PhaseRules {
                    min: Duration::from_secs(1),
                    ..PhaseRules::default()
                },
                ..TimerPageOptions::default()
            }
        }
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_resume_scenario() {
        let h = Harness::new();
        let page = h.attach("Essay");
        page.adjust_duration(SessionMode::Work, secs(1500)).unwrap();
        page.start(SessionMode::Work, None, None).unwrap();

        h.clock.advance(secs(10));
        page.pause().unwrap();
        assert_eq!(page.current_elapsed(), secs(10));

        page.resume().unwrap();
        h.clock.advance(secs(5));
        assert_eq!(page.current_elapsed(), secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_mutation_is_persisted() {
        let h = Harness::new();
        let page = h.attach("Essay");
        page.start(SessionMode::Work, None, None).unwrap();
        let stored = h.repository.load().unwrap().unwrap();
        assert!(stored.is_running());

        h.clock.advance(secs(20));
        page.pause().unwrap();
        let stored = h.repository.load().unwrap().unwrap();
        assert_eq!(stored.elapsed_before_current_run, secs(20));
        assert!(stored.phase_started_at.is_none());

        page.end_phase(PhaseOutcome::Terminate, None).unwrap();
        assert_eq!(h.store.get(SNAPSHOT_KEY).unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_operation_leaves_store_untouched() {
        let h = Harness::new();
        let page = h.attach("Essay");
        assert!(page.pause().unwrap_err().is_invalid_transition());
        assert_eq!(h.store.get(SNAPSHOT_KEY).unwrap(), None);

        page.start(SessionMode::Work, None, None).unwrap();
        let before = h.store.get(SNAPSHOT_KEY).unwrap();
        assert!(page
            .adjust_duration(SessionMode::Work, secs(600))
            .unwrap_err()
            .is_invalid_transition());
        assert_eq!(h.store.get(SNAPSHOT_KEY).unwrap(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_phase_completes_once_and_keeps_running() {
        let h = Harness::new();
        let page = h.attach_with("Essay", Harness::short_phases());
        page.adjust_duration(SessionMode::Work, secs(5)).unwrap();
        page.start(SessionMode::Work, None, None).unwrap();

        h.clock.advance(secs(7));
        tokio::time::sleep(Duration::from_secs(2)).await;
        page.recompute();

        assert_eq!(h.notifier.count(), 1);
        assert_eq!(page.current_elapsed(), secs(7));
        let view = page.view();
        assert!(view.reading.unwrap().is_overtime());
        assert_eq!(view.status, MachineStatus::Running(SessionMode::Work));
        assert!(h.repository.load().unwrap().unwrap().completion_signaled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restarting_recompute_does_not_duplicate() {
        let h = Harness::new();
        let page = h.attach_with("Essay", Harness::short_phases());
        page.adjust_duration(SessionMode::Work, secs(5)).unwrap();
        page.start(SessionMode::Work, None, None).unwrap();

        for _ in 0..5 {
            page.start_recompute();
        }
        h.clock.advance(secs(6));
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(h.notifier.count(), 1);
        assert!(page.is_recomputing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_does_not_refire_completion() {
        let h = Harness::new();
        {
            let page = h.attach_with("Essay", Harness::short_phases());
            page.adjust_duration(SessionMode::Work, secs(5)).unwrap();
            page.start(SessionMode::Work, None, None).unwrap();
            h.clock.advance(secs(6));
            page.recompute();
            assert_eq!(h.notifier.count(), 1);
        }

        let reloaded = h.attach_with("Essay", Harness::short_phases());
        assert_eq!(reloaded.reconcile_outcome(), &ReconcileOutcome::Adopted);
        h.clock.advance(secs(6));
        tokio::time::sleep(Duration::from_secs(1)).await;
        reloaded.recompute();
        assert_eq!(h.notifier.count(), 1);
        assert_eq!(reloaded.current_elapsed(), secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_work_phase_delivers_one_record() {
        let h = Harness::new();
        let page = h.attach("Essay");
        page.start(SessionMode::Work, Some("desk".to_string()), None)
            .unwrap();
        h.clock.advance(secs(300));

        let id = page
            .end_phase(PhaseOutcome::Advance, Some("focused".to_string()))
            .unwrap()
            .unwrap();
        page.flush_deliveries().await;

        let posts = h.collector.posts.lock().unwrap().clone();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].record_id, id);
        assert_eq!(posts[0].session_type, SessionMode::Work);
        assert_eq!(posts[0].duration_seconds, 300);
        assert_eq!(posts[0].location.as_deref(), Some("desk"));

        let stored = h.repository.load().unwrap().unwrap();
        assert_eq!(stored.mode, SessionMode::Break);
        assert_eq!(stored.elapsed_before_current_run, Duration::ZERO);
        assert_eq!(page.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_transition_does_not_wait_for_collector() {
        let h = Harness::with_collector(MockCollector::slow(secs(30)));
        let page = h.attach("Essay");
        page.start(SessionMode::Work, None, None).unwrap();
        h.clock.advance(secs(60));

        page.end_phase(PhaseOutcome::Advance, None).unwrap();
        assert_eq!(page.status(), MachineStatus::Paused(SessionMode::Break));
        assert_eq!(page.in_flight(), 1);

        page.start(SessionMode::Break, None, None).unwrap();
        assert_eq!(page.status(), MachineStatus::Running(SessionMode::Break));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_delivery_reported() {
        let h = Harness::with_collector(MockCollector::failing(100));
        let page = h.attach("Essay");
        let mut failures = page.take_failures().unwrap();
        assert!(page.take_failures().is_none());

        page.start(SessionMode::Work, None, None).unwrap();
        h.clock.advance(secs(60));
        let id = page.end_phase(PhaseOutcome::Terminate, None).unwrap().unwrap();

        let failure = failures.recv().await.unwrap();
        assert_eq!(failure.record.record_id, id);
        assert!(failure.error.is_delivery_failed());
        assert_eq!(h.collector.post_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skipping_break_clears_slot_and_hides_indicator() {
        let h = Harness::new();
        let page = h.attach("Essay");
        page.start(SessionMode::Work, None, None).unwrap();
        h.clock.advance(secs(60));
        page.end_phase(PhaseOutcome::Advance, None).unwrap();
        assert!(h.repository.load().unwrap().unwrap().is_pending());

        let skipped = page.end_phase(PhaseOutcome::Advance, None).unwrap();
        assert_eq!(skipped, None);
        assert_eq!(page.status(), MachineStatus::Idle);
        assert!(!page.is_recomputing());
        assert_eq!(h.store.get(SNAPSHOT_KEY).unwrap(), None);

        let indicator =
            IndicatorView::mount(h.repository.clone(), h.clock.clone(), secs(1)).unwrap();
        assert!(!indicator.is_visible());
        assert_eq!(indicator.frame(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ending_started_break_logs_it_and_clears_slot() {
        let h = Harness::new();
        let page = h.attach("Essay");
        page.start(SessionMode::Work, None, None).unwrap();
        h.clock.advance(secs(60));
        page.end_phase(PhaseOutcome::Advance, None).unwrap();
        page.start(SessionMode::Break, None, None).unwrap();
        h.clock.advance(secs(120));

        page.end_phase(PhaseOutcome::Advance, None).unwrap().unwrap();
        page.flush_deliveries().await;

        let posts = h.collector.posts.lock().unwrap().clone();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[1].session_type, SessionMode::Break);
        assert_eq!(posts[1].duration_seconds, 120);
        assert_eq!(h.store.get(SNAPSHOT_KEY).unwrap(), None);
        assert_eq!(page.view().durations.work_duration, secs(25 * 60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unload_resends_in_flight_records() {
        let h = Harness::with_collector(MockCollector::slow(secs(30)));
        let page = h.attach("Essay");
        page.start(SessionMode::Work, None, None).unwrap();
        h.clock.advance(secs(60));
        let id = page.end_phase(PhaseOutcome::Advance, None).unwrap().unwrap();

        let report = page.unload();
        assert_eq!(report.resent, 1);
        assert_eq!(report.finalized, None);
        let beacons = h.collector.beacons.lock().unwrap().clone();
        assert_eq!(beacons.len(), 1);
        assert_eq!(beacons[0].record_id, id);
        assert!(!page.is_recomputing());

        // Keep policy: the pending break stays in the slot.
        assert!(h.repository.load().unwrap().unwrap().is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unload_finalize_policy() {
        let h = Harness::new();
        let options = TimerPageOptions {
            unload_policy: UnloadPolicy::Finalize,
            ..TimerPageOptions::default()
        };
        let page = h.attach_with("Essay", options);
        page.start(SessionMode::Work, None, None).unwrap();
        h.clock.advance(secs(90));

        let report = page.unload();
        assert!(report.finalized.is_some());
        let beacons = h.collector.beacons.lock().unwrap().clone();
        assert_eq!(beacons.len(), 1);
        assert_eq!(beacons[0].duration_seconds, 90);
        assert_eq!(h.collector.post_count(), 0);
        assert_eq!(h.store.get(SNAPSHOT_KEY).unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_rejected_when_active_elsewhere() {
        let h = Harness::new();
        let essay = h.attach("Essay");
        let review = h.attach("Review");

        essay.start(SessionMode::Work, None, None).unwrap();
        let err = review.start(SessionMode::Work, None, None).unwrap_err();
        assert_eq!(
            err,
            FocusError::ActiveElsewhere {
                task_name: "Essay".to_string()
            }
        );
        assert_eq!(review.status(), MachineStatus::Idle);
        assert_eq!(h.repository.load().unwrap().unwrap().task_name, "Essay");
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_to_other_task_discards_stale_session() {
        let h = Harness::new();
        let essay = h.attach("Essay");
        essay.start(SessionMode::Work, None, None).unwrap();
        drop(essay);

        let review = h.attach("Review");
        assert_eq!(
            review.reconcile_outcome(),
            &ReconcileOutcome::DiscardedStale {
                previous_task: "Essay".to_string()
            }
        );
        assert_eq!(h.collector.post_count(), 0);
        review.start(SessionMode::Work, None, None).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistence_failure_degrades_but_keeps_running() {
        let h = Harness::new();
        let page = h.attach("Essay");
        h.store.set_available(false);

        page.start(SessionMode::Work, None, None).unwrap();
        assert!(page.is_degraded());
        assert!(page.view().degraded);
        h.clock.advance(secs(10));
        page.pause().unwrap();
        assert_eq!(page.current_elapsed(), secs(10));

        h.store.set_available(true);
        page.resume().unwrap();
        assert!(!page.is_degraded());
        assert!(h.repository.load().unwrap().unwrap().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_updates_are_published() {
        let h = Harness::new();
        let page = h.attach("Essay");
        let mut rx = page.subscribe();
        page.start(SessionMode::Work, None, None).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow().status,
            MachineStatus::Running(SessionMode::Work)
        );
        assert_eq!(rx.borrow().reading.unwrap().display(), "25:00");
    }
}
