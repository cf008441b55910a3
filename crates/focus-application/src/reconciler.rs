//! Rebuilds the state machine from the durable store when a page attaches.

use std::sync::Arc;

use focus_core::page::PageContext;
use focus_core::session::{PhaseRules, SessionMachine, SessionSnapshot, SnapshotRepository};

/// What the reconciler did with the stored slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing usable was stored; the page starts idle.
    Fresh,
    /// The stored session belongs to this page and was taken over as-is.
    Adopted,
    /// A session for another task (or user) was stored and has been dropped
    /// without logging it.
    DiscardedStale { previous_task: String },
}

pub struct Reconciled {
    pub machine: SessionMachine,
    pub outcome: ReconcileOutcome,
    /// The store could not be read or cleaned up; the page runs in memory.
    pub degraded: bool,
}

/// True when `snapshot` is an active session that does not belong to `page`.
///
/// Snapshots written before user ids were stored (empty `user_id`) match any
/// user.
pub fn is_stale(snapshot: &SessionSnapshot, page: &PageContext) -> bool {
    if !snapshot.active {
        return false;
    }
    let other_task = snapshot.task_name != page.task_name;
    let other_user = !snapshot.user_id.is_empty() && snapshot.user_id != page.user_id;
    other_task || other_user
}

pub struct Reconciler {
    repository: Arc<dyn SnapshotRepository>,
    rules: PhaseRules,
}

impl Reconciler {
    pub fn new(repository: Arc<dyn SnapshotRepository>, rules: PhaseRules) -> Self {
        Self { repository, rules }
    }

    /// Reads the slot once and produces the page's state machine.
    ///
    /// An adopted snapshot needs no catch-up: its elapsed time is derived
    /// from timestamps, so time spent with no page open is already included.
    pub fn attach(&self, page: &PageContext) -> Reconciled {
        let snapshot = match self.repository.load() {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_corrupt_data() => {
                tracing::warn!("[Reconciler] Discarding unreadable snapshot: {}", e);
                let degraded = self.clear_slot();
                return self.fresh(ReconcileOutcome::Fresh, degraded);
            }
            Err(e) => {
                tracing::warn!(
                    "[Reconciler] Store unavailable, continuing in memory: {}",
                    e
                );
                return self.fresh(ReconcileOutcome::Fresh, true);
            }
        };

        match snapshot {
            Some(snapshot) if !snapshot.active => self.fresh(ReconcileOutcome::Fresh, false),
            Some(snapshot) if is_stale(&snapshot, page) => {
                tracing::info!(
                    "[Reconciler] Discarding stale session '{}' for page task '{}'",
                    snapshot.task_name,
                    page.task_name
                );
                let degraded = self.clear_slot();
                self.fresh(
                    ReconcileOutcome::DiscardedStale {
                        previous_task: snapshot.task_name,
                    },
                    degraded,
                )
            }
            Some(snapshot) => {
                tracing::debug!(
                    "[Reconciler] Adopting {} session for '{}'",
                    snapshot.mode,
                    snapshot.task_name
                );
                Reconciled {
                    machine: SessionMachine::from_snapshot(snapshot, self.rules),
                    outcome: ReconcileOutcome::Adopted,
                    degraded: false,
                }
            }
            None => self.fresh(ReconcileOutcome::Fresh, false),
        }
    }

    fn fresh(&self, outcome: ReconcileOutcome, degraded: bool) -> Reconciled {
        Reconciled {
            machine: SessionMachine::idle(self.rules),
            outcome,
            degraded,
        }
    }

    /// Empties the slot; returns true if that failed.
    fn clear_slot(&self) -> bool {
        match self.repository.clear() {
            Ok(()) => false,
            Err(e) => {
                tracing::warn!("[Reconciler] Failed to clear snapshot: {}", e);
                true
            }
        }
    }
}
