use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::machine::SessionMachine;
use super::model::SessionMode;

/// External "phase complete" capability (tone, bell, desktop notification).
pub trait Notifier: Send + Sync {
    fn phase_complete(&self, mode: SessionMode, task_name: &str);
}

/// Fires the [`Notifier`] once per phase when its target is reached.
///
/// The guard lives in the snapshot (`completion_signaled`), so a reload after
/// the notification does not fire it again as long as the caller persists the
/// machine when [`CompletionDetector::observe`] returns true.
#[derive(Clone)]
pub struct CompletionDetector {
    notifier: Arc<dyn Notifier>,
}

impl CompletionDetector {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Checks the machine at `now`; returns true if the notifier fired.
    pub fn observe(&self, machine: &mut SessionMachine, now: DateTime<Utc>) -> bool {
        if !machine.mark_completion_if_due(now) {
            return false;
        }
        if let Some(snapshot) = machine.snapshot() {
            self.notifier.phase_complete(snapshot.mode, &snapshot.task_name);
        }
        true
    }
}
