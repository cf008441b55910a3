//! Session domain model.
//!
//! Contains the persisted [`SessionSnapshot`] and the value types it is built
//! from. Elapsed time is always derived from timestamps through
//! [`SessionSnapshot::current_elapsed`].

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::elapsed_between;
use crate::error::FocusError;

/// The two phases of a focus cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Work,
    Break,
}

impl SessionMode {
    /// The phase that follows this one in a cycle.
    pub fn other(self) -> Self {
        match self {
            SessionMode::Work => SessionMode::Break,
            SessionMode::Break => SessionMode::Work,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Work => "work",
            SessionMode::Break => "break",
        }
    }

    /// Heading shown above the clock.
    pub fn label(&self) -> &'static str {
        match self {
            SessionMode::Work => "SESSION",
            SessionMode::Break => "BREAK",
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionMode {
    type Err = FocusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work" => Ok(SessionMode::Work),
            "break" => Ok(SessionMode::Break),
            other => Err(FocusError::config(format!("unknown session mode '{}'", other))),
        }
    }
}

/// Whether the clock of the current phase is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Running,
    Paused,
}

/// Configured target lengths of both phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    pub work_duration: Duration,
    pub break_duration: Duration,
}

impl PhaseDurations {
    pub fn new(work_duration: Duration, break_duration: Duration) -> Self {
        Self {
            work_duration,
            break_duration,
        }
    }

    pub fn for_mode(&self, mode: SessionMode) -> Duration {
        match mode {
            SessionMode::Work => self.work_duration,
            SessionMode::Break => self.break_duration,
        }
    }

    pub fn set(&mut self, mode: SessionMode, duration: Duration) {
        match mode {
            SessionMode::Work => self.work_duration = duration,
            SessionMode::Break => self.break_duration = duration,
        }
    }
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self::new(Duration::from_secs(25 * 60), Duration::from_secs(10 * 60))
    }
}

/// Bounds and defaults the state machine applies to phase durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseRules {
    /// Durations for a fresh session; the work duration is also restored
    /// when a break hands over to the next work phase.
    pub defaults: PhaseDurations,
    pub min: Duration,
    pub max: Duration,
}

impl PhaseRules {
    pub fn clamp(&self, duration: Duration) -> Duration {
        duration.clamp(self.min, self.max)
    }
}

impl Default for PhaseRules {
    fn default() -> Self {
        Self {
            defaults: PhaseDurations::default(),
            min: Duration::from_secs(60),
            max: Duration::from_secs(180 * 60),
        }
    }
}

/// Task metadata supplied by the page when a phase starts.
///
/// Only `user_id` and `task_name` carry meaning for the timer (identity
/// checks); the rest is passed through to the session record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub user_id: String,
    pub task_name: String,
    pub location: Option<String>,
    pub feeling_at_start: Option<String>,
}

impl SessionMetadata {
    pub fn new(user_id: impl Into<String>, task_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            task_name: task_name.into(),
            location: None,
            feeling_at_start: None,
        }
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    pub fn with_feeling(mut self, feeling: Option<String>) -> Self {
        self.feeling_at_start = feeling;
        self
    }
}

/// The resumable state of the current phase, as held in the durable store.
///
/// Invariants:
/// - `phase_started_at` is `Some` iff `run_state == Running`
/// - `elapsed_before_current_run` resets to zero on every mode change,
///   as does `completion_signaled`
/// - a phase that was never started is `Paused`, has zero elapsed time and no
///   `phase_first_started_at`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub active: bool,
    pub mode: SessionMode,
    pub run_state: RunState,
    pub user_id: String,
    pub task_name: String,
    pub location: Option<String>,
    pub feeling_at_start: Option<String>,
    /// Start of the run segment in progress.
    pub phase_started_at: Option<DateTime<Utc>>,
    /// First start of the current phase; becomes the record's start time.
    pub phase_first_started_at: Option<DateTime<Utc>>,
    pub elapsed_before_current_run: Duration,
    pub work_duration: Duration,
    pub break_duration: Duration,
    pub completion_signaled: bool,
}

impl SessionSnapshot {
    /// A snapshot whose first phase is running since `now`.
    pub fn started(
        mode: SessionMode,
        metadata: SessionMetadata,
        durations: PhaseDurations,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            active: true,
            mode,
            run_state: RunState::Running,
            user_id: metadata.user_id,
            task_name: metadata.task_name,
            location: metadata.location,
            feeling_at_start: metadata.feeling_at_start,
            phase_started_at: Some(now),
            phase_first_started_at: Some(now),
            elapsed_before_current_run: Duration::ZERO,
            work_duration: durations.work_duration,
            break_duration: durations.break_duration,
            completion_signaled: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    /// True once the current phase has run at least once.
    pub fn has_started(&self) -> bool {
        self.phase_first_started_at.is_some()
    }

    /// True for a phase that is waiting for its first start.
    pub fn is_pending(&self) -> bool {
        !self.is_running() && !self.has_started()
    }

    pub fn durations(&self) -> PhaseDurations {
        PhaseDurations::new(self.work_duration, self.break_duration)
    }

    /// Target length of the current phase.
    pub fn current_duration(&self) -> Duration {
        self.durations().for_mode(self.mode)
    }

    /// Elapsed running time of the current phase at `now`.
    ///
    /// The only elapsed-time formula in the crate: prior segments plus the
    /// segment in progress, recomputed from timestamps on every call.
    pub fn current_elapsed(&self, now: DateTime<Utc>) -> Duration {
        let running = match (self.run_state, self.phase_started_at) {
            (RunState::Running, Some(started)) => elapsed_between(started, now),
            _ => Duration::ZERO,
        };
        self.elapsed_before_current_run + running
    }

    pub fn metadata(&self) -> SessionMetadata {
        SessionMetadata {
            user_id: self.user_id.clone(),
            task_name: self.task_name.clone(),
            location: self.location.clone(),
            feeling_at_start: self.feeling_at_start.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn snapshot_at(now: DateTime<Utc>) -> SessionSnapshot {
        SessionSnapshot::started(
            SessionMode::Work,
            SessionMetadata::new("user1", "Write report"),
            PhaseDurations::default(),
            now,
        )
    }

    #[test]
    fn test_mode_cycle() {
        assert_eq!(SessionMode::Work.other(), SessionMode::Break);
        assert_eq!(SessionMode::Break.other(), SessionMode::Work);
        assert_eq!("Break".parse::<SessionMode>().unwrap(), SessionMode::Break);
        assert!("nap".parse::<SessionMode>().is_err());
    }

    #[test]
    fn test_current_elapsed_running_segment() {
        let start = Utc::now();
        let snapshot = snapshot_at(start);
        let later = start + TimeDelta::seconds(42);
        assert_eq!(snapshot.current_elapsed(later), Duration::from_secs(42));
    }

    #[test]
    fn test_current_elapsed_paused_ignores_clock() {
        let start = Utc::now();
        let mut snapshot = snapshot_at(start);
        snapshot.run_state = RunState::Paused;
        snapshot.phase_started_at = None;
        snapshot.elapsed_before_current_run = Duration::from_secs(30);
        let much_later = start + TimeDelta::hours(3);
        assert_eq!(snapshot.current_elapsed(much_later), Duration::from_secs(30));
    }

    #[test]
    fn test_rules_clamp() {
        let rules = PhaseRules::default();
        assert_eq!(rules.clamp(Duration::from_secs(5)), Duration::from_secs(60));
        assert_eq!(
            rules.clamp(Duration::from_secs(999 * 60)),
            Duration::from_secs(180 * 60)
        );
    }
}
