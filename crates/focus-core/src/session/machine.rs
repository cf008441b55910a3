use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::model::{PhaseDurations, PhaseRules, RunState, SessionMetadata, SessionMode, SessionSnapshot};
use super::reading::TimerReading;
use super::record::FinalizedSessionRecord;
use crate::clock::elapsed_between;
use crate::error::{FocusError, Result};

/// Externally visible state of a [`SessionMachine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineStatus {
    Idle,
    Running(SessionMode),
    Paused(SessionMode),
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineStatus::Idle => write!(f, "idle"),
            MachineStatus::Running(mode) => write!(f, "running {}", mode),
            MachineStatus::Paused(mode) => write!(f, "paused {}", mode),
        }
    }
}

/// How a phase ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// Work moves on to a pending break that waits for an explicit start.
    /// Ending a break ends the session.
    Advance,
    /// Clear the session entirely.
    Terminate,
}

/// The work/break state machine.
///
/// Pure and timestamp-driven: every operation takes `now` explicitly and the
/// machine never schedules anything. Rejected operations return
/// [`FocusError::InvalidTransition`] and leave the state untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionMachine {
    snapshot: Option<SessionSnapshot>,
    /// Durations applied when the next session is created from `Idle`.
    pending: PhaseDurations,
    rules: PhaseRules,
}

impl SessionMachine {
    pub fn idle(rules: PhaseRules) -> Self {
        Self {
            snapshot: None,
            pending: rules.defaults,
            rules,
        }
    }

    /// Adopts a persisted snapshot as-is. Inactive snapshots yield `Idle`.
    pub fn from_snapshot(snapshot: SessionSnapshot, rules: PhaseRules) -> Self {
        if !snapshot.active {
            return Self::idle(rules);
        }
        Self {
            pending: snapshot.durations(),
            snapshot: Some(snapshot),
            rules,
        }
    }

    pub fn snapshot(&self) -> Option<&SessionSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn rules(&self) -> &PhaseRules {
        &self.rules
    }

    pub fn status(&self) -> MachineStatus {
        match &self.snapshot {
            None => MachineStatus::Idle,
            Some(s) if s.is_running() => MachineStatus::Running(s.mode),
            Some(s) => MachineStatus::Paused(s.mode),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.snapshot.is_none()
    }

    /// True when the current phase is waiting for its first start.
    pub fn is_pending(&self) -> bool {
        self.snapshot.as_ref().is_some_and(|s| s.is_pending())
    }

    /// Durations in effect: the session's own, or the pending ones when idle.
    pub fn durations(&self) -> PhaseDurations {
        self.snapshot
            .as_ref()
            .map(|s| s.durations())
            .unwrap_or(self.pending)
    }

    /// Starts a phase.
    ///
    /// Valid from `Idle` (creates the session) or from the pending phase of
    /// the same mode and task left behind by [`PhaseOutcome::Advance`].
    pub fn start(
        &mut self,
        mode: SessionMode,
        metadata: SessionMetadata,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let status = self.status();
        let Some(snapshot) = self.snapshot.as_mut() else {
            self.snapshot = Some(SessionSnapshot::started(mode, metadata, self.pending, now));
            return Ok(());
        };

        if !snapshot.is_pending() || snapshot.mode != mode {
            return Err(FocusError::invalid_transition(format!("start {}", mode), status));
        }
        if snapshot.task_name != metadata.task_name || snapshot.user_id != metadata.user_id {
            return Err(FocusError::StaleSnapshot {
                stored_task: snapshot.task_name.clone(),
                page_task: metadata.task_name,
            });
        }

        snapshot.run_state = RunState::Running;
        snapshot.phase_started_at = Some(now);
        snapshot.phase_first_started_at = Some(now);
        snapshot.feeling_at_start = metadata.feeling_at_start;
        if metadata.location.is_some() {
            snapshot.location = metadata.location;
        }
        Ok(())
    }

    /// Stops the clock, folding the running segment into the phase total.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<()> {
        let status = self.status();
        match self.snapshot.as_mut() {
            Some(snapshot) if snapshot.is_running() => {
                if let Some(started) = snapshot.phase_started_at.take() {
                    snapshot.elapsed_before_current_run += elapsed_between(started, now);
                }
                snapshot.run_state = RunState::Paused;
                Ok(())
            }
            _ => Err(FocusError::invalid_transition("pause", status)),
        }
    }

    /// Restarts the clock of a paused phase.
    ///
    /// A pending phase has never run and must be started with [`Self::start`].
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<()> {
        let status = self.status();
        match self.snapshot.as_mut() {
            Some(snapshot) if !snapshot.is_running() && snapshot.has_started() => {
                snapshot.run_state = RunState::Running;
                snapshot.phase_started_at = Some(now);
                Ok(())
            }
            _ => Err(FocusError::invalid_transition("resume", status)),
        }
    }

    pub fn current_elapsed(&self, now: DateTime<Utc>) -> Duration {
        self.snapshot
            .as_ref()
            .map(|s| s.current_elapsed(now))
            .unwrap_or(Duration::ZERO)
    }

    /// Clock-face reading of the current phase, `None` when idle.
    pub fn reading(&self, now: DateTime<Utc>) -> Option<TimerReading> {
        self.snapshot.as_ref().map(|s| {
            TimerReading::new(s.mode, s.run_state, s.current_elapsed(now), s.current_duration())
        })
    }

    /// Signed seconds left in the current phase; negative in overtime.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        self.reading(now).map(|r| r.remaining_seconds)
    }

    /// Ends the current phase.
    ///
    /// Returns the record for the phase, or `None` if it never ran (a pending
    /// break that is skipped, for instance).
    pub fn end_phase(
        &mut self,
        outcome: PhaseOutcome,
        feeling_at_end: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<FinalizedSessionRecord>> {
        let Some(current) = self.snapshot.take() else {
            return Err(FocusError::invalid_transition("end phase", MachineStatus::Idle));
        };

        let elapsed = current.current_elapsed(now);
        let record = current
            .phase_first_started_at
            .map(|start_time| FinalizedSessionRecord {
                record_id: Uuid::new_v4(),
                user_id: current.user_id.clone(),
                task_name: current.task_name.clone(),
                session_type: current.mode,
                start_time,
                end_time: now,
                duration_seconds: elapsed.as_secs(),
                feeling_at_start: current.feeling_at_start.clone(),
                feeling_at_end,
                location: current.location.clone(),
            });

        match (outcome, current.mode) {
            (PhaseOutcome::Advance, SessionMode::Work) => {
                self.snapshot = Some(SessionSnapshot {
                    active: true,
                    mode: SessionMode::Break,
                    run_state: RunState::Paused,
                    feeling_at_start: None,
                    phase_started_at: None,
                    phase_first_started_at: None,
                    elapsed_before_current_run: Duration::ZERO,
                    completion_signaled: false,
                    ..current
                });
            }
            (PhaseOutcome::Advance, SessionMode::Break) => {
                // The next work phase starts from the configured length.
                let mut durations = current.durations();
                durations.work_duration = self.rules.defaults.work_duration;
                self.pending = durations;
            }
            (PhaseOutcome::Terminate, _) => {
                self.pending = current.durations();
            }
        }

        Ok(record)
    }

    /// Sets the target length of `mode`, clamped to the configured bounds.
    ///
    /// Rejected while that phase is running or has any elapsed time, and for
    /// work during a break (the next work phase uses the default). Returns
    /// the duration actually stored.
    pub fn adjust_duration(&mut self, mode: SessionMode, requested: Duration) -> Result<Duration> {
        let status = self.status();
        let effective = self.rules.clamp(requested);
        match self.snapshot.as_mut() {
            Some(snapshot) => {
                let same_phase_started = snapshot.mode == mode
                    && (snapshot.is_running()
                        || snapshot.elapsed_before_current_run > Duration::ZERO);
                let work_during_break =
                    mode == SessionMode::Work && snapshot.mode == SessionMode::Break;
                let locked = same_phase_started || work_during_break;
                if locked {
                    return Err(FocusError::invalid_transition(
                        format!("adjust {} duration", mode),
                        status,
                    ));
                }
                let mut durations = snapshot.durations();
                durations.set(mode, effective);
                snapshot.work_duration = durations.work_duration;
                snapshot.break_duration = durations.break_duration;
            }
            None => self.pending.set(mode, effective),
        }
        Ok(effective)
    }

    /// Moves the duration of `mode` by whole minutes (the +/- buttons).
    pub fn step_duration(&mut self, mode: SessionMode, delta_minutes: i64) -> Result<Duration> {
        let current = self.durations().for_mode(mode).as_secs() as i64;
        let requested = current.saturating_add(delta_minutes.saturating_mul(60)).max(0);
        self.adjust_duration(mode, Duration::from_secs(requested as u64))
    }

    /// Sets `completion_signaled` the first time the phase reaches its target.
    ///
    /// Returns true exactly once per phase.
    pub fn mark_completion_if_due(&mut self, now: DateTime<Utc>) -> bool {
        match self.snapshot.as_mut() {
            Some(snapshot)
                if !snapshot.completion_signaled
                    && snapshot.has_started()
                    && snapshot.current_elapsed(now) >= snapshot.current_duration() =>
            {
                snapshot.completion_signaled = true;
                true
            }
            _ => false,
        }
    }
}
