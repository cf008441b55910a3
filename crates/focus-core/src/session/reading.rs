use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::model::{RunState, SessionMode};

/// What a page shows for the current phase at one instant.
///
/// Whole seconds only: the clock face never shows fractions, and using
/// floored elapsed seconds keeps the timer page and the indicator in step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerReading {
    pub mode: SessionMode,
    pub run_state: RunState,
    pub elapsed_seconds: u64,
    pub duration_seconds: u64,
    /// Negative once the phase runs past its target.
    pub remaining_seconds: i64,
}

impl TimerReading {
    pub fn new(mode: SessionMode, run_state: RunState, elapsed: Duration, duration: Duration) -> Self {
        let elapsed_seconds = elapsed.as_secs();
        let duration_seconds = duration.as_secs();
        let remaining_seconds = duration_seconds as i64 - elapsed_seconds as i64;
        Self {
            mode,
            run_state,
            elapsed_seconds,
            duration_seconds,
            remaining_seconds,
        }
    }

    pub fn is_overtime(&self) -> bool {
        self.remaining_seconds < 0
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    /// Fraction of the target reached, pinned to 1.0 in overtime.
    pub fn progress(&self) -> f64 {
        if self.is_overtime() || self.duration_seconds == 0 {
            return 1.0;
        }
        (self.elapsed_seconds as f64 / self.duration_seconds as f64).min(1.0)
    }

    /// `MM:SS` while counting down, `+MM:SS` in overtime.
    pub fn display(&self) -> String {
        format_clock(self.remaining_seconds)
    }
}

impl fmt::Display for TimerReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Formats signed remaining seconds as a clock face.
pub fn format_clock(remaining_seconds: i64) -> String {
    let sign = if remaining_seconds < 0 { "+" } else { "" };
    let abs = remaining_seconds.unsigned_abs();
    format!("{}{:02}:{:02}", sign, abs / 60, abs % 60)
}
