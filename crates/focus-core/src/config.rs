//! Application configuration model.
//!
//! Every field has a default so an empty (or missing) `config.toml` yields a
//! working setup: 25 minute work phases, 10 minute breaks, a local collector.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::session::{PhaseDurations, PhaseRules};

pub const DEFAULT_COLLECTOR_URL: &str = "http://127.0.0.1:5000/api/log_session";

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct FocusConfig {
    pub profile: ProfileConfig,
    pub timer: TimerConfig,
    pub collector: CollectorConfig,
    pub store: StoreConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProfileConfig {
    /// User identity attached to every session record.
    pub user_id: Option<String>,
}

/// What the timer page does with a running phase when it is unloaded.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnloadPolicy {
    /// Leave the phase in the store so the next page resumes it.
    #[default]
    Keep,
    /// End the phase and hand its record to the unload transport.
    Finalize,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TimerConfig {
    pub work_minutes: u64,
    pub break_minutes: u64,
    pub min_minutes: u64,
    pub max_minutes: u64,
    /// Increment used by the +/- duration buttons.
    pub step_minutes: u64,
    pub recompute_interval_ms: u64,
    pub indicator_interval_ms: u64,
    pub unload_policy: UnloadPolicy,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            break_minutes: 10,
            min_minutes: 1,
            max_minutes: 180,
            step_minutes: 5,
            recompute_interval_ms: 250,
            indicator_interval_ms: 1000,
            unload_policy: UnloadPolicy::Keep,
        }
    }
}

impl TimerConfig {
    pub fn default_durations(&self) -> PhaseDurations {
        PhaseDurations::new(
            Duration::from_secs(self.work_minutes * 60),
            Duration::from_secs(self.break_minutes * 60),
        )
    }

    /// Duration rules enforced by the state machine.
    ///
    /// A misconfigured range (min above max) collapses to the max, and the
    /// default lengths are clamped into the range.
    pub fn phase_rules(&self) -> PhaseRules {
        let max = Duration::from_secs(self.max_minutes.max(1) * 60);
        let min = Duration::from_secs(self.min_minutes * 60).min(max);
        let mut rules = PhaseRules {
            defaults: self.default_durations(),
            min,
            max,
        };
        rules.defaults = PhaseDurations::new(
            rules.clamp(rules.defaults.work_duration),
            rules.clamp(rules.defaults.break_duration),
        );
        rules
    }

    pub fn recompute_interval(&self) -> Duration {
        Duration::from_millis(self.recompute_interval_ms.max(10))
    }

    pub fn indicator_interval(&self) -> Duration {
        Duration::from_millis(self.indicator_interval_ms.max(10))
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CollectorConfig {
    pub endpoint: String,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub timeout_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_COLLECTOR_URL.to_string(),
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 4000,
            timeout_ms: 5000,
        }
    }
}

impl CollectorConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Override for the store directory (defaults to the platform data dir).
    pub dir: Option<PathBuf>,
    /// Largest value the store accepts, in bytes.
    pub capacity_bytes: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: None,
            capacity_bytes: 5 * 1024 * 1024,
        }
    }
}
