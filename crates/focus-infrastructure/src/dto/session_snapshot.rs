//! SessionSnapshot DTOs and migrations
//!
//! The snapshot slot has been written by three generations of the timer.
//! The two legacy shapes carried no `version` field; the repository tags them
//! before handing them to the migrator (see [`legacy_version_of`]).

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use version_migrate::{IntoDomain, Versioned};

use focus_core::session::{RunState, SessionMode, SessionSnapshot};

/// Break length given to snapshots migrated from the legacy shapes, which
/// only tracked a work phase.
pub const LEGACY_BREAK_DURATION_MS: u64 = 10 * 60 * 1000;

/// Session snapshot V1.0.0 (legacy, unversioned on disk).
///
/// Written by the first timer page: start time as epoch milliseconds, total
/// duration in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshotV1_0_0 {
    pub is_active: bool,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub task_name: String,
    pub start_time: i64,
    pub total_duration: u64,
}

/// Session snapshot V1.1.0 (legacy, unversioned on disk).
///
/// Start time became an RFC 3339 string.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.1.0")]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshotV1_1_0 {
    pub is_work_session_active: bool,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub task_name: String,
    pub work_session_start_time: DateTime<Utc>,
    pub total_duration_seconds: u64,
}

/// Session snapshot V2.0.0.
///
/// Full work/break state with pause support. Durations are milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "2.0.0")]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshotV2_0_0 {
    pub active: bool,
    pub mode: SessionMode,
    pub run_state: RunState,
    pub user_id: String,
    pub task_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feeling_at_start: Option<String>,
    #[serde(default)]
    pub phase_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub phase_first_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub elapsed_before_current_run_ms: u64,
    pub work_duration_ms: u64,
    pub break_duration_ms: u64,
    #[serde(default)]
    pub completion_signaled: bool,
}

/// Type alias for the latest SessionSnapshot version.
pub type SessionSnapshotDTO = SessionSnapshotV2_0_0;

/// Classifies an unversioned document by its marker key.
///
/// Returns `None` when the document already has a version or matches no
/// known legacy shape.
pub fn legacy_version_of(value: &serde_json::Value) -> Option<&'static str> {
    let object = value.as_object()?;
    if object.contains_key("version") {
        return None;
    }
    if object.contains_key("isActive") {
        Some("1.0.0")
    } else if object.contains_key("isWorkSessionActive") {
        Some("1.1.0")
    } else {
        None
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Migration implementations
// ============================================================================

/// Migration from V1.0.0 to V1.1.0.
/// Converts the epoch-millisecond start time to a timestamp.
impl version_migrate::MigratesTo<SessionSnapshotV1_1_0> for SessionSnapshotV1_0_0 {
    fn migrate(self) -> SessionSnapshotV1_1_0 {
        SessionSnapshotV1_1_0 {
            is_work_session_active: self.is_active,
            user_id: self.user_id,
            task_name: self.task_name,
            work_session_start_time: DateTime::from_timestamp_millis(self.start_time)
                .unwrap_or_default(),
            total_duration_seconds: self.total_duration,
        }
    }
}

/// Migration from V1.1.0 to V2.0.0.
/// A legacy session is a work phase running since its start time.
impl version_migrate::MigratesTo<SessionSnapshotV2_0_0> for SessionSnapshotV1_1_0 {
    fn migrate(self) -> SessionSnapshotV2_0_0 {
        let started = self.is_work_session_active.then_some(self.work_session_start_time);
        SessionSnapshotV2_0_0 {
            active: self.is_work_session_active,
            mode: SessionMode::Work,
            run_state: if started.is_some() {
                RunState::Running
            } else {
                RunState::Paused
            },
            user_id: self.user_id,
            task_name: self.task_name,
            location: None,
            feeling_at_start: None,
            phase_started_at: started,
            phase_first_started_at: started,
            elapsed_before_current_run_ms: 0,
            work_duration_ms: self.total_duration_seconds.saturating_mul(1000),
            break_duration_ms: LEGACY_BREAK_DURATION_MS,
            completion_signaled: false,
        }
    }
}

// ============================================================================
// Domain model conversions
// ============================================================================

/// Convert SessionSnapshotV2_0_0 DTO to domain model.
impl IntoDomain<SessionSnapshot> for SessionSnapshotV2_0_0 {
    fn into_domain(self) -> SessionSnapshot {
        // Restore the running/timestamp invariant if the document broke it.
        let (run_state, phase_started_at) = match (self.run_state, self.phase_started_at) {
            (RunState::Running, Some(started)) => (RunState::Running, Some(started)),
            _ => (RunState::Paused, None),
        };
        SessionSnapshot {
            active: self.active,
            mode: self.mode,
            run_state,
            user_id: self.user_id,
            task_name: self.task_name,
            location: self.location,
            feeling_at_start: self.feeling_at_start,
            phase_started_at,
            phase_first_started_at: self.phase_first_started_at.or(phase_started_at),
            elapsed_before_current_run: Duration::from_millis(self.elapsed_before_current_run_ms),
            work_duration: Duration::from_millis(self.work_duration_ms),
            break_duration: Duration::from_millis(self.break_duration_ms),
            completion_signaled: self.completion_signaled,
        }
    }
}

/// Convert domain model to SessionSnapshotV2_0_0 DTO for persistence.
impl version_migrate::FromDomain<SessionSnapshot> for SessionSnapshotV2_0_0 {
    fn from_domain(snapshot: SessionSnapshot) -> Self {
        SessionSnapshotV2_0_0 {
            active: snapshot.active,
            mode: snapshot.mode,
            run_state: snapshot.run_state,
            user_id: snapshot.user_id,
            task_name: snapshot.task_name,
            location: snapshot.location,
            feeling_at_start: snapshot.feeling_at_start,
            phase_started_at: snapshot.phase_started_at,
            phase_first_started_at: snapshot.phase_first_started_at,
            elapsed_before_current_run_ms: millis(snapshot.elapsed_before_current_run),
            work_duration_ms: millis(snapshot.work_duration),
            break_duration_ms: millis(snapshot.break_duration),
            completion_signaled: snapshot.completion_signaled,
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Creates and configures a Migrator instance for SessionSnapshot entities.
///
/// # Migration Path
///
/// - V1.0.0 → V1.1.0: epoch-millisecond start time becomes a timestamp
/// - V1.1.0 → V2.0.0: legacy session becomes a running work phase
/// - V2.0.0 → SessionSnapshot: converts DTO to domain model
pub fn create_session_snapshot_migrator() -> version_migrate::Migrator {
    let mut migrator = version_migrate::Migrator::builder().build();

    let snapshot_path = version_migrate::Migrator::define("session_snapshot")
        .from::<SessionSnapshotV1_0_0>()
        .step::<SessionSnapshotV1_1_0>()
        .step::<SessionSnapshotV2_0_0>()
        .into_with_save::<SessionSnapshot>();

    migrator
        .register(snapshot_path)
        .expect("Failed to register session_snapshot migration path");

    migrator
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use serde_json::json;

    #[test]
    fn test_legacy_classification() {
        assert_eq!(legacy_version_of(&json!({"isActive": true})), Some("1.0.0"));
        assert_eq!(
            legacy_version_of(&json!({"isWorkSessionActive": true})),
            Some("1.1.0")
        );
        assert_eq!(
            legacy_version_of(&json!({"version": "2.0.0", "isActive": true})),
            None
        );
        assert_eq!(legacy_version_of(&json!({"foo": 1})), None);
        assert_eq!(legacy_version_of(&json!([1, 2])), None);
    }

    #[test]
    fn test_v1_0_0_to_domain() {
        let migrator = create_session_snapshot_migrator();
        let value = json!({
            "version": "1.0.0",
            "isActive": true,
            "userId": "user1",
            "taskName": "Essay",
            "startTime": 1_714_554_000_000_i64,
            "totalDuration": 1500
        });

        let result: Result<SessionSnapshot, _> = migrator.load_flat_from("session_snapshot", value);
        assert!(result.is_ok(), "Migration failed: {:?}", result.err());
        let snapshot = result.unwrap();

        let started = DateTime::from_timestamp_millis(1_714_554_000_000).unwrap();
        assert!(snapshot.active);
        assert_eq!(snapshot.mode, SessionMode::Work);
        assert_eq!(snapshot.run_state, RunState::Running);
        assert_eq!(snapshot.phase_started_at, Some(started));
        assert_eq!(snapshot.phase_first_started_at, Some(started));
        assert_eq!(snapshot.work_duration, Duration::from_secs(1500));
        assert_eq!(snapshot.break_duration, Duration::from_secs(600));
        assert!(!snapshot.completion_signaled);
        assert_eq!(
            snapshot.current_elapsed(started + TimeDelta::seconds(90)),
            Duration::from_secs(90)
        );
    }

    #[test]
    fn test_v1_1_0_inactive_to_domain() {
        let migrator = create_session_snapshot_migrator();
        let value = json!({
            "version": "1.1.0",
            "isWorkSessionActive": false,
            "userId": "user1",
            "taskName": "Essay",
            "workSessionStartTime": "2024-05-01T09:00:00Z",
            "totalDurationSeconds": 1500
        });

        let snapshot: SessionSnapshot = migrator.load_flat_from("session_snapshot", value).unwrap();
        assert!(!snapshot.active);
        assert_eq!(snapshot.run_state, RunState::Paused);
        assert!(snapshot.phase_started_at.is_none());
    }

    #[test]
    fn test_v2_0_0_repairs_running_without_timestamp() {
        let migrator = create_session_snapshot_migrator();
        let value = json!({
            "version": "2.0.0",
            "active": true,
            "mode": "break",
            "runState": "running",
            "userId": "user1",
            "taskName": "Essay",
            "elapsedBeforeCurrentRunMs": 4000,
            "workDurationMs": 1_500_000,
            "breakDurationMs": 600_000
        });

        let snapshot: SessionSnapshot = migrator.load_flat_from("session_snapshot", value).unwrap();
        assert_eq!(snapshot.run_state, RunState::Paused);
        assert_eq!(snapshot.elapsed_before_current_run, Duration::from_secs(4));
        assert_eq!(snapshot.mode, SessionMode::Break);
    }

    #[test]
    fn test_save_writes_latest_version() {
        let migrator = create_session_snapshot_migrator();
        let mut snapshot = SessionSnapshot::started(
            SessionMode::Work,
            focus_core::session::SessionMetadata::new("user1", "Essay"),
            focus_core::session::PhaseDurations::default(),
            Utc::now(),
        );
        snapshot.elapsed_before_current_run = Duration::from_millis(1234);

        let json_str = migrator
            .save_domain_flat("session_snapshot", snapshot)
            .unwrap();
        assert!(json_str.contains("\"version\":\"2.0.0\""));
        assert!(json_str.contains("\"taskName\":\"Essay\""));
        assert!(json_str.contains("\"elapsedBeforeCurrentRunMs\":1234"));
        assert!(json_str.contains("\"workDurationMs\":1500000"));
    }
}
