use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::SessionMode;

/// A completed (or terminated) phase, ready for the remote collector.
///
/// Built once by [`SessionMachine::end_phase`](super::SessionMachine::end_phase)
/// and never persisted. Field names are the collector's wire keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedSessionRecord {
    /// Stable across retries so the collector can drop duplicates.
    pub record_id: Uuid,
    pub user_id: String,
    pub task_name: String,
    pub session_type: SessionMode,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feeling_at_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feeling_at_end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl FinalizedSessionRecord {
    /// Short label used in log lines.
    pub fn summary(&self) -> String {
        format!(
            "{} '{}' ({}s, id {})",
            self.session_type, self.task_name, self.duration_seconds, self.record_id
        )
    }
}
