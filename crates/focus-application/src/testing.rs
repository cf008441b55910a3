//! Hand-written port mocks shared by the application tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use focus_core::delivery::LogCollector;
use focus_core::error::{FocusError, Result};
use focus_core::session::{FinalizedSessionRecord, Notifier, SessionMode};

/// Collector that records calls and fails the first `failures` posts.
#[derive(Default)]
pub struct MockCollector {
    pub posts: Mutex<Vec<FinalizedSessionRecord>>,
    pub beacons: Mutex<Vec<FinalizedSessionRecord>>,
    failures: AtomicU32,
    /// Posts wait for this long (tokio time) before answering.
    pub latency: Mutex<std::time::Duration>,
}

impl MockCollector {
    pub fn failing(failures: u32) -> Self {
        let collector = Self::default();
        collector.failures.store(failures, Ordering::SeqCst);
        collector
    }

    pub fn slow(latency: std::time::Duration) -> Self {
        let collector = Self::default();
        *collector.latency.lock().unwrap() = latency;
        collector
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    pub fn beacon_count(&self) -> usize {
        self.beacons.lock().unwrap().len()
    }
}

#[async_trait]
impl LogCollector for MockCollector {
    async fn post(&self, record: &FinalizedSessionRecord) -> Result<()> {
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.posts.lock().unwrap().push(record.clone());
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(FocusError::delivery_failed(1, "connection refused"));
        }
        Ok(())
    }

    fn beacon(&self, record: FinalizedSessionRecord) {
        self.beacons.lock().unwrap().push(record);
    }
}

#[derive(Default)]
pub struct MockNotifier {
    pub calls: Mutex<Vec<(SessionMode, String)>>,
}

impl MockNotifier {
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Notifier for MockNotifier {
    fn phase_complete(&self, mode: SessionMode, task_name: &str) {
        self.calls.lock().unwrap().push((mode, task_name.to_string()));
    }
}

pub fn record_at(end: DateTime<Utc>) -> FinalizedSessionRecord {
    FinalizedSessionRecord {
        record_id: Uuid::new_v4(),
        user_id: "user1".to_string(),
        task_name: "Essay".to_string(),
        session_type: SessionMode::Work,
        start_time: end - chrono::TimeDelta::seconds(60),
        end_time: end,
        duration_seconds: 60,
        feeling_at_start: None,
        feeling_at_end: None,
        location: None,
    }
}
