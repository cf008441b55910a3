//! Snapshot repository backed by a [`DurableStore`].
//!
//! Stores the single session slot as versioned JSON under one key and runs
//! every load through the snapshot migrator.

use std::sync::Arc;

use version_migrate::Migrator;

use focus_core::error::{FocusError, Result};
use focus_core::session::{SessionSnapshot, SnapshotRepository};
use focus_core::store::DurableStore;

use crate::dto::{create_session_snapshot_migrator, legacy_version_of};

/// Store key of the session slot.
pub const SNAPSHOT_KEY: &str = "focus.timer.snapshot";

const ENTITY: &str = "session_snapshot";

/// [`SnapshotRepository`] over any [`DurableStore`].
pub struct StoreSnapshotRepository {
    store: Arc<dyn DurableStore>,
    migrator: Migrator,
}

impl StoreSnapshotRepository {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self {
            store,
            migrator: create_session_snapshot_migrator(),
        }
    }
}

impl SnapshotRepository for StoreSnapshotRepository {
    fn load(&self) -> Result<Option<SessionSnapshot>> {
        let Some(bytes) = self.store.get(SNAPSHOT_KEY)? else {
            return Ok(None);
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let mut json_value: serde_json::Value = serde_json::from_slice(&bytes)?;

        // Older pages wrote the slot without a version field.
        if let Some(version) = legacy_version_of(&json_value) {
            tracing::debug!("[SnapshotRepository] Tagging legacy snapshot as {}", version);
            if let Some(object) = json_value.as_object_mut() {
                object.insert("version".to_string(), serde_json::Value::from(version));
            }
        }

        let snapshot: SessionSnapshot = self
            .migrator
            .load_flat_from(ENTITY, json_value)
            .map_err(|e| FocusError::Migration(format!("Failed to migrate snapshot: {}", e)))?;

        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let serialized = self
            .migrator
            .save_domain_flat(ENTITY, snapshot.clone())
            .map_err(|e| FocusError::Serialization {
                format: "JSON".to_string(),
                message: format!("Failed to serialize snapshot: {}", e),
            })?;

        self.store.set(SNAPSHOT_KEY, serialized.as_bytes())
    }

    fn clear(&self) -> Result<()> {
        self.store.delete(SNAPSHOT_KEY)
    }
}
