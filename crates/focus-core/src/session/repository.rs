use super::model::SessionSnapshot;
use crate::error::Result;

/// Persistence port for the single session slot.
///
/// Synchronous: every state-machine mutation is written before the operation
/// returns, so an unload never has state left to flush.
pub trait SnapshotRepository: Send + Sync {
    /// Loads the stored snapshot, migrating older schema versions.
    ///
    /// Returns `Ok(None)` for an empty slot. Undecodable content is reported
    /// as a serialization or migration error (see [`crate::FocusError::is_corrupt_data`]).
    fn load(&self) -> Result<Option<SessionSnapshot>>;

    /// Overwrites the slot.
    fn save(&self, snapshot: &SessionSnapshot) -> Result<()>;

    /// Empties the slot.
    fn clear(&self) -> Result<()>;
}
