//! Durable key-value store port.

use crate::error::Result;

/// Synchronous, capacity-bounded byte store shared by every page.
///
/// Writes that exceed the capacity fail with
/// [`FocusError::PersistenceUnavailable`](crate::FocusError::PersistenceUnavailable);
/// nothing is truncated.
pub trait DurableStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}
