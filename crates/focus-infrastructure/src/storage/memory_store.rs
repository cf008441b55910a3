//! In-process durable store.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use focus_core::error::{FocusError, Result};
use focus_core::store::DurableStore;

/// A bounded in-memory [`DurableStore`].
///
/// Capacity counts key and value bytes across all entries, the way browser
/// storage quotas do. The store can be switched off to model storage that is
/// disabled or full.
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    capacity_bytes: usize,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity_bytes,
            available: AtomicBool::new(true),
        }
    }

    /// Makes every subsequent call fail with `PersistenceUnavailable` (or
    /// succeed again).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(FocusError::persistence("store is disabled"))
        }
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|e| FocusError::internal(format!("store lock poisoned: {}", e)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(5 * 1024 * 1024)
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.check_available()?;
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.check_available()?;
        let mut entries = self.entries()?;
        let used: usize = entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum();
        let needed = used + key.len() + value.len();
        if needed > self.capacity_bytes {
            return Err(FocusError::persistence(format!(
                "quota exceeded: {} of {} bytes",
                needed, self.capacity_bytes
            )));
        }
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.check_available()?;
        self.entries()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let store = MemoryStore::default();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", b"value").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some(&b"value"[..]));
        store.delete("k").unwrap();
        store.delete("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_capacity_rejects_oversized_write() {
        let store = MemoryStore::new(16);
        store.set("k", b"0123456789").unwrap();
        let err = store.set("other", b"0123456789").unwrap_err();
        assert!(err.is_persistence_unavailable());
        // Replacing an entry only counts the new value.
        store.set("k", b"abcdefghij").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some(&b"abcdefghij"[..]));
        assert_eq!(store.get("other").unwrap(), None);
    }

    #[test]
    fn test_disabled_store() {
        let store = MemoryStore::default();
        store.set_available(false);
        assert!(store.get("k").unwrap_err().is_persistence_unavailable());
        assert!(store.set("k", b"v").unwrap_err().is_persistence_unavailable());
        store.set_available(true);
        store.set("k", b"v").unwrap();
    }
}
