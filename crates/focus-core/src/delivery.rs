//! Remote collector port.

use async_trait::async_trait;

use crate::error::Result;
use crate::session::FinalizedSessionRecord;

/// Where a delivery is requested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryContext {
    /// The page stays open; retries are possible.
    Foreground,
    /// The page is going away; one fire-and-forget attempt.
    Unload,
}

/// The remote service that stores finalized session records.
#[async_trait]
pub trait LogCollector: Send + Sync {
    /// One awaited attempt. Succeeds only on an explicit success response.
    async fn post(&self, record: &FinalizedSessionRecord) -> Result<()>;

    /// One attempt that returns immediately; the outcome is never observed.
    fn beacon(&self, record: FinalizedSessionRecord);
}
