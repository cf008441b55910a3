use std::sync::Arc;

use async_trait::async_trait;

use focus_core::delivery::{DeliveryContext, LogCollector};
use focus_core::error::Result;
use focus_core::session::FinalizedSessionRecord;

use super::LogDelivery;

/// Fire-and-forget delivery for a page that is going away.
///
/// One beacon, no retry, no observable outcome; a lost record is accepted.
pub struct UnloadDelivery {
    collector: Arc<dyn LogCollector>,
}

impl UnloadDelivery {
    pub fn new(collector: Arc<dyn LogCollector>) -> Self {
        Self { collector }
    }

    /// Synchronous form used from unload hooks that cannot await.
    pub fn send(&self, record: FinalizedSessionRecord) {
        tracing::debug!("[UnloadDelivery] Beacon {}", record.summary());
        self.collector.beacon(record);
    }
}

#[async_trait]
impl LogDelivery for UnloadDelivery {
    async fn deliver(&self, record: FinalizedSessionRecord) -> Result<()> {
        self.send(record);
        Ok(())
    }

    fn context(&self) -> DeliveryContext {
        DeliveryContext::Unload
    }
}
