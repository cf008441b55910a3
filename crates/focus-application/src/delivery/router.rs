use std::sync::Arc;

use focus_core::delivery::{DeliveryContext, LogCollector};
use focus_core::error::Result;
use focus_core::session::FinalizedSessionRecord;

use super::{ForegroundDelivery, LogDelivery, RetryPolicy, UnloadDelivery};

/// Picks the delivery strategy for a context.
#[derive(Clone)]
pub struct DeliveryRouter {
    foreground: Arc<ForegroundDelivery>,
    unload: Arc<UnloadDelivery>,
}

impl DeliveryRouter {
    pub fn new(collector: Arc<dyn LogCollector>, policy: RetryPolicy) -> Self {
        Self {
            foreground: Arc::new(ForegroundDelivery::new(collector.clone(), policy)),
            unload: Arc::new(UnloadDelivery::new(collector)),
        }
    }

    pub fn for_context(&self, context: DeliveryContext) -> Arc<dyn LogDelivery> {
        match context {
            DeliveryContext::Foreground => self.foreground.clone() as Arc<dyn LogDelivery>,
            DeliveryContext::Unload => self.unload.clone() as Arc<dyn LogDelivery>,
        }
    }

    pub fn unload(&self) -> &Arc<UnloadDelivery> {
        &self.unload
    }

    pub async fn deliver(
        &self,
        context: DeliveryContext,
        record: FinalizedSessionRecord,
    ) -> Result<()> {
        self.for_context(context).deliver(record).await
    }
}
