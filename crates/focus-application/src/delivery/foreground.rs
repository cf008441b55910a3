use std::sync::Arc;

use async_trait::async_trait;

use focus_core::delivery::{DeliveryContext, LogCollector};
use focus_core::error::{FocusError, Result};
use focus_core::session::FinalizedSessionRecord;

use super::{LogDelivery, RetryPolicy};

/// Retrying delivery for a page that stays open.
///
/// Makes up to `max_attempts` posts with exponential backoff between them and
/// returns [`FocusError::DeliveryFailed`] when all of them fail, so the caller
/// can tell the user instead of dropping the record.
pub struct ForegroundDelivery {
    collector: Arc<dyn LogCollector>,
    policy: RetryPolicy,
}

impl ForegroundDelivery {
    pub fn new(collector: Arc<dyn LogCollector>, policy: RetryPolicy) -> Self {
        Self { collector, policy }
    }
}

#[async_trait]
impl LogDelivery for ForegroundDelivery {
    async fn deliver(&self, record: FinalizedSessionRecord) -> Result<()> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.collector.post(&record).await {
                Ok(()) => {
                    tracing::info!(
                        "[ForegroundDelivery] Delivered {} on attempt {}",
                        record.summary(),
                        attempt
                    );
                    return Ok(());
                }
                Err(e) if attempt >= max_attempts => {
                    tracing::error!(
                        "[ForegroundDelivery] Giving up on {} after {} attempt(s): {}",
                        record.summary(),
                        attempt,
                        e
                    );
                    let message = match e {
                        FocusError::DeliveryFailed { message, .. } => message,
                        other => other.to_string(),
                    };
                    return Err(FocusError::delivery_failed(attempt, message));
                }
                Err(e) => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::warn!(
                        "[ForegroundDelivery] Attempt {}/{} for {} failed: {} (retrying in {:?})",
                        attempt,
                        max_attempts,
                        record.summary(),
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn context(&self) -> DeliveryContext {
        DeliveryContext::Foreground
    }
}
