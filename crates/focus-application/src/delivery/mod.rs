//! Log delivery strategies.
//!
//! Two strategies behind one [`LogDelivery`] interface, chosen explicitly by
//! the caller's [`DeliveryContext`]: a retrying foreground delivery for pages
//! that stay open and a fire-and-forget delivery for pages being unloaded.

mod foreground;
mod retry;
mod router;
mod unload;

use async_trait::async_trait;

use focus_core::delivery::DeliveryContext;
use focus_core::error::Result;
use focus_core::session::FinalizedSessionRecord;

pub use foreground::ForegroundDelivery;
pub use retry::RetryPolicy;
pub use router::DeliveryRouter;
pub use unload::UnloadDelivery;

#[async_trait]
pub trait LogDelivery: Send + Sync {
    /// Delivers one record according to the strategy's guarantees.
    async fn deliver(&self, record: FinalizedSessionRecord) -> Result<()>;

    fn context(&self) -> DeliveryContext;
}

/// A foreground delivery that ran out of attempts.
#[derive(Debug, Clone)]
pub struct DeliveryFailure {
    pub record: FinalizedSessionRecord,
    pub error: focus_core::FocusError,
}
