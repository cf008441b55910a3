//! Application services for the Focus timer: the timer page, the read-only
//! indicator, attach-time reconciliation, periodic recompute and log delivery.

pub mod delivery;
pub mod indicator;
pub mod reconciler;
pub mod recompute;
pub mod timer_page;

#[cfg(test)]
mod testing;

pub use crate::delivery::{
    DeliveryFailure, DeliveryRouter, ForegroundDelivery, LogDelivery, RetryPolicy, UnloadDelivery,
};
pub use crate::indicator::{IndicatorFrame, IndicatorView, timer_link};
pub use crate::reconciler::{ReconcileOutcome, Reconciled, Reconciler};
pub use crate::recompute::RecomputeTask;
pub use crate::timer_page::{TimerPage, TimerPageDeps, TimerPageOptions, TimerView, UnloadReport};
