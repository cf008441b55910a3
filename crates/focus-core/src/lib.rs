//! Core domain of the Focus timer.
//!
//! Holds the work/break state machine and the ports it is wired through
//! (store, snapshot repository, collector, notifier, clock). Nothing here
//! performs I/O.

pub mod clock;
pub mod config;
pub mod delivery;
pub mod error;
pub mod page;
pub mod session;
pub mod store;

pub use error::{FocusError, Result};
