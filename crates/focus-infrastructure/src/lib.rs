//! Infrastructure adapters for the Focus timer: versioned snapshot storage,
//! durable stores, the HTTP collector, paths and configuration loading.

pub mod config_service;
pub mod dto;
pub mod http_collector;
pub mod paths;
pub mod snapshot_repository;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::http_collector::HttpLogCollector;
pub use crate::paths::FocusPaths;
pub use crate::snapshot_repository::{SNAPSHOT_KEY, StoreSnapshotRepository};
pub use crate::storage::{FileStore, MemoryStore};
