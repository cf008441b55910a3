//! Data Transfer Objects (DTOs) for persistence.
//!
//! These DTOs are the versioned on-disk schema. They are private to the
//! infrastructure layer; the domain only sees `SessionSnapshot`.
//!
//! ### SessionSnapshot Version History
//! - **1.0.0**: `isActive` / `startTime` (epoch ms) / `totalDuration` (s), unversioned on disk
//! - **1.1.0**: `isWorkSessionActive` / `workSessionStartTime` (RFC 3339), unversioned on disk
//! - **2.0.0**: work/break phases, pause support, millisecond durations

pub mod session_snapshot;

pub use session_snapshot::{
    SessionSnapshotDTO, SessionSnapshotV1_0_0, SessionSnapshotV1_1_0, SessionSnapshotV2_0_0,
    create_session_snapshot_migrator, legacy_version_of,
};
