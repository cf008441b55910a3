//! Work/break session domain: the persisted snapshot, the state machine that
//! mutates it, and the record produced when a phase ends.

mod completion;
mod machine;
mod model;
mod reading;
mod record;
mod repository;

pub use completion::{CompletionDetector, Notifier};
pub use machine::{MachineStatus, PhaseOutcome, SessionMachine};
pub use model::{
    PhaseDurations, PhaseRules, RunState, SessionMetadata, SessionMode, SessionSnapshot,
};
pub use reading::{TimerReading, format_clock};
pub use record::FinalizedSessionRecord;
pub use repository::SnapshotRepository;
