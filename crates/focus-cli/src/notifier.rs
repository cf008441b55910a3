use std::io::Write;

use focus_core::session::{Notifier, SessionMode};

/// Rings the terminal bell and prints a line when a phase reaches its target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn phase_complete(&self, mode: SessionMode, task_name: &str) {
        let message = match mode {
            SessionMode::Work => format!("Work session for '{}' complete. Time for a break.", task_name),
            SessionMode::Break => format!("Break is over. Back to '{}'.", task_name),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "\x07{}", message);
    }
}
