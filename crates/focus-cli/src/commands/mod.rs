pub mod duration;
pub mod live;
pub mod session;
pub mod status;

use std::time::Duration;

use focus_application::{IndicatorFrame, TimerView};
use focus_core::session::MachineStatus;

/// One-line rendering of a timer page.
pub fn render_view(view: &TimerView) -> String {
    let mut line = match (&view.status, &view.reading) {
        (MachineStatus::Idle, _) | (_, None) => format!(
            "{}: idle (work {}m, break {}m)",
            view.task_name,
            view.durations.work_duration.as_secs() / 60,
            view.durations.break_duration.as_secs() / 60
        ),
        (_, Some(reading)) if view.pending => format!(
            "{}: {} ready ({})",
            view.task_name,
            reading.mode.label(),
            reading.display()
        ),
        (status, Some(reading)) => format!(
            "{}: {} {} [{}]",
            view.task_name,
            reading.mode.label(),
            reading.display(),
            status
        ),
    };
    if view.degraded {
        line.push_str(" (not saved)");
    }
    line
}

pub fn render_frame(frame: &IndicatorFrame) -> String {
    let state = if frame.running { "" } else { " (paused)" };
    format!(
        "{} {} {}{} -> {}",
        frame.label, frame.display, frame.task_name, state, frame.return_link
    )
}

pub fn minutes(value: u64) -> Duration {
    Duration::from_secs(value * 60)
}
