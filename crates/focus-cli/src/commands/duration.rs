use anyhow::{Result, bail};

use focus_core::session::SessionMode;

use super::{minutes, render_view};
use crate::app::App;

/// Parsed `duration` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationChange {
    /// Set to this many minutes.
    Set(u64),
    /// Move by this many minutes.
    Step(i64),
}

/// Parses `30`, `+5`, `-5`, or a bare `+`/`-` (one configured step).
pub fn parse_change(raw: &str, step_minutes: u64) -> Result<DurationChange> {
    let raw = raw.trim();
    let step = step_minutes as i64;
    let change = match raw {
        "+" => DurationChange::Step(step),
        "-" => DurationChange::Step(-step),
        _ if raw.starts_with('+') => DurationChange::Step(raw[1..].parse()?),
        _ if raw.starts_with('-') => DurationChange::Step(-raw[1..].parse::<i64>()?),
        _ => DurationChange::Set(raw.parse()?),
    };
    if change == DurationChange::Set(0) {
        bail!("Duration must be at least one minute");
    }
    Ok(change)
}

pub fn run(
    app: &App,
    user: Option<&str>,
    task: Option<&str>,
    mode: SessionMode,
    raw: &str,
) -> Result<()> {
    let change = parse_change(raw, app.config.timer.step_minutes)?;
    let page = app.attach(app.page_context(user, task))?;
    let applied = match change {
        DurationChange::Set(value) => page.adjust_duration(mode, minutes(value))?,
        DurationChange::Step(delta) => page.step_duration(mode, delta)?,
    };
    println!("{} length: {} min", mode, applied.as_secs() / 60);
    println!("{}", render_view(&page.view()));
    Ok(())
}
