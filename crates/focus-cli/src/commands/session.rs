use anyhow::{Result, bail};
use uuid::Uuid;

use focus_application::{TimerPage, TimerView};
use focus_core::session::{MachineStatus, PhaseOutcome, SessionMode};

use super::{minutes, render_view};
use crate::StartArgs;
use crate::app::App;

/// Mode `start` should begin: the pending phase if there is one, else work.
pub fn next_mode(view: &TimerView) -> SessionMode {
    match view.status {
        MachineStatus::Paused(mode) if view.pending => mode,
        _ => SessionMode::Work,
    }
}

/// Applies `--work-minutes` / `--break-minutes` and starts the next phase.
pub fn start_page(page: &TimerPage, args: StartArgs) -> Result<()> {
    if let Some(value) = args.work_minutes {
        page.adjust_duration(SessionMode::Work, minutes(value))?;
    }
    if let Some(value) = args.break_minutes {
        page.adjust_duration(SessionMode::Break, minutes(value))?;
    }
    let mode = next_mode(&page.view());
    page.start(mode, args.location, args.feeling)?;
    Ok(())
}

pub async fn start(app: &App, user: Option<&str>, args: StartArgs) -> Result<()> {
    let page = app.attach(app.page_context(user, args.task.as_deref()))?;
    start_page(&page, args)?;
    println!("{}", render_view(&page.view()));
    Ok(())
}

pub fn pause(app: &App, user: Option<&str>, task: Option<&str>) -> Result<()> {
    let page = app.attach(app.page_context(user, task))?;
    page.pause()?;
    println!("{}", render_view(&page.view()));
    Ok(())
}

pub fn resume(app: &App, user: Option<&str>, task: Option<&str>) -> Result<()> {
    let page = app.attach(app.page_context(user, task))?;
    page.resume()?;
    println!("{}", render_view(&page.view()));
    Ok(())
}

pub async fn end(
    app: &App,
    user: Option<&str>,
    task: Option<&str>,
    outcome: PhaseOutcome,
    feeling: Option<String>,
) -> Result<()> {
    let page = app.attach(app.page_context(user, task))?;
    let record = page.end_phase(outcome, feeling)?;
    println!("{}", render_view(&page.view()));
    settle(&page, record).await
}

pub async fn skip_break(app: &App, user: Option<&str>, task: Option<&str>) -> Result<()> {
    let page = app.attach(app.page_context(user, task))?;
    match page.status() {
        MachineStatus::Running(SessionMode::Break) | MachineStatus::Paused(SessionMode::Break) => {
            let record = page.end_phase(PhaseOutcome::Advance, None)?;
            println!("{}", render_view(&page.view()));
            settle(&page, record).await
        }
        other => bail!("No break to skip (timer is {})", other),
    }
}

/// Waits for the foreground delivery of `record` and reports its outcome.
async fn settle(page: &TimerPage, record: Option<Uuid>) -> Result<()> {
    let Some(id) = record else {
        println!("Nothing to log for this phase.");
        return Ok(());
    };

    let mut failures = page.take_failures();
    page.flush_deliveries().await;
    if let Some(failure) = failures.as_mut().and_then(|rx| rx.try_recv().ok()) {
        bail!("Session {} was not logged: {}", id, failure.error);
    }
    println!("Logged session {}", id);
    Ok(())
}
