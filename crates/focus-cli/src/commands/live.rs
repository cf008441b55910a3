//! Long-running pages: the live timer page and the indicator.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;

use focus_core::session::MachineStatus;

use super::session::start_page;
use super::{render_frame, render_view};
use crate::StartArgs;
use crate::app::App;

/// Time left for unload beacons to leave before the process exits.
const UNLOAD_GRACE: Duration = Duration::from_millis(500);

fn redraw(line: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = write!(stdout, "\r\x1b[2K{}", line);
    let _ = stdout.flush();
}

/// Opens a timer page and renders it until Ctrl-C, which runs the unload hook.
///
/// With a task (or any start option) the next phase is started first.
pub async fn run(app: &App, user: Option<&str>, args: StartArgs) -> Result<()> {
    let page = app.attach(app.page_context(user, args.task.as_deref()))?;
    let wants_start = args.task.is_some()
        || args.work_minutes.is_some()
        || args.break_minutes.is_some()
        || args.location.is_some()
        || args.feeling.is_some();
    if wants_start && (page.view().pending || page.status() == MachineStatus::Idle) {
        start_page(&page, args)?;
    }

    let mut views = page.subscribe();
    let mut failures = page.take_failures();
    redraw(&render_view(&page.view()));

    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let line = render_view(&views.borrow_and_update());
                redraw(&line);
            }
            Some(failure) = async {
                match failures.as_mut() {
                    Some(rx) => rx.recv().await,
                    None => std::future::pending().await,
                }
            } => {
                println!();
                eprintln!(
                    "Session {} was not logged: {}",
                    failure.record.record_id, failure.error
                );
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    println!();
    let report = page.unload();
    if report.resent > 0 || report.finalized.is_some() {
        tokio::time::sleep(UNLOAD_GRACE).await;
    }
    Ok(())
}

/// Renders the indicator until Ctrl-C.
pub async fn watch(app: &App) -> Result<()> {
    let indicator = app.mount_indicator()?;
    let Some(frame) = indicator.frame() else {
        println!("No active session.");
        return Ok(());
    };
    redraw(&render_frame(&frame));

    let mut frames = indicator.subscribe();
    loop {
        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = frames.borrow_and_update().clone();
                if let Some(frame) = frame {
                    redraw(&render_frame(&frame));
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    println!();
    indicator.unmount();
    Ok(())
}
