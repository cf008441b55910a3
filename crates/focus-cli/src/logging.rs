//! Tracing setup: compact stderr output plus a daily log file.
//!
//! The filter comes from `FOCUS_LOG` (e.g. `FOCUS_LOG=focus_application=debug`)
//! and defaults to `warn`.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use focus_infrastructure::FocusPaths;

pub const ENV_LOG: &str = "FOCUS_LOG";

/// Installs the global subscriber. Keep the returned guard alive until exit
/// so buffered file output is flushed.
pub fn init() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    let (file_layer, guard) = match file_appender() {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    guard
}

fn file_appender() -> Option<RollingFileAppender> {
    let dir = FocusPaths::logs_dir().ok()?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("focus.log")
        .build(dir)
        .ok()
}
