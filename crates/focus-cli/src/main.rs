use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use focus_core::session::{PhaseOutcome, SessionMode};

mod app;
mod commands;
mod logging;
mod notifier;

use app::App;

#[derive(Parser)]
#[command(name = "focus")]
#[command(about = "Focus - work/break session timer", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.config/focus/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// User the session is recorded for
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Selects the timer page. Defaults to the active session's task.
#[derive(Args, Debug, Clone, Default)]
struct TaskArg {
    /// Task the timer page is opened for
    #[arg(long, short)]
    task: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct StartArgs {
    /// Task to work on
    pub task: Option<String>,

    /// Where the session takes place
    #[arg(long)]
    pub location: Option<String>,

    /// How you feel at the start
    #[arg(long)]
    pub feeling: Option<String>,

    /// Work phase length for this session
    #[arg(long)]
    pub work_minutes: Option<u64>,

    /// Break phase length for this session
    #[arg(long)]
    pub break_minutes: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a session, or the pending phase of the current one
    Start(StartArgs),
    /// Pause the running phase
    Pause(TaskArg),
    /// Resume the paused phase
    Resume(TaskArg),
    /// End the current phase; ending a break ends the session
    Next {
        #[command(flatten)]
        page: TaskArg,
        /// How you feel at the end of the phase
        #[arg(long)]
        feeling: Option<String>,
    },
    /// End the session
    Stop {
        #[command(flatten)]
        page: TaskArg,
        /// How you feel at the end of the phase
        #[arg(long)]
        feeling: Option<String>,
    },
    /// Skip the break and end the session
    SkipBreak(TaskArg),
    /// Set (`30`) or step (`+5`, `-5`, `+`, `-`) a phase length in minutes
    Duration {
        /// `work` or `break`
        mode: SessionMode,
        #[arg(allow_hyphen_values = true)]
        change: String,
        #[command(flatten)]
        page: TaskArg,
    },
    /// Show the timer
    Status(TaskArg),
    /// Show the compact indicator until Ctrl-C
    Watch,
    /// Keep a live timer page open until Ctrl-C
    Run(StartArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init();

    let app = App::load(cli.config)?;
    let user = cli.user.as_deref();

    match cli.command {
        Commands::Start(args) => commands::session::start(&app, user, args).await?,
        Commands::Pause(page) => commands::session::pause(&app, user, page.task.as_deref())?,
        Commands::Resume(page) => commands::session::resume(&app, user, page.task.as_deref())?,
        Commands::Next { page, feeling } => {
            commands::session::end(&app, user, page.task.as_deref(), PhaseOutcome::Advance, feeling)
                .await?
        }
        Commands::Stop { page, feeling } => {
            commands::session::end(&app, user, page.task.as_deref(), PhaseOutcome::Terminate, feeling)
                .await?
        }
        Commands::SkipBreak(page) => {
            commands::session::skip_break(&app, user, page.task.as_deref()).await?
        }
        Commands::Duration { mode, change, page } => {
            commands::duration::run(&app, user, page.task.as_deref(), mode, &change)?
        }
        Commands::Status(page) => commands::status::show(&app, user, page.task.as_deref())?,
        Commands::Watch => commands::live::watch(&app).await?,
        Commands::Run(args) => commands::live::run(&app, user, args).await?,
    }

    Ok(())
}
