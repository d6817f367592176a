use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use evolve_dashboard::cli::{self, Cli, Command};
use evolve_dashboard::error::{AppError, ErrorResponse};
use evolve_dashboard::timeline::TimelineEngine;
use evolve_dashboard::ui::{self, RefreshDriver};

const LOG_FILENAME: &str = "evolve-dashboard.log";

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref());

    let command = cli.command();
    let result = match &command {
        Command::Watch { target, interval_ms } => {
            watch(target, Duration::from_millis(*interval_ms), cli.refresh_timeout())
        }
        Command::Browse { target } => browse(target, cli.refresh_timeout()),
        Command::Dump { target, pretty } => dump(target, *pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "exiting with error");
            if matches!(command, Command::Dump { .. }) {
                match serde_json::to_string(&ErrorResponse::from(&err)) {
                    Ok(json) => println!("{}", json),
                    Err(_) => eprintln!("error: {}", err),
                }
            } else {
                eprintln!("error: {}", err);
            }
            ExitCode::FAILURE
        }
    }
}

/// File logging; the terminal belongs to the UI while it runs
fn init_tracing(log_file: Option<&Path>) -> Option<WorkerGuard> {
    let path = log_file.map(Path::to_path_buf).unwrap_or_else(|| {
        dirs::cache_dir()
            .map(|dir| dir.join("evolve-dashboard"))
            .unwrap_or_else(std::env::temp_dir)
            .join(LOG_FILENAME)
    });
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
    let file_name = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(LOG_FILENAME));

    if std::fs::create_dir_all(&dir).is_err() {
        return None;
    }
    let file_appender = tracing_appender::rolling::never(&dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let installed = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "evolve_dashboard=info,warn".into()))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()
        .is_ok();

    if installed {
        info!(log = %path.display(), version = env!("CARGO_PKG_VERSION"), "evolve-dashboard starting");
        Some(guard)
    } else {
        None
    }
}

fn watch(target: &Path, interval: Duration, refresh_timeout: Duration) -> Result<(), AppError> {
    // The repository may not exist yet; watch keeps retrying
    let root = cli::absolute_target(target);
    let mut driver = RefreshDriver::new(refresh_timeout)?;
    let label = target.display().to_string();
    ui::run_watch(TimelineEngine::new(root), &mut driver, interval, &label)
}

fn browse(target: &Path, refresh_timeout: Duration) -> Result<(), AppError> {
    let root = cli::resolve_target(target)?;
    let mut driver = RefreshDriver::new(refresh_timeout)?;
    let label = target.display().to_string();
    ui::run_browse(TimelineEngine::new(root), &mut driver, &label)
}

fn dump(target: &Path, pretty: bool) -> Result<(), AppError> {
    let root = cli::resolve_target(target)?;
    let json = cli::dump(&root, pretty)?;
    println!("{}", json);
    Ok(())
}
