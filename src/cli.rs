//! Command line surface
//!
//! `watch` needs no arguments and runs against a fixed default target;
//! `browse` and `dump` require `--target`. Running the binary without a
//! subcommand is the same as `watch`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::TrackedFile;
use crate::error::AppError;
use crate::git::discover_repo_root;
use crate::timeline::{EngineStatus, TimelineEngine, TimelineSnapshot};

/// Target used by `watch` when none is given, relative to the working directory
pub const DEFAULT_WATCH_TARGET: &str = "../gravity-eater";

/// Environment variable overriding [`DEFAULT_WATCH_TARGET`]
pub const TARGET_ENV: &str = "EVOLVE_TARGET";

#[derive(Parser, Debug)]
#[command(name = "evolve-dashboard", version)]
#[command(about = "Live terminal view of a project's generations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Give up on a refresh that takes longer than this many milliseconds
    #[arg(long, global = true, default_value_t = 2000)]
    pub refresh_timeout_ms: u64,

    /// Write logs here instead of the user cache directory
    #[arg(long, global = true, env = "EVOLVE_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Unattended ancestor-vs-survivor comparison, refreshed on a timer
    Watch {
        /// Repository root to watch
        #[arg(long, env = TARGET_ENV, default_value = DEFAULT_WATCH_TARGET)]
        target: PathBuf,

        /// Refresh period in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
    /// Step through every generation interactively
    Browse {
        /// Repository root to browse
        #[arg(long)]
        target: PathBuf,
    },
    /// Print the current snapshot as JSON and exit
    Dump {
        /// Repository root to read
        #[arg(long)]
        target: PathBuf,

        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

impl Command {
    /// `watch` with its defaults, for a bare invocation
    pub fn default_watch() -> Self {
        let target = std::env::var_os(TARGET_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WATCH_TARGET));
        Self::Watch {
            target,
            interval_ms: 500,
        }
    }
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or_else(Command::default_watch)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms.max(1))
    }
}

/// Absolute, symlink-free form of a target that must exist at startup
pub fn resolve_target(target: &Path) -> Result<PathBuf, AppError> {
    let resolved = target
        .canonicalize()
        .map_err(|_| AppError::TargetNotFound(target.display().to_string()))?;

    if !resolved.join(".git").exists() {
        if let Some(root) = discover_repo_root(&resolved) {
            warn!(
                target = %resolved.display(),
                repo_root = %root.display(),
                "target is inside a repository but is not its root"
            );
        }
    }
    Ok(resolved)
}

/// Absolute form of a target that may not exist yet
pub fn absolute_target(target: &Path) -> PathBuf {
    target
        .canonicalize()
        .or_else(|_| std::env::current_dir().map(|cwd| cwd.join(target)))
        .unwrap_or_else(|_| target.to_path_buf())
}

#[derive(Debug, Serialize)]
struct DumpOutput<'a> {
    root: &'a Path,
    tracked_files: Vec<TrackedFile>,
    snapshot: &'a TimelineSnapshot,
}

/// Open `target`, resolve the oldest, newest and selected generations and
/// render the snapshot as JSON
pub fn dump(target: &Path, pretty: bool) -> Result<String, AppError> {
    let mut engine = TimelineEngine::new(target);
    if let EngineStatus::Error(fault) = engine.open() {
        return Err(AppError::Repository(fault.clone()));
    }
    engine.prepare_comparison();
    engine.prepare_selected();
    info!(
        root = %target.display(),
        generations = engine.snapshot().len(),
        "snapshot dumped"
    );

    let output = DumpOutput {
        root: engine.root(),
        tracked_files: engine.tracked_files(),
        snapshot: engine.snapshot(),
    };
    let json = if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::genesis_to_growth;

    #[test]
    fn test_browse_requires_target() {
        assert!(Cli::try_parse_from(["evolve-dashboard", "browse"]).is_err());

        let cli = Cli::try_parse_from(["evolve-dashboard", "browse", "--target", "/tmp/x"]).unwrap();
        assert_eq!(
            cli.command(),
            Command::Browse {
                target: PathBuf::from("/tmp/x")
            }
        );
    }

    #[test]
    fn test_watch_has_no_required_arguments() {
        let cli = Cli::try_parse_from(["evolve-dashboard", "watch", "--interval-ms", "250"]).unwrap();
        match cli.command() {
            Command::Watch { interval_ms, .. } => assert_eq!(interval_ms, 250),
            other => panic!("expected watch, got {:?}", other),
        }

        let bare = Cli::try_parse_from(["evolve-dashboard"]).unwrap();
        assert!(matches!(bare.command(), Command::Watch { interval_ms: 500, .. }));
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "evolve-dashboard",
            "dump",
            "--target",
            ".",
            "--refresh-timeout-ms",
            "0",
        ])
        .unwrap();
        assert_eq!(cli.refresh_timeout(), Duration::from_millis(1));
    }

    #[test]
    fn test_resolve_target_missing_path() {
        let result = resolve_target(Path::new("/nonexistent/evolve/target"));
        assert!(matches!(result, Err(AppError::TargetNotFound(_))));
    }

    #[test]
    fn test_absolute_target_keeps_missing_paths() {
        let path = absolute_target(Path::new("definitely-missing-dir"));
        assert!(path.is_absolute());
        assert!(path.ends_with("definitely-missing-dir"));
    }

    #[test]
    fn test_dump_snapshot() {
        let (fixture, ids) = genesis_to_growth();
        let json = dump(fixture.path(), false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let generations = value["snapshot"]["generations"].as_array().unwrap();
        assert_eq!(generations.len(), 3);
        assert_eq!(generations[2]["commit_id"], ids[2].as_str());
        assert_eq!(value["snapshot"]["selected_index"], 2);
        assert_eq!(value["tracked_files"][0]["path"], "src/lib.rs");
        assert_eq!(value["snapshot"]["content_by_index"]["2"]["style"], "iterative");
    }

    #[test]
    fn test_dump_not_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        let result = dump(dir.path(), true);
        assert!(matches!(result, Err(AppError::Repository(_))));
    }
}
