//! Event loops for the two presentation modes
//!
//! Both loops own the engine, redraw from its snapshot and route refreshes
//! through [`RefreshDriver`], which runs the repository walk on tokio's
//! blocking pool and gives up after a timeout.

use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use super::render::{self, BrowseView};
use super::TerminalGuard;
use crate::error::AppError;
use crate::git::GitError;
use crate::timeline::{TimelineEngine, Walk};

/// Lines moved by PgUp/PgDn in the code pane
const PAGE_LINES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Watch,
    Browse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Refresh,
    Next,
    Previous,
    Oldest,
    Newest,
    NextFile,
    PageUp,
    PageDown,
}

/// Map a key press to an action; navigation keys only exist in browse mode
pub fn key_action(key: KeyEvent, mode: Mode) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }

    let common = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('r') => Some(Action::Refresh),
        _ => None,
    };
    if common.is_some() || mode == Mode::Watch {
        return common;
    }

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => Some(Action::Next),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::Previous),
        KeyCode::Char('g') | KeyCode::Home => Some(Action::Oldest),
        KeyCode::Char('G') | KeyCode::End => Some(Action::Newest),
        KeyCode::Tab => Some(Action::NextFile),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::PageDown => Some(Action::PageDown),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReport {
    /// Walk finished and the engine is `Ready`
    Completed,
    /// Walk finished with a repository error; the engine is in `Error`
    Failed,
    /// Walk did not finish in time; state unchanged
    TimedOut,
}

/// Runs refreshes off the input thread, bounded by a timeout
///
/// At most one walk is in flight. A walk that overruns its timeout is kept
/// and waited on again by the next cycle instead of starting another one.
pub struct RefreshDriver {
    runtime: Option<Runtime>,
    timeout: Duration,
    in_flight: Option<JoinHandle<Result<Walk, GitError>>>,
}

impl RefreshDriver {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let runtime = Builder::new_current_thread()
            .enable_time()
            .thread_name("evolve-refresh")
            .build()?;
        Ok(Self {
            runtime: Some(runtime),
            timeout,
            in_flight: None,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a walk from an earlier cycle is still running
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn refresh(&mut self, engine: &mut TimelineEngine) -> RefreshReport {
        let Some(runtime) = self.runtime.as_ref() else {
            return RefreshReport::TimedOut;
        };

        let started = Instant::now();
        let mut handle = match self.in_flight.take() {
            Some(handle) => {
                debug!("previous refresh still running, waiting on it");
                handle
            }
            None => {
                let job = engine.begin_refresh();
                runtime.spawn_blocking(move || job.run())
            }
        };
        let timeout = self.timeout;
        let outcome = runtime.block_on(async { time::timeout(timeout, &mut handle).await });

        let report = match outcome {
            Ok(Ok(result)) => {
                if engine.finish_refresh(result).is_ready() {
                    RefreshReport::Completed
                } else {
                    RefreshReport::Failed
                }
            }
            Ok(Err(join_err)) => {
                warn!(error = %join_err, "refresh task failed");
                engine.abandon_refresh();
                RefreshReport::Failed
            }
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "refresh timed out, keeping current state");
                self.in_flight = Some(handle);
                RefreshReport::TimedOut
            }
        };
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            report = ?report,
            "refresh cycle"
        );
        report
    }
}

impl Drop for RefreshDriver {
    fn drop(&mut self) {
        // A walk stuck on a slow filesystem must not hold up exit
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Unattended comparison of the oldest and newest generation
///
/// Refreshes every `interval`; a missing repository is shown and retried,
/// never fatal.
pub fn run_watch(
    mut engine: TimelineEngine,
    driver: &mut RefreshDriver,
    interval: Duration,
    target: &str,
) -> Result<(), AppError> {
    info!(root = %engine.root().display(), interval_ms = interval.as_millis() as u64, "watch started");
    let mut terminal = TerminalGuard::enter()?;

    driver.refresh(&mut engine);
    engine.prepare_comparison();
    let mut next_tick = Instant::now() + interval;

    loop {
        terminal.draw(|out, area| render::draw_watch(out, engine.snapshot(), area, target))?;

        let wait = next_tick.saturating_duration_since(Instant::now());
        let refresh_now = if event::poll(wait)? {
            match event::read()? {
                Event::Key(key) => match key_action(key, Mode::Watch) {
                    Some(Action::Quit) => break,
                    Some(Action::Refresh) => true,
                    _ => false,
                },
                Event::Resize(..) => {
                    terminal.clear()?;
                    false
                }
                _ => false,
            }
        } else {
            true
        };

        if refresh_now {
            driver.refresh(&mut engine);
            engine.prepare_comparison();
            next_tick = Instant::now() + interval;
        }
    }

    info!("watch stopped");
    Ok(())
}

/// Interactive stepping through every generation; refresh is on demand
pub fn run_browse(mut engine: TimelineEngine, driver: &mut RefreshDriver, target: &str) -> Result<(), AppError> {
    info!(root = %engine.root().display(), "browse started");
    let mut terminal = TerminalGuard::enter()?;
    let mut view = BrowseView::default();

    driver.refresh(&mut engine);
    engine.prepare_selected();

    loop {
        terminal.draw(|out, area| render::draw_browse(out, engine.snapshot(), area, target, view))?;

        let action = match event::read()? {
            Event::Key(key) => key_action(key, Mode::Browse),
            Event::Resize(..) => {
                terminal.clear()?;
                None
            }
            _ => None,
        };
        let Some(action) = action else {
            continue;
        };

        match action {
            Action::Quit => break,
            Action::PageUp => view.scroll = view.scroll.saturating_sub(PAGE_LINES),
            Action::PageDown => view.scroll = scroll_down(&engine, view.scroll),
            other => {
                apply(&mut engine, driver, other);
                view = BrowseView::default();
            }
        }
        engine.prepare_selected();
    }

    info!("browse stopped");
    Ok(())
}

fn apply(engine: &mut TimelineEngine, driver: &mut RefreshDriver, action: Action) {
    match action {
        Action::Refresh => {
            driver.refresh(engine);
        }
        Action::Next => {
            engine.select_next();
        }
        Action::Previous => {
            engine.select_previous();
        }
        Action::Oldest => {
            engine.select_oldest();
        }
        Action::Newest => {
            engine.select_newest();
        }
        Action::NextFile => {
            let path = engine.cycle_tracked_file();
            info!(path, "tracked file changed");
        }
        Action::Quit | Action::PageUp | Action::PageDown => {}
    }
}

/// Scroll one page down, stopping at the last line of the selected content
fn scroll_down(engine: &TimelineEngine, scroll: usize) -> usize {
    let snapshot = engine.snapshot();
    let lines = snapshot
        .selected_index
        .and_then(|i| snapshot.content(i))
        .and_then(|c| c.text())
        .map_or(0, |text| text.lines().count());
    (scroll + PAGE_LINES).min(lines.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{genesis_to_growth, ITERATIVE_LIB};
    use std::fs;
    use std::process::Command;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_quit_and_refresh_in_both_modes() {
        for mode in [Mode::Watch, Mode::Browse] {
            assert_eq!(key_action(press(KeyCode::Char('q')), mode), Some(Action::Quit));
            assert_eq!(key_action(press(KeyCode::Esc), mode), Some(Action::Quit));
            assert_eq!(key_action(press(KeyCode::Char('r')), mode), Some(Action::Refresh));
            assert_eq!(
                key_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), mode),
                Some(Action::Quit)
            );
        }
    }

    #[test]
    fn test_navigation_only_in_browse() {
        assert_eq!(key_action(press(KeyCode::Char('j')), Mode::Watch), None);
        assert_eq!(key_action(press(KeyCode::Tab), Mode::Watch), None);

        assert_eq!(key_action(press(KeyCode::Char('j')), Mode::Browse), Some(Action::Next));
        assert_eq!(key_action(press(KeyCode::Up), Mode::Browse), Some(Action::Previous));
        assert_eq!(key_action(press(KeyCode::Char('g')), Mode::Browse), Some(Action::Oldest));
        assert_eq!(key_action(press(KeyCode::Char('G')), Mode::Browse), Some(Action::Newest));
        assert_eq!(key_action(press(KeyCode::Tab), Mode::Browse), Some(Action::NextFile));
        assert_eq!(key_action(press(KeyCode::PageDown), Mode::Browse), Some(Action::PageDown));
    }

    #[test]
    fn test_key_release_ignored() {
        let mut key = press(KeyCode::Char('q'));
        key.kind = KeyEventKind::Release;
        assert_eq!(key_action(key, Mode::Watch), None);
    }

    #[test]
    fn test_driver_refresh_completes() {
        let (fixture, ids) = genesis_to_growth();
        let mut driver = RefreshDriver::new(Duration::from_secs(10)).unwrap();
        let mut engine = TimelineEngine::new(fixture.path());

        assert_eq!(driver.refresh(&mut engine), RefreshReport::Completed);
        assert_eq!(engine.snapshot().len(), 3);
        assert!(!driver.is_busy());

        fixture.commit("Fourth", &[("src/lib.rs", ITERATIVE_LIB)]);
        assert_eq!(driver.refresh(&mut engine), RefreshReport::Completed);
        assert_eq!(engine.snapshot().len(), 4);

        // Selection stays on the commit that was selected before the append
        assert_eq!(engine.snapshot().selected_index, Some(2));
        let selected = engine.snapshot().selected().unwrap();
        assert_eq!(selected.commit_id, ids[2]);
    }

    #[cfg(unix)]
    #[test]
    fn test_driver_timeout_keeps_one_walk_in_flight() {
        let (fixture, ids) = genesis_to_growth();
        let mut driver = RefreshDriver::new(Duration::from_millis(50)).unwrap();
        let mut engine = TimelineEngine::new(fixture.path());
        assert_eq!(driver.refresh(&mut engine), RefreshReport::Completed);

        // Re-opening the repository reads .git/config; a fifo nobody writes
        // to stalls that read indefinitely.
        let config = fixture.path().join(".git").join("config");
        fs::remove_file(&config).unwrap();
        let status = Command::new("mkfifo").arg(&config).status().unwrap();
        assert!(status.success());

        assert_eq!(driver.refresh(&mut engine), RefreshReport::TimedOut);
        assert!(driver.is_busy());

        // A new walk would reload the config and switch the tracked file
        fs::write(
            fixture.path().join("Evolve.toml"),
            "[evolution]\nprimary_file = \"README.md\"\n",
        )
        .unwrap();
        for _ in 0..5 {
            assert_eq!(driver.refresh(&mut engine), RefreshReport::TimedOut);
            assert!(driver.is_busy());
        }
        assert_eq!(engine.tracked_file(), "src/lib.rs");

        assert!(engine.status().is_ready());
        assert_eq!(engine.snapshot().len(), 3);
        let selected = engine.snapshot().selected().unwrap();
        assert_eq!(selected.commit_id, ids[2]);
    }

    #[test]
    fn test_driver_refresh_failure_keeps_loop_alive() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = RefreshDriver::new(Duration::from_secs(10)).unwrap();
        let mut engine = TimelineEngine::new(dir.path().join("not-yet"));

        assert_eq!(driver.refresh(&mut engine), RefreshReport::Failed);
        assert!(engine.status().fault().is_some());
    }

    #[test]
    fn test_apply_navigation() {
        let (fixture, _) = genesis_to_growth();
        let mut driver = RefreshDriver::new(Duration::from_secs(10)).unwrap();
        let mut engine = TimelineEngine::new(fixture.path());
        driver.refresh(&mut engine);

        apply(&mut engine, &mut driver, Action::Oldest);
        assert_eq!(engine.snapshot().selected_index, Some(0));
        apply(&mut engine, &mut driver, Action::Previous);
        assert_eq!(engine.snapshot().selected_index, Some(0));
        apply(&mut engine, &mut driver, Action::Next);
        assert_eq!(engine.snapshot().selected_index, Some(1));
        apply(&mut engine, &mut driver, Action::Newest);
        assert_eq!(engine.snapshot().selected_index, Some(2));
    }

    #[test]
    fn test_scroll_down_stops_at_last_line() {
        let (fixture, _) = genesis_to_growth();
        let mut engine = TimelineEngine::new(fixture.path());
        engine.open();
        engine.prepare_selected();

        let lines = ITERATIVE_LIB.lines().count();
        assert_eq!(scroll_down(&engine, 0), lines - 1);
    }
}
