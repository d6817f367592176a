//! Terminal presentation
//!
//! The renderer only reads the engine's snapshot; all state changes go
//! through [`TimelineEngine`](crate::timeline::TimelineEngine) in [`app`].

pub mod app;
pub mod render;

use std::io::{self, Stdout, Write};

use crossterm::{
    cursor::{Hide, Show},
    execute, queue,
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate,
        EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use tracing::warn;

pub use app::{run_browse, run_watch, Action, Mode, RefreshDriver, RefreshReport};
pub use render::{BrowseView, Rect};

/// Raw-mode alternate screen, restored on drop
pub struct TerminalGuard {
    out: Stdout,
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        if let Err(err) = execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All)) {
            let _ = terminal::disable_raw_mode();
            return Err(err);
        }
        Ok(Self { out })
    }

    /// Render one frame covering the whole terminal
    pub fn draw<F>(&mut self, render: F) -> io::Result<()>
    where
        F: FnOnce(&mut Vec<u8>, Rect) -> io::Result<()>,
    {
        let (width, height) = terminal::size()?;
        let mut frame = Vec::new();
        queue!(frame, BeginSynchronizedUpdate)?;
        render(&mut frame, Rect::new(0, 0, width, height))?;
        queue!(frame, EndSynchronizedUpdate)?;
        self.out.write_all(&frame)?;
        self.out.flush()
    }

    /// Wipe the screen, after a resize leaves stale cells behind
    pub fn clear(&mut self) -> io::Result<()> {
        execute!(self.out, Clear(ClearType::All))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(err) = execute!(self.out, Show, LeaveAlternateScreen) {
            warn!(error = %err, "failed to leave alternate screen");
        }
        if let Err(err) = terminal::disable_raw_mode() {
            warn!(error = %err, "failed to disable raw mode");
        }
    }
}
