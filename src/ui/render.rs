//! Frame rendering
//!
//! Pure functions from a [`TimelineSnapshot`] to terminal commands. Every
//! cell of the area is written on each draw, so the screen is never cleared
//! between frames.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
};

use crate::timeline::{ContentResult, EngineStatus, Pane, TimelineSnapshot};

/// Width of the generation list in browse mode, borders included
pub const LIST_WIDTH: u16 = 35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    /// Area inside a one-cell border
    pub fn inner(&self) -> Rect {
        Rect {
            x: self.x.saturating_add(1),
            y: self.y.saturating_add(1),
            width: self.width.saturating_sub(2),
            height: self.height.saturating_sub(2),
        }
    }

    /// Split off the bottom `rows` rows: (top, bottom)
    pub fn split_bottom(&self, rows: u16) -> (Rect, Rect) {
        let rows = rows.min(self.height);
        let top = Rect::new(self.x, self.y, self.width, self.height - rows);
        let bottom = Rect::new(self.x, self.y + top.height, self.width, rows);
        (top, bottom)
    }

    /// Split off the top `rows` rows: (top, bottom)
    pub fn split_top(&self, rows: u16) -> (Rect, Rect) {
        let rows = rows.min(self.height);
        let top = Rect::new(self.x, self.y, self.width, rows);
        let bottom = Rect::new(self.x, self.y + rows, self.width, self.height - rows);
        (top, bottom)
    }

    /// Split off the left `columns` columns: (left, right)
    pub fn split_left(&self, columns: u16) -> (Rect, Rect) {
        let columns = columns.min(self.width);
        let left = Rect::new(self.x, self.y, columns, self.height);
        let right = Rect::new(self.x + columns, self.y, self.width - columns, self.height);
        (left, right)
    }

    pub fn halves(&self) -> (Rect, Rect) {
        self.split_left(self.width / 2)
    }

    fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Truncate or pad `text` to exactly `width` characters
pub fn fit(text: &str, width: usize) -> String {
    let mut out: String = text
        .chars()
        .map(|c| if c == '\t' { ' ' } else { c })
        .filter(|c| !c.is_control())
        .take(width)
        .collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - len));
    out
}

fn put<W: Write>(out: &mut W, x: u16, y: u16, text: &str) -> io::Result<()> {
    queue!(out, MoveTo(x, y), Print(text))
}

fn fill<W: Write>(out: &mut W, area: Rect) -> io::Result<()> {
    let blank = " ".repeat(area.width as usize);
    for row in 0..area.height {
        put(out, area.x, area.y + row, &blank)?;
    }
    Ok(())
}

/// Box border with a title in the top edge
pub fn draw_frame<W: Write>(out: &mut W, area: Rect, title: &str, color: Color) -> io::Result<()> {
    if area.width < 2 || area.height < 2 {
        return fill(out, area);
    }
    let inner = area.width as usize - 2;
    let label = if title.is_empty() {
        String::new()
    } else {
        format!(" {} ", title)
    };
    let label: String = label.chars().take(inner).collect();
    let rest = inner - label.chars().count();

    queue!(out, SetForegroundColor(color))?;
    put(out, area.x, area.y, &format!("┌{}{}┐", label, "─".repeat(rest)))?;
    for row in 1..area.height - 1 {
        put(out, area.x, area.y + row, "│")?;
        put(out, area.x + area.width - 1, area.y + row, "│")?;
    }
    put(
        out,
        area.x,
        area.y + area.height - 1,
        &format!("└{}┘", "─".repeat(inner)),
    )?;
    queue!(out, ResetColor)
}

/// Write `lines` into `area`, one per row, padding the rest with blanks
fn draw_lines<W: Write>(out: &mut W, area: Rect, lines: &[String]) -> io::Result<()> {
    for row in 0..area.height {
        let text = lines.get(row as usize).map(String::as_str).unwrap_or("");
        put(out, area.x, area.y + row, &fit(text, area.width as usize))?;
    }
    Ok(())
}

/// Source text with a right-aligned line-number gutter, starting at `scroll`
pub fn numbered(text: &str, scroll: usize) -> Vec<String> {
    let total = text.lines().count();
    let gutter = total.max(1).to_string().len();
    text.lines()
        .enumerate()
        .skip(scroll)
        .map(|(i, line)| format!("{:>width$} │ {}", i + 1, line, width = gutter))
        .collect()
}

fn pane_lines(pane: &Pane<'_>, path: &str, scroll: usize) -> Vec<String> {
    let index = pane.generation.index;
    match pane.content {
        Some(ContentResult::Present { text, .. }) if text.is_empty() => {
            vec![format!("// File '{}' is empty in Generation {}", path, index)]
        }
        Some(ContentResult::Present { text, .. }) => numbered(text, scroll),
        Some(ContentResult::Absent { reason }) => {
            vec![ContentResult::placeholder(*reason, path, index)]
        }
        None => vec!["(content unavailable)".to_string()],
    }
}

fn pane_title(pane: &Pane<'_>, path: &str) -> String {
    let generation = pane.generation;
    match pane.content {
        Some(ContentResult::Present { language, .. }) => {
            format!("{} (Gen {}) [{}]", path, generation.index, language)
        }
        _ => format!("{} (Gen {}) (Missing)", path, generation.index),
    }
}

fn draw_status_panel<W: Write>(out: &mut W, area: Rect, title: &str, lines: &[String], color: Color) -> io::Result<()> {
    draw_frame(out, area, title, color)?;
    queue!(out, SetForegroundColor(color))?;
    draw_lines(out, area.inner(), lines)?;
    queue!(out, ResetColor)
}

/// Placeholder for states with nothing to compare or browse
fn draw_state_panel<W: Write>(out: &mut W, snapshot: &TimelineSnapshot, area: Rect, target: &str) -> io::Result<bool> {
    match &snapshot.status {
        EngineStatus::Error(fault) => {
            let lines = vec![
                format!("Repository unavailable: {}", target),
                String::new(),
                fault.message.clone(),
                String::new(),
                "Retrying on next refresh".to_string(),
            ];
            draw_status_panel(out, area, "Error", &lines, Color::Red)?;
            Ok(true)
        }
        EngineStatus::Uninitialized => {
            let lines = vec![format!("Opening {}...", target)];
            draw_status_panel(out, area, "Loading", &lines, Color::DarkGrey)?;
            Ok(true)
        }
        EngineStatus::Ready if snapshot.is_empty() => {
            let lines = vec![
                format!("No generations in {} yet", target),
                "Waiting for the first commit".to_string(),
            ];
            draw_status_panel(out, area, "Empty", &lines, Color::DarkGrey)?;
            Ok(true)
        }
        EngineStatus::Ready => Ok(false),
    }
}

fn draw_header<W: Write>(out: &mut W, area: Rect, text: &str) -> io::Result<()> {
    if area.is_empty() {
        return Ok(());
    }
    queue!(
        out,
        SetForegroundColor(Color::Magenta),
        SetAttribute(Attribute::Bold)
    )?;
    put(out, area.x, area.y, &fit(text, area.width as usize))?;
    queue!(out, SetAttribute(Attribute::Reset), ResetColor)
}

fn draw_footer<W: Write>(out: &mut W, area: Rect, text: &str, warning: Option<&str>) -> io::Result<()> {
    if area.is_empty() {
        return Ok(());
    }
    queue!(out, SetAttribute(Attribute::Reverse))?;
    put(out, area.x, area.y, &fit(text, area.width as usize))?;
    queue!(out, SetAttribute(Attribute::Reset))?;
    for row in 1..area.height {
        let line = if row == 1 { warning.unwrap_or("") } else { "" };
        queue!(out, SetForegroundColor(Color::Yellow))?;
        put(out, area.x, area.y + row, &fit(line, area.width as usize))?;
        queue!(out, ResetColor)?;
    }
    Ok(())
}

fn footer_rows(snapshot: &TimelineSnapshot) -> u16 {
    if snapshot.config_warning.is_some() {
        2
    } else {
        1
    }
}

/// Watch mode: ancestor on the left, survivor on the right
pub fn draw_watch<W: Write>(out: &mut W, snapshot: &TimelineSnapshot, area: Rect, target: &str) -> io::Result<()> {
    let (header, rest) = area.split_top(1);
    let (body, footer) = rest.split_bottom(footer_rows(snapshot));
    draw_header(out, header, " Project Evolve: Live Genome Tracker")?;

    let latest = snapshot
        .newest()
        .map(|g| g.message.as_str())
        .unwrap_or("-");
    let state = match snapshot.status {
        EngineStatus::Ready => "System Active",
        EngineStatus::Uninitialized => "Starting",
        EngineStatus::Error(_) => "Repository Unavailable",
    };
    let footer_text = format!(
        " Generations: {} | Latest Msg: {} | {}",
        snapshot.len(),
        latest,
        state
    );

    if !draw_state_panel(out, snapshot, body, target)? {
        if let Some(comparison) = snapshot.comparison() {
            let path = snapshot.tracked_file.as_str();
            let (left, right) = body.halves();

            let ancestor = &comparison.ancestor;
            let title = format!(
                "Ancestor (SHA: {}) {}",
                ancestor.generation.short_id,
                pane_title(ancestor, path)
            );
            draw_frame(out, left, &title, Color::Red)?;
            draw_lines(out, left.inner(), &pane_lines(ancestor, path, 0))?;

            let survivor = &comparison.survivor;
            let color = match survivor.content {
                Some(content) if content.style().is_iterative() => Color::Green,
                _ => Color::Yellow,
            };
            let title = format!(
                "Survivor (SHA: {}) {}",
                survivor.generation.short_id,
                pane_title(survivor, path)
            );
            draw_frame(out, right, &title, color)?;
            draw_lines(out, right.inner(), &pane_lines(survivor, path, 0))?;
        }
    }

    draw_footer(out, footer, &footer_text, snapshot.config_warning.as_deref())?;
    out.flush()
}

/// Browse-mode view state that lives outside the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrowseView {
    /// First source line shown in the code pane
    pub scroll: usize,
}

/// First list row to show so that `selected` stays visible
fn list_offset(selected: usize, rows: usize) -> usize {
    if rows == 0 {
        0
    } else {
        (selected + 1).saturating_sub(rows)
    }
}

/// Browse mode: generation list on the left, selected content on the right
pub fn draw_browse<W: Write>(
    out: &mut W,
    snapshot: &TimelineSnapshot,
    area: Rect,
    target: &str,
    view: BrowseView,
) -> io::Result<()> {
    let (header, rest) = area.split_top(1);
    let (body, footer) = rest.split_bottom(footer_rows(snapshot));
    draw_header(out, header, &format!(" Evolve Lab: {}", target))?;
    let commit = snapshot
        .selected()
        .map(|g| format!("{} {}", g.short_id, g.committed_at().format("%Y-%m-%d %H:%M")))
        .unwrap_or_else(|| "-".to_string());
    let footer_text = format!(
        " {} | Gen {}/{} | {} | j/k move  g/G oldest/newest  Tab file  r refresh  q quit",
        snapshot.tracked_file,
        snapshot.selected_index.map_or(0, |i| i + 1),
        snapshot.len(),
        commit
    );

    if !draw_state_panel(out, snapshot, body, target)? {
        let (list, code) = body.split_left(LIST_WIDTH.min(body.width / 2));
        draw_generation_list(out, snapshot, list)?;

        match snapshot.selected_index.and_then(|i| snapshot.pane(i)) {
            Some(pane) => {
                let path = snapshot.tracked_file.as_str();
                let color = if pane.content.is_some_and(ContentResult::is_present) {
                    Color::Cyan
                } else {
                    Color::DarkGrey
                };
                draw_frame(out, code, &pane_title(&pane, path), color)?;
                draw_lines(out, code.inner(), &pane_lines(&pane, path, view.scroll))?;
            }
            None => {
                draw_frame(out, code, "", Color::DarkGrey)?;
                draw_lines(out, code.inner(), &[])?;
            }
        }
    }

    draw_footer(out, footer, &footer_text, snapshot.config_warning.as_deref())?;
    out.flush()
}

fn draw_generation_list<W: Write>(out: &mut W, snapshot: &TimelineSnapshot, area: Rect) -> io::Result<()> {
    draw_frame(out, area, "Generations", Color::Blue)?;
    let inner = area.inner();
    let rows = inner.height as usize;
    let selected = snapshot.selected_index.unwrap_or(0);
    let offset = list_offset(selected, rows);

    for row in 0..inner.height {
        let index = offset + row as usize;
        let y = inner.y + row;
        let Some(generation) = snapshot.generations.get(index) else {
            put(out, inner.x, y, &fit("", inner.width as usize))?;
            continue;
        };
        let marker = if generation.is_genesis() { '*' } else { ' ' };
        let line = fit(&format!("{}{}", marker, generation.label()), inner.width as usize);
        if Some(index) == snapshot.selected_index {
            queue!(out, SetAttribute(Attribute::Reverse))?;
            put(out, inner.x, y, &line)?;
            queue!(out, SetAttribute(Attribute::Reset))?;
        } else {
            put(out, inner.x, y, &line)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{genesis_to_growth, FixtureRepo};
    use crate::timeline::TimelineEngine;

    fn rendered(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_fit_pads_and_truncates() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 3), "abc");
        assert_eq!(fit("a\tb", 3), "a b");
        assert_eq!(fit("", 0), "");
    }

    #[test]
    fn test_rect_splits() {
        let area = Rect::new(0, 0, 80, 24);
        let (body, footer) = area.split_bottom(1);
        assert_eq!(body.height, 23);
        assert_eq!(footer, Rect::new(0, 23, 80, 1));

        let (left, right) = area.halves();
        assert_eq!(left.width + right.width, 80);
        assert_eq!(right.x, 40);

        let tiny = Rect::new(0, 0, 1, 1);
        assert_eq!(tiny.inner().width, 0);
        assert_eq!(tiny.split_bottom(3).1.height, 1);
    }

    #[test]
    fn test_numbered_gutter() {
        let lines = numbered("a\nb\nc\nd\ne\nf\ng\nh\ni\nj", 8);
        assert_eq!(lines, vec![" 9 │ i".to_string(), "10 │ j".to_string()]);
    }

    #[test]
    fn test_list_offset_keeps_selection_visible() {
        assert_eq!(list_offset(0, 10), 0);
        assert_eq!(list_offset(9, 10), 0);
        assert_eq!(list_offset(10, 10), 1);
        assert_eq!(list_offset(5, 0), 0);
    }

    #[test]
    fn test_watch_shows_both_ends() {
        let (fixture, ids) = genesis_to_growth();
        let mut engine = TimelineEngine::new(fixture.path());
        engine.open();
        engine.prepare_comparison();

        let mut out = Vec::new();
        draw_watch(&mut out, engine.snapshot(), Rect::new(0, 0, 140, 20), "fixture").unwrap();
        let screen = rendered(out);

        assert!(screen.contains("Live Genome Tracker"));
        assert!(screen.contains(&format!("Ancestor (SHA: {}) src/lib.rs (Gen 0) (Missing)", &ids[0][..7])));
        assert!(screen.contains(&format!("Survivor (SHA: {}) src/lib.rs (Gen 2) [rust]", &ids[2][..7])));
        assert!(screen.contains("Generations: 3"));
        assert!(screen.contains("System Active"));
    }

    #[test]
    fn test_watch_error_panel() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = TimelineEngine::new(dir.path().join("missing"));
        engine.open();

        let mut out = Vec::new();
        draw_watch(&mut out, engine.snapshot(), Rect::new(0, 0, 80, 12), "missing").unwrap();
        let screen = rendered(out);

        assert!(screen.contains("Repository unavailable: missing"));
        assert!(screen.contains("Repository Unavailable"));
    }

    #[test]
    fn test_browse_list_and_code_pane() {
        let (fixture, _) = genesis_to_growth();
        let mut engine = TimelineEngine::new(fixture.path());
        engine.open();
        engine.prepare_selected();

        let mut out = Vec::new();
        draw_browse(
            &mut out,
            engine.snapshot(),
            Rect::new(0, 0, 100, 20),
            "fixture",
            BrowseView::default(),
        )
        .unwrap();
        let screen = rendered(out);

        assert!(screen.contains("Evolve Lab: fixture"));
        assert!(screen.contains("*Gen 0: Genesis"));
        assert!(screen.contains("src/lib.rs (Gen 2) [rust]"));
        assert!(screen.contains("1 │"));
        assert!(screen.contains("Gen 3/3"));
        assert!(screen.contains("2020-01-01 03:00"));
    }

    #[test]
    fn test_browse_missing_file_placeholder() {
        let (fixture, _) = genesis_to_growth();
        let mut engine = TimelineEngine::new(fixture.path());
        engine.open();
        engine.select_oldest();
        engine.prepare_selected();

        let mut out = Vec::new();
        draw_browse(
            &mut out,
            engine.snapshot(),
            Rect::new(0, 0, 100, 20),
            "fixture",
            BrowseView::default(),
        )
        .unwrap();
        let screen = rendered(out);

        assert!(screen.contains("(Gen 0) (Missing)"));
        assert!(screen.contains("File 'src/lib.rs' not found in Generation 0"));
    }

    #[test]
    fn test_empty_repository_panel() {
        let fixture = FixtureRepo::new();
        let mut engine = TimelineEngine::new(fixture.path());
        engine.open();

        let mut out = Vec::new();
        draw_browse(
            &mut out,
            engine.snapshot(),
            Rect::new(0, 0, 80, 10),
            "fresh",
            BrowseView::default(),
        )
        .unwrap();
        assert!(rendered(out).contains("No generations in fresh yet"));
    }

    #[test]
    fn test_tiny_area_does_not_panic() {
        let (fixture, _) = genesis_to_growth();
        let mut engine = TimelineEngine::new(fixture.path());
        engine.open();
        engine.prepare_comparison();

        for (w, h) in [(0, 0), (1, 1), (3, 2), (10, 3)] {
            let mut out = Vec::new();
            draw_watch(&mut out, engine.snapshot(), Rect::new(0, 0, w, h), "t").unwrap();
            draw_browse(&mut out, engine.snapshot(), Rect::new(0, 0, w, h), "t", BrowseView::default()).unwrap();
        }
    }
}
