//! Cell grid mirroring the visible terminal.
//!
//! The screen keeps two grids: `cells` is what the application has drawn,
//! `shown` is what the terminal is believed to display. `show` sends only the
//! cells that differ, `sync` sends everything. The screen is the single
//! writer of terminal output; every other component goes through it.

use std::io::Write;

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal,
};
use tracing::debug;

use super::cell::{Cell, Color, Style};
use super::error::{Result, TermError};
use super::text::char_width;

const ALT_SCREEN_ENTER: &[u8] = b"\x1b[?1049h";
const ALT_SCREEN_LEAVE: &[u8] = b"\x1b[?1049l";
const CURSOR_HOME: &[u8] = b"\x1b[H";
const CLEAR_SCREEN: &[u8] = b"\x1b[2J";
const MOUSE_ENABLE: &[u8] = b"\x1b[?1000;1002;1006h";
const MOUSE_DISABLE: &[u8] = b"\x1b[?1000;1002;1006l";

/// Where the screen dimensions come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeSource {
    /// Ask the OS on every query.
    Terminal,
    /// Fixed dimensions (headless screens, plain-text fallback).
    Fixed(u16, u16),
}

pub struct Screen<W: Write> {
    out: W,
    cols: u16,
    rows: u16,
    cells: Vec<Cell>,
    shown: Vec<Cell>,
    full_redraw: bool,
    size_source: SizeSource,
    alternate: bool,
    mouse: bool,
}

impl<W: Write> Screen<W> {
    /// Create a screen sized from `size_source`.
    pub fn new(out: W, size_source: SizeSource) -> Result<Self> {
        let (cols, rows) = query_size(size_source)?;
        Ok(Self::with_size(out, size_source, cols, rows))
    }

    /// Create a screen with fixed dimensions that never touches the OS.
    pub fn headless(out: W, cols: u16, rows: u16) -> Self {
        Self::with_size(out, SizeSource::Fixed(cols, rows), cols, rows)
    }

    fn with_size(out: W, size_source: SizeSource, cols: u16, rows: u16) -> Self {
        let len = cols as usize * rows as usize;
        Self {
            out,
            cols,
            rows,
            cells: vec![Cell::default(); len],
            shown: vec![Cell::default(); len],
            full_redraw: true,
            size_source,
            alternate: false,
            mouse: false,
        }
    }

    /// Re-query the terminal's dimensions, resizing the grid when they changed.
    ///
    /// Returns `(width, height)`.
    pub fn size(&mut self) -> Result<(u16, u16)> {
        let (cols, rows) = query_size(self.size_source)?;
        if (cols, rows) != (self.cols, self.rows) {
            debug!("Screen size changed: {}x{} -> {}x{}", self.cols, self.rows, cols, rows);
            self.resize(cols, rows);
        }
        Ok((cols, rows))
    }

    /// Grid dimensions as of the last query, `(width, height)`.
    pub fn dimensions(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    pub fn size_source(&self) -> SizeSource {
        self.size_source
    }

    pub fn set_size_source(&mut self, size_source: SizeSource) {
        self.size_source = size_source;
    }

    /// Reallocate both grids; content is lost and the next flush repaints.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        let len = cols as usize * rows as usize;
        self.cols = cols;
        self.rows = rows;
        self.cells = vec![Cell::default(); len];
        self.shown = vec![Cell::default(); len];
        self.full_redraw = true;
    }

    #[inline]
    fn index(&self, row: u16, col: u16) -> Option<usize> {
        if row < self.rows && col < self.cols {
            Some(row as usize * self.cols as usize + col as usize)
        } else {
            None
        }
    }

    pub fn cell(&self, row: u16, col: u16) -> Option<&Cell> {
        self.index(row, col).map(|i| &self.cells[i])
    }

    /// Text of one row, continuation cells skipped (for inspection and tests).
    pub fn row_text(&self, row: u16) -> String {
        (0..self.cols)
            .filter_map(|col| self.cell(row, col))
            .filter(|cell| !cell.is_continuation())
            .map(|cell| cell.display_str())
            .collect()
    }

    /// Every row's text, one line per row.
    pub fn snapshot(&self) -> String {
        (0..self.rows)
            .map(|row| self.row_text(row))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write one glyph and return how many columns it advanced.
    ///
    /// Zero-width glyphs fold onto the preceding cell; wide glyphs claim the
    /// next column as a continuation. A wide glyph that does not fit in the
    /// last column is replaced by a blank. Writes outside the grid are dropped.
    pub fn set_cell(&mut self, row: u16, col: u16, ch: char, style: Style) -> u16 {
        if ch.is_control() {
            return 0;
        }
        let width = char_width(ch);
        if width == 0 {
            self.fold_onto_previous(row, col, ch);
            return 0;
        }

        let Some(idx) = self.index(row, col) else {
            return width as u16;
        };

        if width == 2 && col + 1 >= self.cols {
            self.clear_wide_neighbours(row, col);
            self.cells[idx] = Cell::new(' ', 1, style);
            return 1;
        }

        self.clear_wide_neighbours(row, col);
        self.cells[idx] = Cell::new(ch, width as u8, style);
        if width == 2 {
            self.clear_wide_neighbours(row, col + 1);
            self.cells[idx + 1] = Cell::continuation(style);
        }
        width as u16
    }

    fn fold_onto_previous(&mut self, row: u16, col: u16, ch: char) {
        if col == 0 {
            return;
        }
        let mut target = col - 1;
        if target > 0 && self.cell(row, target).is_some_and(Cell::is_continuation) {
            target -= 1;
        }
        if let Some(idx) = self.index(row, target) {
            let cell = &mut self.cells[idx];
            if cell.grapheme.is_empty() {
                cell.grapheme.push(' ');
            }
            cell.grapheme.push(ch);
        }
    }

    /// Blank the other half of any wide character that `col` is about to split.
    fn clear_wide_neighbours(&mut self, row: u16, col: u16) {
        let Some(idx) = self.index(row, col) else {
            return;
        };
        let style = self.cells[idx].style;

        // Overwriting the right half of a wide char
        if col > 0 && self.cells[idx].is_continuation() {
            self.cells[idx - 1] = Cell::blank(style);
        }

        // Overwriting the left half of a wide char
        if self.cells[idx].width == 2 && col + 1 < self.cols {
            self.cells[idx + 1] = Cell::blank(style);
        }
    }

    /// Print text left to right, returning the column after the last glyph.
    pub fn print(&mut self, row: u16, col: u16, text: &str, style: Style) -> u16 {
        let mut col = col;
        for ch in text.chars() {
            if col >= self.cols && char_width(ch) > 0 {
                break;
            }
            col = col.saturating_add(self.set_cell(row, col, ch, style));
        }
        col
    }

    /// Fill a rectangle with one glyph.
    pub fn fill(&mut self, row: u16, col: u16, width: u16, height: u16, ch: char, style: Style) {
        for dy in 0..height {
            for dx in 0..width {
                self.set_cell(row.saturating_add(dy), col.saturating_add(dx), ch, style);
            }
        }
    }

    /// Reset every cell to blank with the default style.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = Cell::default();
        }
    }

    /// Blank a row that the terminal has already erased.
    pub fn clear_row(&mut self, row: u16) {
        if row >= self.rows {
            return;
        }
        let start = row as usize * self.cols as usize;
        let end = start + self.cols as usize;
        for i in start..end {
            self.cells[i] = Cell::default();
            self.shown[i] = Cell::default();
        }
    }

    /// Record a glyph that was already written to the terminal directly, so
    /// the next diff does not send it again.
    pub fn put_direct(&mut self, row: u16, col: u16, ch: char, style: Style) -> u16 {
        let advance = self.set_cell(row, col, ch, style);
        if row < self.rows {
            let start = col.saturating_sub(2);
            let end = col.saturating_add(3).min(self.cols);
            for c in start..end {
                if let Some(i) = self.index(row, c) {
                    self.shown[i] = self.cells[i].clone();
                }
            }
        }
        advance
    }

    /// Flush the cells changed since the last flush.
    pub fn show(&mut self) -> Result<()> {
        let Self {
            out,
            cols,
            cells,
            shown,
            full_redraw,
            ..
        } = self;
        let cols = *cols as usize;
        if cols == 0 {
            out.flush()?;
            return Ok(());
        }

        let mut last_style: Option<Style> = None;
        let mut last_pos: Option<(usize, usize)> = None;

        for (i, cell) in cells.iter().enumerate() {
            // Continuations are drawn together with their wide head
            if cell.is_continuation() {
                continue;
            }
            if !*full_redraw && *cell == shown[i] {
                continue;
            }

            let (row, col) = (i / cols, i % cols);
            if last_pos != Some((row, col)) {
                queue!(out, MoveTo(col as u16, row as u16))?;
            }
            if last_style != Some(cell.style) {
                apply_style(out, &cell.style)?;
                last_style = Some(cell.style);
            }
            queue!(out, Print(cell.display_str()))?;
            last_pos = Some((row, col + cell.width.max(1) as usize));
        }

        if last_style.is_some() {
            queue!(out, ResetColor)?;
        }
        out.flush()?;

        shown.clone_from(cells);
        *full_redraw = false;
        Ok(())
    }

    /// Force a repaint of every cell.
    pub fn sync(&mut self) -> Result<()> {
        self.full_redraw = true;
        self.show()
    }

    /// Erase the whole terminal and repaint from the grid.
    pub fn reload(&mut self) -> Result<()> {
        self.clear_console()?;
        self.sync()
    }

    /// Erase the terminal display (not the grid) and home the cursor.
    pub fn clear_console(&mut self) -> Result<()> {
        self.out.write_all(CLEAR_SCREEN)?;
        self.out.write_all(CURSOR_HOME)?;
        self.out.flush()?;
        self.full_redraw = true;
        Ok(())
    }

    /// Switch to the secondary buffer and home the cursor.
    pub fn enter_alternate_buffer(&mut self) -> Result<()> {
        if self.alternate {
            return Ok(());
        }
        self.out.write_all(ALT_SCREEN_ENTER)?;
        self.out.write_all(CURSOR_HOME)?;
        self.out.flush()?;
        self.alternate = true;
        self.full_redraw = true;
        debug!("Entered alternate screen buffer");
        Ok(())
    }

    /// Return to the primary buffer; the terminal restores what it showed.
    pub fn exit_alternate_buffer(&mut self) -> Result<()> {
        if !self.alternate {
            return Ok(());
        }
        self.out.write_all(ALT_SCREEN_LEAVE)?;
        self.out.flush()?;
        self.alternate = false;
        debug!("Left alternate screen buffer");
        Ok(())
    }

    pub fn is_alternate(&self) -> bool {
        self.alternate
    }

    /// Toggle SGR mouse reporting.
    pub fn set_mouse(&mut self, on: bool) -> Result<()> {
        if self.mouse == on {
            return Ok(());
        }
        self.out.write_all(if on { MOUSE_ENABLE } else { MOUSE_DISABLE })?;
        self.out.flush()?;
        self.mouse = on;
        Ok(())
    }

    pub fn mouse_enabled(&self) -> bool {
        self.mouse
    }

    /// Pass a control sequence straight to the terminal.
    pub fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    /// The underlying terminal writer.
    pub fn writer(&mut self) -> &mut W {
        &mut self.out
    }
}

fn query_size(source: SizeSource) -> Result<(u16, u16)> {
    match source {
        SizeSource::Terminal => terminal::size().map_err(TermError::SizeQueryFailed),
        SizeSource::Fixed(cols, rows) => Ok((cols, rows)),
    }
}

fn apply_style<W: Write>(out: &mut W, style: &Style) -> std::io::Result<()> {
    queue!(out, ResetColor)?;
    if style.fg != Color::Default {
        queue!(out, SetForegroundColor(style.fg.to_crossterm()))?;
    }
    if let Some(bg) = style.bg {
        if bg != Color::Default {
            queue!(out, SetBackgroundColor(bg.to_crossterm()))?;
        }
    }
    Ok(())
}
