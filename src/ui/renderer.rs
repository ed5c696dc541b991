//! Terminal renderer
//!
//! Glues the terminal device, the screen grid, the cursor tracker and the
//! window compositor together for the application loop. Screen grid
//! coordinates are 0-indexed; everything addressed through the cursor
//! (`move_to`, `render_text_at`, ...) is 1-indexed like the terminal itself.

use std::io::{self, Stdout, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    terminal::{Clear, ClearType},
};
use tracing::{debug, info, warn};

use super::window::{Window, WindowCompositor};
use crate::config::Config;
use crate::core::{CursorTracker, Result, Screen, SizeSource, Style, TerminalController, WrittenChar};

pub struct Renderer<W: Write = Stdout> {
    tty: Option<TerminalController>,
    screen: Screen<W>,
    cursor: CursorTracker,
    compositor: WindowCompositor,
    finished: bool,
}

impl Renderer<Stdout> {
    /// Take over the controlling terminal: raw mode, alternate buffer and,
    /// if configured, mouse reporting.
    ///
    /// Fails with `DeviceUnavailable` when there is no terminal, in which
    /// case the caller may fall back to plain output.
    pub fn open(config: &Config) -> Result<Self> {
        let mut tty = TerminalController::open()?;
        let screen = Screen::new(io::stdout(), SizeSource::Terminal)?;
        tty.enter_raw_mode()?;

        // From here on Drop restores the terminal
        let mut renderer = Self::assemble(Some(tty), screen, compositor_for(config));
        renderer.screen.enter_alternate_buffer()?;
        renderer.screen.set_mouse(config.mouse)?;
        renderer.screen.clear_console()?;

        let (width, height) = renderer.screen.dimensions();
        info!("Renderer started ({}x{})", width, height);
        Ok(renderer)
    }
}

impl<W: Write> Renderer<W> {
    /// A renderer without a terminal device, writing to `out` with a fixed size.
    pub fn headless(out: W, width: u16, height: u16) -> Self {
        Self::assemble(None, Screen::headless(out, width, height), WindowCompositor::default())
    }

    fn assemble(tty: Option<TerminalController>, screen: Screen<W>, compositor: WindowCompositor) -> Self {
        let (width, height) = screen.dimensions();
        Self {
            tty,
            screen,
            cursor: CursorTracker::new(width, height),
            compositor,
            finished: false,
        }
    }

    pub fn with_compositor(mut self, compositor: WindowCompositor) -> Self {
        self.compositor = compositor;
        self
    }

    /// Apply the rendering settings of `config`.
    pub fn configure(&mut self, config: &Config) -> Result<()> {
        self.compositor = compositor_for(config);
        self.screen.set_mouse(config.mouse)
    }

    pub fn screen(&self) -> &Screen<W> {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen<W> {
        &mut self.screen
    }

    pub fn cursor(&self) -> &CursorTracker {
        &self.cursor
    }

    pub fn compositor(&self) -> &WindowCompositor {
        &self.compositor
    }

    /// The terminal device, if this renderer owns one.
    pub fn tty_mut(&mut self) -> Option<&mut TerminalController> {
        self.tty.as_mut()
    }

    /// Output stream, for prompts that draw on the terminal directly.
    /// Call `sync` afterwards so the grid repaints over them.
    pub fn writer(&mut self) -> &mut W {
        self.screen.writer()
    }

    /// Re-query the terminal size; `(width, height)`.
    pub fn size(&mut self) -> Result<(u16, u16)> {
        let (width, height) = self.screen.size()?;
        self.cursor.set_bounds(width, height);
        Ok((width, height))
    }

    /// Adopt the size reported by a resize event.
    ///
    /// Terminal-backed screens re-query the OS; fixed-size screens take the
    /// reported size. The cursor is pulled back inside the new bounds.
    pub fn handle_resize(&mut self, width: u16, height: u16) -> Result<(u16, u16)> {
        if let SizeSource::Fixed(..) = self.screen.size_source() {
            self.screen.set_size_source(SizeSource::Fixed(width, height));
        }
        let (width, height) = self.screen.size()?;
        if self.cursor.set_bounds(width, height) {
            self.cursor.restore(self.screen.writer())?;
            self.screen.flush()?;
        }
        debug!("Resized to {}x{}, cursor at {:?}", width, height, self.cursor.position());
        Ok((width, height))
    }

    // Cursor

    pub fn move_to(&mut self, row: u16, col: u16) -> Result<()> {
        self.cursor.move_to(self.screen.writer(), row, col)?;
        self.screen.flush()
    }

    pub fn move_left(&mut self) -> Result<bool> {
        let moved = self.cursor.move_left(self.screen.writer())?;
        self.screen.flush()?;
        Ok(moved)
    }

    pub fn move_right(&mut self) -> Result<bool> {
        let moved = self.cursor.move_right(self.screen.writer())?;
        self.screen.flush()?;
        Ok(moved)
    }

    pub fn move_up(&mut self) -> Result<bool> {
        let moved = self.cursor.move_up(self.screen.writer())?;
        self.screen.flush()?;
        Ok(moved)
    }

    pub fn move_down(&mut self) -> Result<bool> {
        let moved = self.cursor.move_down(self.screen.writer())?;
        self.screen.flush()?;
        Ok(moved)
    }

    /// Write one character from raw input at the cursor.
    pub fn write_char(&mut self, bytes: &[u8]) -> Result<Option<WrittenChar>> {
        let written = self.cursor.write_char(self.screen.writer(), bytes)?;
        self.mirror(written);
        self.screen.flush()?;
        Ok(written)
    }

    /// Erase the character left of the cursor.
    pub fn backspace(&mut self) -> Result<()> {
        let erased = self.cursor.backspace(self.screen.writer())?;
        self.mirror(erased);
        self.screen.flush()
    }

    fn mirror(&mut self, written: Option<WrittenChar>) {
        if let Some(w) = written {
            self.screen
                .put_direct(w.row.saturating_sub(1), w.col.saturating_sub(1), w.ch, Style::default());
        }
    }

    pub fn hide_cursor(&mut self) -> Result<()> {
        self.cursor.hide_cursor(self.screen.writer())?;
        self.screen.flush()
    }

    pub fn show_cursor(&mut self) -> Result<()> {
        self.cursor.show_cursor(self.screen.writer())?;
        self.screen.flush()
    }

    /// Blank the cursor's row on the terminal and in the grid.
    pub fn clear_line(&mut self) -> Result<()> {
        self.cursor.clear_line(self.screen.writer())?;
        self.screen.clear_row(self.cursor.row().saturating_sub(1));
        self.screen.flush()
    }

    // Drawing

    pub fn render_window(&mut self, window: &Window, style: Style) {
        self.compositor.render_window(&mut self.screen, window, style);
    }

    /// Replace the row at `(row, col)` with `text` and flush; the cursor
    /// stays where it was.
    pub fn render_text_at(&mut self, row: u16, col: u16, text: &str, style: Style) -> Result<()> {
        let (r, c) = (row.saturating_sub(1), col.saturating_sub(1));
        queue!(self.screen.writer(), MoveTo(c, r), Clear(ClearType::CurrentLine))?;
        self.screen.clear_row(r);
        self.screen.print(r, c, text, style);
        self.show()
    }

    /// Draw `text` at `(row, col)` over whatever the row holds, and flush.
    pub fn render_text_no_clear(&mut self, row: u16, col: u16, text: &str, style: Style) -> Result<()> {
        self.screen
            .print(row.saturating_sub(1), col.saturating_sub(1), text, style);
        self.show()
    }

    pub fn clear(&mut self) {
        self.screen.clear();
    }

    /// Flush grid changes, then put the terminal cursor back.
    pub fn show(&mut self) -> Result<()> {
        self.screen.show()?;
        self.restore_cursor()
    }

    /// Repaint every cell.
    pub fn sync(&mut self) -> Result<()> {
        self.screen.sync()?;
        self.restore_cursor()
    }

    /// Erase the terminal and repaint it from the grid.
    pub fn reload(&mut self) -> Result<()> {
        self.screen.reload()?;
        self.restore_cursor()
    }

    fn restore_cursor(&mut self) -> Result<()> {
        self.cursor.restore(self.screen.writer())?;
        self.screen.flush()
    }

    pub fn enter_alternate_buffer(&mut self) -> Result<()> {
        self.screen.enter_alternate_buffer()
    }

    pub fn exit_alternate_buffer(&mut self) -> Result<()> {
        self.screen.exit_alternate_buffer()
    }

    /// Non-blocking single-key probe on the terminal device.
    pub fn probe_char(&mut self) -> Result<Option<char>> {
        match self.tty.as_mut() {
            Some(tty) => tty.probe_char(),
            None => Ok(None),
        }
    }

    /// Text of the whole grid, one line per row.
    pub fn snapshot(&self) -> String {
        self.screen.snapshot()
    }

    /// Hand the terminal back: mouse off, cursor shown, primary buffer,
    /// original mode. Runs once; later calls do nothing.
    ///
    /// Output errors are returned, but a failure to restore the terminal
    /// mode is only logged.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        let restored = self.restore_output();
        if let Some(tty) = self.tty.as_mut() {
            if let Err(e) = tty.exit_raw_mode() {
                warn!("Failed to restore terminal mode: {}", e);
            }
        }
        info!("Renderer finished");
        restored
    }

    fn restore_output(&mut self) -> Result<()> {
        self.screen.set_mouse(false)?;
        if !self.cursor.is_visible() {
            self.cursor.show_cursor(self.screen.writer())?;
        }
        self.screen.exit_alternate_buffer()?;
        self.screen.flush()
    }
}

impl<W: Write> Drop for Renderer<W> {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            warn!("Failed to restore terminal on drop: {}", e);
        }
    }
}

fn compositor_for(config: &Config) -> WindowCompositor {
    WindowCompositor::new(config.ellipsis).with_title_style(config.title_style())
}
