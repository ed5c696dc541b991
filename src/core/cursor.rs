//! Cursor position tracking
//!
//! The terminal cursor is moved with escape sequences and never read back,
//! so its position is mirrored here. Coordinates are 1-indexed `(row, col)`
//! bounded by the terminal size.

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    terminal::{Clear, ClearType},
};

use super::text::{char_width, decode_char};

/// A character written by the cursor path, for mirroring into the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WrittenChar {
    pub ch: char,
    /// 1-indexed position the character was written at
    pub row: u16,
    pub col: u16,
    pub width: u16,
}

pub struct CursorTracker {
    row: u16,
    col: u16,
    width: u16,
    height: u16,
    visible: bool,
}

impl CursorTracker {
    /// Start at `(1, 1)` inside a `width` x `height` terminal.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            row: 1,
            col: 1,
            width,
            height,
            visible: true,
        }
    }

    /// Current `(row, col)`.
    pub fn position(&self) -> (u16, u16) {
        (self.row, self.col)
    }

    pub fn row(&self) -> u16 {
        self.row
    }

    pub fn col(&self) -> u16 {
        self.col
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Bounds as `(width, height)`.
    pub fn bounds(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Adopt new terminal bounds after a resize.
    ///
    /// The tracked position is pulled back inside the new bounds; returns
    /// whether it had to move.
    pub fn set_bounds(&mut self, width: u16, height: u16) -> bool {
        self.width = width;
        self.height = height;
        let row = self.row.clamp(1, height.max(1));
        let col = self.col.clamp(1, width.max(1));
        let moved = (row, col) != (self.row, self.col);
        self.row = row;
        self.col = col;
        moved
    }

    /// Position the cursor absolutely. No clamping: staying inside the
    /// terminal is the caller's job.
    pub fn move_to<W: Write>(&mut self, out: &mut W, row: u16, col: u16) -> io::Result<()> {
        queue!(out, MoveTo(col.saturating_sub(1), row.saturating_sub(1)))?;
        self.row = row;
        self.col = col;
        Ok(())
    }

    /// Re-issue the tracked position (after something else moved the real cursor).
    pub fn restore<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let (row, col) = self.position();
        self.move_to(out, row, col)
    }

    /// Move one column left; refuses to leave the terminal.
    pub fn move_left<W: Write>(&mut self, out: &mut W) -> io::Result<bool> {
        if self.col <= 1 {
            return Ok(false);
        }
        self.move_to(out, self.row, self.col - 1)?;
        Ok(true)
    }

    pub fn move_right<W: Write>(&mut self, out: &mut W) -> io::Result<bool> {
        if self.col >= self.width {
            return Ok(false);
        }
        self.move_to(out, self.row, self.col + 1)?;
        Ok(true)
    }

    pub fn move_up<W: Write>(&mut self, out: &mut W) -> io::Result<bool> {
        if self.row <= 1 {
            return Ok(false);
        }
        self.move_to(out, self.row - 1, self.col)?;
        Ok(true)
    }

    pub fn move_down<W: Write>(&mut self, out: &mut W) -> io::Result<bool> {
        if self.row >= self.height {
            return Ok(false);
        }
        self.move_to(out, self.row + 1, self.col)?;
        Ok(true)
    }

    /// Write one character from a raw read buffer and advance by its width.
    ///
    /// Control characters are not written: the terminal would move its
    /// cursor on its own. A wide glyph that does not fit in the last column
    /// starts the next row instead. When the advance would pass the last
    /// column the cursor moves to column 1 of the next row (held at the last
    /// row).
    pub fn write_char<W: Write>(&mut self, out: &mut W, bytes: &[u8]) -> io::Result<Option<WrittenChar>> {
        let Some(ch) = decode_char(bytes) else {
            return Ok(None);
        };
        if ch.is_control() {
            return Ok(None);
        }
        let width = char_width(ch) as u16;
        if width > self.width {
            return Ok(None);
        }

        if self.col.saturating_add(width).saturating_sub(1) > self.width {
            self.wrap(out)?;
        }
        let written = WrittenChar {
            ch,
            row: self.row,
            col: self.col,
            width,
        };

        write!(out, "{}", ch)?;

        let next = self.col.saturating_add(width);
        if next > self.width {
            self.wrap(out)?;
        } else {
            self.col = next;
        }
        Ok(Some(written))
    }

    fn wrap<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let row = self.row.saturating_add(1).min(self.height.max(1));
        self.move_to(out, row, 1)
    }

    pub fn hide_cursor<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        queue!(out, Hide)?;
        self.visible = false;
        Ok(())
    }

    pub fn show_cursor<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        queue!(out, Show)?;
        self.visible = true;
        Ok(())
    }

    /// Blank the row the cursor is on. The position is unchanged.
    pub fn clear_line<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        queue!(out, Clear(ClearType::CurrentLine))
    }

    /// Erase the character before the cursor and step back onto it.
    ///
    /// A no-op in column 1.
    pub fn backspace<W: Write>(&mut self, out: &mut W) -> io::Result<Option<WrittenChar>> {
        if !self.move_left(out)? {
            return Ok(None);
        }
        let written = self.write_char(out, b" ")?;
        let (row, col) = written.map_or(self.position(), |w| (w.row, w.col));
        self.move_to(out, row, col)?;
        Ok(written)
    }
}
