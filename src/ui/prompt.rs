//! Labeled line prompts
//!
//! Each prompt kind has its own editor so that history typed at the URL
//! prompt never shows up at the method or body prompt.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveToColumn,
    queue,
    style::{Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};

use super::event::{KeyCode, KeyEvent, Modifiers};
use crate::core::{str_width, Color};

/// Lines kept per prompt
const HISTORY_LIMIT: usize = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Command,
    Url,
    Method,
    Body,
}

impl PromptKind {
    pub const ALL: [PromptKind; 4] = [PromptKind::Command, PromptKind::Url, PromptKind::Method, PromptKind::Body];

    /// Parse a prompt name; anything unknown is the command prompt.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "url" => PromptKind::Url,
            "method" => PromptKind::Method,
            "body" => PromptKind::Body,
            _ => PromptKind::Command,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PromptKind::Command => ">>>",
            PromptKind::Url => "url: >>>",
            PromptKind::Method => "method: >>>",
            PromptKind::Body => "body: >>>",
        }
    }

    fn index(&self) -> usize {
        match self {
            PromptKind::Command => 0,
            PromptKind::Url => 1,
            PromptKind::Method => 2,
            PromptKind::Body => 3,
        }
    }
}

/// Result of a line read
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineRead {
    Line(String),
    /// Ctrl-C, or shutdown while reading
    Cancelled,
    /// Ctrl-D on an empty line
    Eof,
}

/// What a key did to the line being edited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    Continue,
    Submit(String),
    Cancel,
    Eof,
}

#[derive(Clone, Debug)]
pub struct LineEditor {
    kind: PromptKind,
    buffer: Vec<char>,
    /// Insertion point, in characters
    cursor: usize,
    history: Vec<String>,
    max_history: usize,
    /// Entry shown while browsing history
    history_pos: Option<usize>,
    /// Line being typed before browsing started
    stash: Vec<char>,
}

impl LineEditor {
    pub fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            buffer: Vec::new(),
            cursor: 0,
            history: Vec::new(),
            max_history: HISTORY_LIMIT,
            history_pos: None,
            stash: Vec::new(),
        }
    }

    /// Keep at most `limit` history lines (at least one).
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.max_history = limit.max(1);
        self
    }

    pub fn kind(&self) -> PromptKind {
        self.kind
    }

    pub fn line(&self) -> String {
        self.buffer.iter().collect()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Display columns between the start of the line and the cursor.
    pub fn cursor_width(&self) -> usize {
        str_width(&self.buffer[..self.cursor].iter().collect::<String>())
    }

    /// Start a fresh line.
    pub fn begin(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.history_pos = None;
        self.stash.clear();
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> EditOutcome {
        if key.modifiers.contains(Modifiers::CTRL) {
            return self.handle_ctrl(key);
        }

        match key.code {
            KeyCode::Char(ch) if !key.modifiers.contains(Modifiers::ALT) && !ch.is_control() => {
                self.buffer.insert(self.cursor, ch);
                self.cursor += 1;
            }
            KeyCode::Enter => return EditOutcome::Submit(self.submit()),
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.buffer.remove(self.cursor);
                }
            }
            KeyCode::Delete => self.delete_at_cursor(),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.buffer.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.buffer.len(),
            KeyCode::Up => self.history_back(),
            KeyCode::Down => self.history_forward(),
            _ => {}
        }
        EditOutcome::Continue
    }

    fn handle_ctrl(&mut self, key: &KeyEvent) -> EditOutcome {
        let KeyCode::Char(ch) = key.code else {
            return EditOutcome::Continue;
        };
        match ch.to_ascii_lowercase() {
            'c' => return EditOutcome::Cancel,
            'd' if self.buffer.is_empty() => return EditOutcome::Eof,
            'd' => self.delete_at_cursor(),
            'a' => self.cursor = 0,
            'e' => self.cursor = self.buffer.len(),
            'u' => {
                self.buffer.clear();
                self.cursor = 0;
            }
            _ => {}
        }
        EditOutcome::Continue
    }

    fn delete_at_cursor(&mut self) {
        if self.cursor < self.buffer.len() {
            self.buffer.remove(self.cursor);
        }
    }

    fn submit(&mut self) -> String {
        let line = self.line();
        if !line.is_empty() && self.history.last() != Some(&line) {
            self.history.push(line.clone());
            // Oldest entries go first
            if self.history.len() > self.max_history {
                let excess = self.history.len() - self.max_history;
                self.history.drain(..excess);
            }
        }
        self.begin();
        line
    }

    fn history_back(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let pos = match self.history_pos {
            None => {
                self.stash = std::mem::take(&mut self.buffer);
                self.history.len() - 1
            }
            Some(pos) => pos.saturating_sub(1),
        };
        self.load(pos);
    }

    fn history_forward(&mut self) {
        match self.history_pos {
            Some(pos) if pos + 1 < self.history.len() => self.load(pos + 1),
            Some(_) => {
                self.history_pos = None;
                self.buffer = std::mem::take(&mut self.stash);
                self.cursor = self.buffer.len();
            }
            None => {}
        }
    }

    fn load(&mut self, pos: usize) {
        self.history_pos = Some(pos);
        self.buffer = self.history[pos].chars().collect();
        self.cursor = self.buffer.len();
    }

    /// Redraw the prompt on the current terminal row.
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let label = self.kind.label();
        let col = str_width(label) + 1 + self.cursor_width();
        queue!(
            out,
            Print("\r"),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::by_name("cyan").to_crossterm()),
            Print(label),
            ResetColor,
            Print(" "),
            Print(self.line()),
            MoveToColumn(col.min(u16::MAX as usize) as u16)
        )?;
        out.flush()
    }
}

/// One line editor per prompt kind.
#[derive(Clone, Debug)]
pub struct Prompts {
    editors: Vec<LineEditor>,
}

impl Default for Prompts {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompts {
    pub fn new() -> Self {
        Self {
            editors: PromptKind::ALL.iter().map(|kind| LineEditor::new(*kind)).collect(),
        }
    }

    pub fn editor(&self, kind: PromptKind) -> &LineEditor {
        &self.editors[kind.index()]
    }

    pub fn editor_mut(&mut self, kind: PromptKind) -> &mut LineEditor {
        &mut self.editors[kind.index()]
    }
}
