//! Bordered windows drawn onto the shared screen grid.
//!
//! A window owns no region of the screen; it is redrawn in full every frame.
//! Position `(x, y)` is the `(row, col)` of the top-left corner, `size_x` the
//! number of rows and `size_y` the number of columns, border included.

use std::io::Write;

use crate::core::{char_width, str_width, truncate, Ellipsis, Screen, Style};

/// Border glyph set
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BorderGlyphs {
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
    pub horizontal: char,
    pub vertical: char,
}

impl Default for BorderGlyphs {
    fn default() -> Self {
        Self::single()
    }
}

impl BorderGlyphs {
    pub fn single() -> Self {
        Self {
            top_left: '┌',
            top_right: '┐',
            bottom_left: '└',
            bottom_right: '┘',
            horizontal: '─',
            vertical: '│',
        }
    }

    pub fn double() -> Self {
        Self {
            top_left: '╔',
            top_right: '╗',
            bottom_left: '╚',
            bottom_right: '╝',
            horizontal: '═',
            vertical: '║',
        }
    }

    pub fn rounded() -> Self {
        Self {
            top_left: '╭',
            top_right: '╮',
            bottom_left: '╰',
            bottom_right: '╯',
            ..Self::single()
        }
    }

    pub fn heavy() -> Self {
        Self {
            top_left: '┏',
            top_right: '┓',
            bottom_left: '┗',
            bottom_right: '┛',
            horizontal: '━',
            vertical: '┃',
        }
    }

    pub fn ascii() -> Self {
        Self {
            top_left: '+',
            top_right: '+',
            bottom_left: '+',
            bottom_right: '+',
            horizontal: '-',
            vertical: '|',
        }
    }

    /// Get glyphs by style name; unknown names fall back to `single`.
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "double" => Self::double(),
            "rounded" | "round" => Self::rounded(),
            "heavy" | "thick" => Self::heavy(),
            "ascii" => Self::ascii(),
            _ => Self::single(),
        }
    }

    /// List available styles
    pub fn list() -> Vec<&'static str> {
        vec!["single", "double", "rounded", "heavy", "ascii"]
    }
}

/// A titled panel of text lines
#[derive(Clone, Debug, Default)]
pub struct Window {
    pub x: u16,
    pub y: u16,
    pub size_x: u16,
    pub size_y: u16,
    pub title: Option<String>,
    pub content: Vec<String>,
    pub border: BorderGlyphs,
}

impl Window {
    pub fn new(x: u16, y: u16, size_x: u16, size_y: u16) -> Self {
        Self {
            x,
            y,
            size_x,
            size_y,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_content<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_content(lines);
        self
    }

    pub fn with_border(mut self, border: BorderGlyphs) -> Self {
        self.border = border;
        self
    }

    /// Replace the content lines.
    pub fn set_content<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.content = lines.into_iter().map(Into::into).collect();
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.content.push(line.into());
    }

    /// Interior `(rows, cols)` inside the border.
    pub fn interior(&self) -> (u16, u16) {
        (self.size_x.saturating_sub(2), self.size_y.saturating_sub(2))
    }

    fn bottom(&self) -> u16 {
        self.x.saturating_add(self.size_x - 1)
    }

    fn right(&self) -> u16 {
        self.y.saturating_add(self.size_y - 1)
    }
}

/// Draws windows onto a screen.
#[derive(Clone, Debug, Default)]
pub struct WindowCompositor {
    pub ellipsis: Ellipsis,
    /// Style for titles; the window style is used when unset.
    pub title_style: Option<Style>,
}

impl WindowCompositor {
    pub fn new(ellipsis: Ellipsis) -> Self {
        Self {
            ellipsis,
            title_style: None,
        }
    }

    pub fn with_title_style(mut self, style: Style) -> Self {
        self.title_style = Some(style);
        self
    }

    /// Draw border, interior, title and content of `window`.
    ///
    /// A window without rows or columns draws nothing; one too small to
    /// have an interior draws its border and title only. The title is drawn
    /// when its display width is less than `size_y`, so a title exactly
    /// `size_y - 1` wide covers the top-right corner glyph.
    pub fn render_window<W: Write>(&self, screen: &mut Screen<W>, window: &Window, style: Style) {
        if window.size_x == 0 || window.size_y == 0 {
            return;
        }

        self.draw_border(screen, window, style);

        let (inner_rows, inner_cols) = window.interior();
        if inner_rows > 0 && inner_cols > 0 {
            screen.fill(window.x.saturating_add(1), window.y.saturating_add(1), inner_cols, inner_rows, ' ', style);
        }

        if let Some(title) = &window.title {
            let title = skip_leading_marks(title);
            // Too-long titles are omitted, never truncated
            if str_width(title) < window.size_y as usize {
                let title_style = self.title_style.unwrap_or(style);
                screen.print(window.x, window.y.saturating_add(1), title, title_style);
            }
        }

        if inner_rows > 0 && inner_cols > 0 {
            self.draw_content(screen, window, style, inner_rows, inner_cols);
        }
    }

    fn draw_border<W: Write>(&self, screen: &mut Screen<W>, window: &Window, style: Style) {
        let g = &window.border;
        let (top, left) = (window.x, window.y);
        let (bottom, right) = (window.bottom(), window.right());

        for col in left.saturating_add(1)..right {
            screen.set_cell(top, col, g.horizontal, style);
            screen.set_cell(bottom, col, g.horizontal, style);
        }
        for row in top.saturating_add(1)..bottom {
            screen.set_cell(row, left, g.vertical, style);
            screen.set_cell(row, right, g.vertical, style);
        }

        screen.set_cell(top, left, g.top_left, style);
        screen.set_cell(top, right, g.top_right, style);
        screen.set_cell(bottom, left, g.bottom_left, style);
        screen.set_cell(bottom, right, g.bottom_right, style);
    }

    fn draw_content<W: Write>(&self, screen: &mut Screen<W>, window: &Window, style: Style, rows: u16, cols: u16) {
        let max_width = cols as usize;
        let (top, left) = (window.x.saturating_add(1), window.y.saturating_add(1));
        let overflow = window.content.len() > rows as usize;
        let visible = if overflow { rows as usize - 1 } else { window.content.len() };

        for (i, line) in window.content.iter().take(visible).enumerate() {
            let text = truncate(skip_leading_marks(line), max_width, self.ellipsis);
            screen.print(top.saturating_add(i as u16), left, &text, style);
        }

        if overflow {
            let marker = truncate(self.ellipsis.as_str(), max_width, self.ellipsis);
            screen.print(window.x.saturating_add(rows), left, &marker, style);
        }
    }
}

/// Drop zero-width characters at the start of `text`; drawn first they
/// would combine with the border cell to their left.
fn skip_leading_marks(text: &str) -> &str {
    text.trim_start_matches(|ch: char| char_width(ch) == 0)
}
