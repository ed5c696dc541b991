//! Grid cells, colors and styles.

use crossterm::style::Color as CtColor;

/// Color definition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    Default,
    Indexed(u8),
    Rgb(u8, u8, u8),
}

/// Fixed palette addressable by name.
const PALETTE: &[(&str, u8)] = &[
    ("black", 0),
    ("maroon", 1),
    ("red", 9),
    ("green", 2),
    ("olive", 3),
    ("yellow", 11),
    ("navy", 4),
    ("blue", 12),
    ("purple", 5),
    ("magenta", 13),
    ("fuchsia", 13),
    ("teal", 6),
    ("cyan", 14),
    ("aqua", 14),
    ("silver", 7),
    ("gray", 8),
    ("grey", 8),
    ("lime", 10),
    ("white", 15),
];

impl Color {
    /// Look up a palette color by name, or parse a `#rrggbb` literal.
    ///
    /// Unknown names resolve to the terminal default color.
    pub fn by_name(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        if let Some(hex) = name.strip_prefix('#') {
            return Self::parse_hex(hex).unwrap_or_default();
        }
        PALETTE
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, idx)| Color::Indexed(*idx))
            .unwrap_or_default()
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Convert to crossterm color
    pub fn to_crossterm(&self) -> CtColor {
        match self {
            Color::Default => CtColor::Reset,
            Color::Indexed(n) => CtColor::AnsiValue(*n),
            Color::Rgb(r, g, b) => CtColor::Rgb {
                r: *r,
                g: *g,
                b: *b,
            },
        }
    }
}

/// Foreground color plus optional background.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Style {
    pub fg: Color,
    pub bg: Option<Color>,
}

impl Style {
    pub fn new(fg: Color) -> Self {
        Self { fg, bg: None }
    }

    pub fn with_bg(mut self, bg: Color) -> Self {
        self.bg = Some(bg);
        self
    }

    /// Build a style from palette names.
    pub fn from_names(fg: &str, bg: Option<&str>) -> Self {
        Self {
            fg: Color::by_name(fg),
            bg: bg.map(Color::by_name),
        }
    }
}

/// A single cell
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    /// Base character followed by any folded zero-width characters.
    pub grapheme: String,
    /// Columns occupied; 0 marks the right half of a wide character.
    pub width: u8,
    pub style: Style,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            grapheme: String::new(),
            width: 1,
            style: Style::default(),
        }
    }
}

impl Cell {
    pub fn new(ch: char, width: u8, style: Style) -> Self {
        Self {
            grapheme: ch.to_string(),
            width,
            style,
        }
    }

    pub fn blank(style: Style) -> Self {
        Self {
            grapheme: String::new(),
            width: 1,
            style,
        }
    }

    pub fn continuation(style: Style) -> Self {
        Self {
            grapheme: String::new(),
            width: 0,
            style,
        }
    }

    pub fn is_continuation(&self) -> bool {
        self.width == 0
    }

    /// Get the display text (space if empty)
    pub fn display_str(&self) -> &str {
        if self.grapheme.is_empty() {
            " "
        } else {
            &self.grapheme
        }
    }
}
