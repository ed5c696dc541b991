//! Width-aware text layout
//!
//! Every component that places characters on the grid measures them here, so
//! the screen, the cursor tracker, the window compositor and the line editor
//! agree on how many columns a string occupies.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

/// Display width of a single character (0, 1 or 2 columns).
///
/// Control characters report 0: they never occupy a cell.
pub fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}

/// Display width of a whole string.
pub fn str_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

/// Marker appended to text that had to be cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Ellipsis {
    #[serde(rename = "..")]
    Short,
    #[default]
    #[serde(rename = "...")]
    Long,
}

impl Ellipsis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ellipsis::Short => "..",
            Ellipsis::Long => "...",
        }
    }

    pub fn width(&self) -> usize {
        self.as_str().len()
    }
}

/// Fit `s` into `max_width` columns.
///
/// Text that already fits is returned untouched. Otherwise the longest prefix
/// that leaves room for the ellipsis is kept and the ellipsis appended, so the
/// result is never wider than `max_width`.
pub fn truncate(s: &str, max_width: usize, ellipsis: Ellipsis) -> Cow<'_, str> {
    if str_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let marker = ellipsis.as_str();
    if max_width <= marker.len() {
        return Cow::Owned(".".repeat(max_width));
    }

    let budget = max_width - marker.len();
    let mut out = String::with_capacity(max_width + 4);
    let mut used = 0;
    for ch in s.chars() {
        let w = char_width(ch);
        if used + w > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str(marker);
    Cow::Owned(out)
}

/// Decode the first UTF-8 character of a raw read buffer.
///
/// Raw reads hand back fixed-size buffers padded with NULs, so only the
/// leading sequence is considered.
pub fn decode_char(bytes: &[u8]) -> Option<char> {
    let len = match *bytes.first()? {
        b if b < 0x80 => 1,
        b if b >> 5 == 0b110 => 2,
        b if b >> 4 == 0b1110 => 3,
        b if b >> 3 == 0b1_1110 => 4,
        _ => return None,
    };
    std::str::from_utf8(bytes.get(..len)?).ok()?.chars().next()
}
