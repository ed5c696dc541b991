//! Terminal boundary components.
//!
//! - **tty**: controlling terminal device, raw mode and non-blocking reads
//! - **screen**: double-buffered cell grid, the single writer of output
//! - **cursor**: mirrored cursor position with bounded moves
//! - **text**: display width and truncation shared by everything above
//!
//! # Architecture
//!
//! ```text
//! TerminalController (input device + line discipline)
//! Screen (output)
//! ├── cells / shown grids of Cell
//! └── alternate buffer + mouse mode
//! CursorTracker (row, col) mirrored from emitted sequences
//! ```

pub mod cell;
pub mod cursor;
pub mod error;
pub mod screen;
pub mod text;
pub mod tty;

pub use cell::{Cell, Color, Style};
pub use cursor::{CursorTracker, WrittenChar};
pub use error::{Result, TermError};
pub use screen::{Screen, SizeSource};
pub use text::{char_width, decode_char, str_width, truncate, Ellipsis};
pub use tty::TerminalController;
