//! Terminal rendering core for the mooze REST client.
//!
//! Owns the controlling terminal, mirrors the screen in a cell grid, tracks
//! the cursor, composes bordered windows and reports input events.
//!
//! # Module Structure
//!
//! - [`core`]: terminal device, screen grid, cursor tracking, text width
//! - [`ui`]: renderer façade, windows, events and prompts
//! - [`config`]: `~/.mooze/config.toml`

pub mod config;
pub mod core;
pub mod ui;

pub use config::{Config, ConfigError};
pub use core::{Result, TermError};
pub use ui::{Event, EventSource, Renderer, Window};
