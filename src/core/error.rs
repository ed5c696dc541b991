//! Error taxonomy for the terminal boundary.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TermError {
    /// No controlling terminal (non-interactive session, detached process).
    #[error("No controlling terminal available: {0}")]
    DeviceUnavailable(#[source] io::Error),

    #[error("Failed to query terminal size: {0}")]
    SizeQueryFailed(#[source] io::Error),

    #[error("Failed to switch terminal mode: {0}")]
    ModeSwitchFailed(#[source] nix::Error),

    /// A real I/O failure; an empty non-blocking read is never reported here.
    #[error("Failed to read from terminal: {0}")]
    ReadFailed(#[source] io::Error),

    #[error("Failed to write to terminal: {0}")]
    Write(#[from] io::Error),
}

impl TermError {
    /// Whether the caller can keep going without an interactive terminal.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TermError::DeviceUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, TermError>;
