//! Rendering façade and input handling.
//!
//! - **renderer**: ties terminal, screen, cursor and compositor together
//! - **window**: bordered, titled windows drawn onto the screen grid
//! - **event**: key, mouse and resize events with shutdown-aware polling
//! - **prompt**: labeled line editors with per-prompt history

pub mod event;
pub mod prompt;
pub mod renderer;
pub mod window;

pub use event::{
    CrosstermBackend, Event, EventBackend, EventSource, KeyCode, KeyEvent, Modifiers, MouseButton, MouseEvent,
    MouseKind, ScriptedBackend, ShutdownSignal,
};
pub use prompt::{EditOutcome, LineEditor, LineRead, PromptKind, Prompts};
pub use renderer::Renderer;
pub use window::{BorderGlyphs, Window, WindowCompositor};
