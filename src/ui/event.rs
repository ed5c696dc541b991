//! Input events
//!
//! `EventSource::poll` waits for the next key, mouse or resize event. The
//! wait is split into short ticks so that a `ShutdownSignal` raised by a
//! signal handler or another thread ends it promptly.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bitflags::bitflags;
use crossterm::event::{self as ct, KeyEventKind, KeyModifiers};
use tracing::{debug, info};

use super::prompt::{EditOutcome, LineRead, PromptKind, Prompts};
use crate::core::{Result, TermError};

const DEFAULT_TICK: Duration = Duration::from_millis(50);

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        result
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCode {
    /// Printable character, or a control character with `CTRL` set
    Char(char),
    Enter,
    Backspace,
    Delete,
    Tab,
    Esc,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    pub fn plain(code: KeyCode) -> Self {
        Self::new(code, Modifiers::empty())
    }

    /// Ctrl + `ch`
    pub fn ctrl(ch: char) -> Self {
        Self::new(KeyCode::Char(ch), Modifiers::CTRL)
    }

    /// Whether this is Ctrl + `ch` (case-insensitive).
    pub fn is_ctrl(&self, ch: char) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
            && matches!(self.code, KeyCode::Char(c) if c.eq_ignore_ascii_case(&ch))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseKind {
    Down(MouseButton),
    Up(MouseButton),
    Drag(MouseButton),
    Moved,
    ScrollUp,
    ScrollDown,
}

/// Mouse action at a 1-indexed `(row, col)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseKind,
    pub row: u16,
    pub col: u16,
    pub modifiers: Modifiers,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// New `(width, height)`; re-query the screen size before drawing.
    Resize(u16, u16),
}

impl Event {
    /// Convert a crossterm event; events that are not reported map to `None`.
    pub fn from_crossterm(event: ct::Event) -> Option<Self> {
        match event {
            ct::Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    return None;
                }
                let code = match key.code {
                    ct::KeyCode::Char(c) => KeyCode::Char(c),
                    ct::KeyCode::Enter => KeyCode::Enter,
                    ct::KeyCode::Backspace => KeyCode::Backspace,
                    ct::KeyCode::Delete => KeyCode::Delete,
                    ct::KeyCode::Tab | ct::KeyCode::BackTab => KeyCode::Tab,
                    ct::KeyCode::Esc => KeyCode::Esc,
                    ct::KeyCode::Left => KeyCode::Left,
                    ct::KeyCode::Right => KeyCode::Right,
                    ct::KeyCode::Up => KeyCode::Up,
                    ct::KeyCode::Down => KeyCode::Down,
                    ct::KeyCode::Home => KeyCode::Home,
                    ct::KeyCode::End => KeyCode::End,
                    ct::KeyCode::PageUp => KeyCode::PageUp,
                    ct::KeyCode::PageDown => KeyCode::PageDown,
                    ct::KeyCode::F(n) => KeyCode::F(n),
                    _ => return None,
                };
                Some(Event::Key(KeyEvent::new(code, key.modifiers.into())))
            }
            ct::Event::Mouse(mouse) => {
                let button = |b: ct::MouseButton| match b {
                    ct::MouseButton::Left => MouseButton::Left,
                    ct::MouseButton::Right => MouseButton::Right,
                    ct::MouseButton::Middle => MouseButton::Middle,
                };
                let kind = match mouse.kind {
                    ct::MouseEventKind::Down(b) => MouseKind::Down(button(b)),
                    ct::MouseEventKind::Up(b) => MouseKind::Up(button(b)),
                    ct::MouseEventKind::Drag(b) => MouseKind::Drag(button(b)),
                    ct::MouseEventKind::Moved => MouseKind::Moved,
                    ct::MouseEventKind::ScrollUp => MouseKind::ScrollUp,
                    ct::MouseEventKind::ScrollDown => MouseKind::ScrollDown,
                    _ => return None,
                };
                Some(Event::Mouse(MouseEvent {
                    kind,
                    row: mouse.row.saturating_add(1),
                    col: mouse.column.saturating_add(1),
                    modifiers: mouse.modifiers.into(),
                }))
            }
            ct::Event::Resize(cols, rows) => Some(Event::Resize(cols, rows)),
            _ => None,
        }
    }
}

/// Shared flag that ends blocking waits.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a signal raised by SIGINT, SIGTERM and SIGHUP.
    ///
    /// This replaces the default action of those signals, so only install it
    /// where something polls the flag. A second signal after the first one
    /// terminates the process with exit code 1.
    pub fn install() -> io::Result<Self> {
        use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
        use signal_hook::flag;

        let signal = Self::new();
        for sig in [SIGINT, SIGTERM, SIGHUP] {
            // Registered first so it sees the flag before this delivery sets it
            flag::register_conditional_shutdown(sig, 1, Arc::clone(&signal.0))?;
            flag::register(sig, Arc::clone(&signal.0))?;
        }
        Ok(signal)
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where events come from.
pub trait EventBackend {
    /// Wait up to `timeout`; `true` when `read` will not block.
    fn poll(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Take the ready event; `None` for input that is not reported.
    fn read(&mut self) -> io::Result<Option<Event>>;
}

/// Events from the terminal via crossterm.
#[derive(Debug, Default)]
pub struct CrosstermBackend;

impl EventBackend for CrosstermBackend {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        ct::poll(timeout)
    }

    fn read(&mut self) -> io::Result<Option<Event>> {
        Ok(Event::from_crossterm(ct::read()?))
    }
}

/// Replays a fixed list of events. Once drained it raises its shutdown
/// signal, if given one, so loops driven by it terminate.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    events: VecDeque<Event>,
    on_drained: Option<ShutdownSignal>,
}

impl ScriptedBackend {
    pub fn new<I: IntoIterator<Item = Event>>(events: I) -> Self {
        Self {
            events: events.into_iter().collect(),
            on_drained: None,
        }
    }

    pub fn shutdown_when_drained(mut self, signal: ShutdownSignal) -> Self {
        self.on_drained = Some(signal);
        self
    }

    /// Queue key presses for every character of `text`.
    pub fn keys(text: &str) -> Vec<Event> {
        text.chars()
            .map(|c| Event::Key(KeyEvent::plain(KeyCode::Char(c))))
            .collect()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push_back(event);
    }
}

impl EventBackend for ScriptedBackend {
    fn poll(&mut self, _timeout: Duration) -> io::Result<bool> {
        if self.events.is_empty() {
            if let Some(signal) = &self.on_drained {
                signal.trigger();
            }
            return Ok(false);
        }
        Ok(true)
    }

    fn read(&mut self) -> io::Result<Option<Event>> {
        Ok(self.events.pop_front())
    }
}

pub struct EventSource<B: EventBackend = CrosstermBackend> {
    backend: B,
    shutdown: ShutdownSignal,
    tick: Duration,
    /// Resize seen while a prompt was open, delivered by the next `poll`
    deferred: Option<Event>,
    prompts: Prompts,
}

impl EventSource<CrosstermBackend> {
    /// Terminal events, ended early by `shutdown`.
    pub fn terminal(shutdown: ShutdownSignal) -> Self {
        Self::new(CrosstermBackend, shutdown)
    }
}

impl<B: EventBackend> EventSource<B> {
    pub fn new(backend: B, shutdown: ShutdownSignal) -> Self {
        Self {
            backend,
            shutdown,
            tick: DEFAULT_TICK,
            deferred: None,
            prompts: Prompts::new(),
        }
    }

    /// How long each wait slice lasts before the shutdown flag is checked.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    /// Block until the next event.
    ///
    /// Returns `Ok(None)` once shutdown has been requested.
    pub fn poll(&mut self) -> Result<Option<Event>> {
        if let Some(event) = self.deferred.take() {
            return Ok(Some(event));
        }
        wait_event(&mut self.backend, &self.shutdown, self.tick)
    }

    /// Read a line at the command prompt.
    pub fn read_line<W: Write>(&mut self, out: &mut W) -> Result<LineRead> {
        self.read_line_typed(PromptKind::Command, out)
    }

    /// Read a line with the prompt and history of `kind`.
    ///
    /// The prompt is drawn on the terminal row the cursor is on. A resize
    /// arriving meanwhile is held back and reported by the next `poll`;
    /// shutdown cancels the read.
    pub fn read_line_typed<W: Write>(&mut self, kind: PromptKind, out: &mut W) -> Result<LineRead> {
        let Self {
            backend,
            shutdown,
            tick,
            deferred,
            prompts,
        } = self;
        let editor = prompts.editor_mut(kind);
        editor.begin();
        editor.render(out)?;

        loop {
            let Some(event) = wait_event(&mut *backend, shutdown, *tick)? else {
                debug!("Prompt {:?} cancelled by shutdown", kind);
                return Ok(LineRead::Cancelled);
            };
            match event {
                Event::Key(key) => match editor.handle_key(&key) {
                    EditOutcome::Continue => editor.render(out)?,
                    EditOutcome::Submit(line) => return Ok(LineRead::Line(line)),
                    EditOutcome::Cancel => return Ok(LineRead::Cancelled),
                    EditOutcome::Eof => return Ok(LineRead::Eof),
                },
                Event::Resize(..) => *deferred = Some(event),
                Event::Mouse(_) => {}
            }
        }
    }
}

fn wait_event<B: EventBackend>(backend: &mut B, shutdown: &ShutdownSignal, tick: Duration) -> Result<Option<Event>> {
    loop {
        if shutdown.is_triggered() {
            info!("Shutdown requested");
            return Ok(None);
        }
        if backend.poll(tick).map_err(TermError::ReadFailed)? {
            if let Some(event) = backend.read().map_err(TermError::ReadFailed)? {
                return Ok(Some(event));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent as CtKeyEvent, KeyEventState, MouseEvent as CtMouseEvent, MouseEventKind};

    fn source(events: Vec<Event>) -> EventSource<ScriptedBackend> {
        let shutdown = ShutdownSignal::new();
        let backend = ScriptedBackend::new(events).shutdown_when_drained(shutdown.clone());
        EventSource::new(backend, shutdown)
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::plain(code))
    }

    #[test]
    fn test_crossterm_key_conversion() {
        let ev = ct::Event::Key(CtKeyEvent::new(ct::KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(Event::from_crossterm(ev), Some(Event::Key(KeyEvent::ctrl('c'))));

        let ev = ct::Event::Key(CtKeyEvent::new(ct::KeyCode::Up, KeyModifiers::SHIFT | KeyModifiers::ALT));
        assert_eq!(
            Event::from_crossterm(ev),
            Some(Event::Key(KeyEvent::new(KeyCode::Up, Modifiers::SHIFT | Modifiers::ALT)))
        );
    }

    #[test]
    fn test_release_events_are_dropped() {
        let ev = ct::Event::Key(CtKeyEvent {
            code: ct::KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        assert_eq!(Event::from_crossterm(ev), None);
        assert_eq!(Event::from_crossterm(ct::Event::FocusGained), None);
    }

    #[test]
    fn test_mouse_positions_are_one_indexed() {
        let ev = ct::Event::Mouse(CtMouseEvent {
            kind: MouseEventKind::Down(ct::MouseButton::Left),
            column: 0,
            row: 4,
            modifiers: KeyModifiers::NONE,
        });
        let Some(Event::Mouse(mouse)) = Event::from_crossterm(ev) else {
            panic!("expected mouse event");
        };
        assert_eq!(mouse.kind, MouseKind::Down(MouseButton::Left));
        assert_eq!((mouse.row, mouse.col), (5, 1));
    }

    #[test]
    fn test_resize_conversion() {
        assert_eq!(Event::from_crossterm(ct::Event::Resize(100, 30)), Some(Event::Resize(100, 30)));
    }

    #[test]
    fn test_poll_yields_one_event_per_call() {
        let mut events = source(vec![key(KeyCode::Char('q')), Event::Resize(90, 20)]);
        assert_eq!(events.poll().unwrap(), Some(key(KeyCode::Char('q'))));
        assert_eq!(events.poll().unwrap(), Some(Event::Resize(90, 20)));
        // Drained: the scripted backend raises shutdown
        assert_eq!(events.poll().unwrap(), None);
        assert!(events.shutdown_signal().is_triggered());
    }

    #[test]
    fn test_shutdown_from_another_thread() {
        let shutdown = ShutdownSignal::new();
        let mut events = EventSource::new(ScriptedBackend::default(), shutdown.clone()).with_tick(Duration::from_millis(1));
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            shutdown.trigger();
        });
        assert_eq!(events.poll().unwrap(), None);
        handle.join().unwrap();
    }

    #[test]
    fn test_read_line_submits() {
        let mut script = ScriptedBackend::keys("GET");
        script.push(key(KeyCode::Enter));
        let mut events = source(script);
        let mut out = Vec::new();

        assert_eq!(events.read_line(&mut out).unwrap(), LineRead::Line("GET".into()));
        assert!(String::from_utf8_lossy(&out).contains(">>>"));
    }

    #[test]
    fn test_read_line_cancel_and_eof() {
        let mut events = source(vec![Event::Key(KeyEvent::ctrl('c')), Event::Key(KeyEvent::ctrl('d'))]);
        let mut out = Vec::new();
        assert_eq!(events.read_line(&mut out).unwrap(), LineRead::Cancelled);
        assert_eq!(events.read_line(&mut out).unwrap(), LineRead::Eof);
        // Nothing left: shutdown cancels
        assert_eq!(events.read_line(&mut out).unwrap(), LineRead::Cancelled);
    }

    #[test]
    fn test_typed_prompts_keep_separate_history() {
        let mut script = ScriptedBackend::keys("http://localhost/ping");
        script.push(key(KeyCode::Enter));
        script.extend(ScriptedBackend::keys("POST"));
        script.push(key(KeyCode::Enter));
        let mut events = source(script);
        let mut out = Vec::new();

        assert_eq!(
            events.read_line_typed(PromptKind::Url, &mut out).unwrap(),
            LineRead::Line("http://localhost/ping".into())
        );
        assert_eq!(
            events.read_line_typed(PromptKind::Method, &mut out).unwrap(),
            LineRead::Line("POST".into())
        );
        assert_eq!(events.prompts().editor(PromptKind::Url).history(), ["http://localhost/ping"]);
        assert_eq!(events.prompts().editor(PromptKind::Method).history(), ["POST"]);
        assert!(events.prompts().editor(PromptKind::Body).history().is_empty());
    }

    #[test]
    fn test_resize_during_prompt_is_deferred() {
        let mut script = ScriptedBackend::keys("a");
        script.push(Event::Resize(70, 20));
        script.push(key(KeyCode::Enter));
        let mut events = source(script);
        let mut out = Vec::new();

        assert_eq!(events.read_line(&mut out).unwrap(), LineRead::Line("a".into()));
        assert_eq!(events.poll().unwrap(), Some(Event::Resize(70, 20)));
    }
}
