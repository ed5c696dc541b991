//! Controlling terminal device
//!
//! The device is opened on its own file descriptor rather than through the
//! process's standard streams: stdin may be redirected while `/dev/tty` still
//! carries the user's keystrokes. Raw mode is a process-wide property of the
//! device, so the mode captured on entry is restored exactly once, at the
//! latest when the controller is dropped.

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::fd::AsRawFd;
use std::path::Path;

use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::termios::{self, SetArg, Termios};
use tracing::{debug, info, warn};

use super::error::{Result, TermError};
use super::text::decode_char;

const TTY_PATH: &str = "/dev/tty";

/// Owner of the terminal device and its line discipline.
pub struct TerminalController {
    tty: File,
    /// Mode captured by `enter_raw_mode`, present only while raw.
    saved_mode: Option<Termios>,
    nonblocking: bool,
}

impl TerminalController {
    /// Open the controlling terminal read-only.
    pub fn open() -> Result<Self> {
        Self::open_path(TTY_PATH)
    }

    /// Open a specific terminal device.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let tty = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(TermError::DeviceUnavailable)?;

        // Anything that opens but has no line discipline is not a terminal
        termios::tcgetattr(&tty).map_err(|e| TermError::DeviceUnavailable(io::Error::from(e)))?;

        debug!("Opened terminal device {}", path.display());
        Ok(Self::from_file(tty))
    }

    /// Wrap an already open terminal file (e.g. a pty slave).
    pub fn from_file(tty: File) -> Self {
        Self {
            tty,
            saved_mode: None,
            nonblocking: false,
        }
    }

    /// Disable line buffering and echo, remembering the previous mode.
    ///
    /// Calling this while already raw is a no-op so the originally saved
    /// mode is never overwritten by the raw one.
    pub fn enter_raw_mode(&mut self) -> Result<()> {
        if self.saved_mode.is_some() {
            return Ok(());
        }

        let original = termios::tcgetattr(&self.tty).map_err(TermError::ModeSwitchFailed)?;
        let mut raw = original.clone();
        termios::cfmakeraw(&mut raw);
        termios::tcsetattr(&self.tty, SetArg::TCSAFLUSH, &raw).map_err(TermError::ModeSwitchFailed)?;

        self.saved_mode = Some(original);
        info!("Entered raw mode");
        Ok(())
    }

    /// Restore the mode recorded by `enter_raw_mode`.
    pub fn exit_raw_mode(&mut self) -> Result<()> {
        let Some(original) = self.saved_mode.take() else {
            return Ok(());
        };
        termios::tcsetattr(&self.tty, SetArg::TCSAFLUSH, &original).map_err(TermError::ModeSwitchFailed)?;
        info!("Restored terminal mode");
        Ok(())
    }

    pub fn is_raw(&self) -> bool {
        self.saved_mode.is_some()
    }

    /// The mode that will be restored on exit, if raw.
    pub fn saved_mode(&self) -> Option<&Termios> {
        self.saved_mode.as_ref()
    }

    /// Read the device's current mode.
    pub fn current_mode(&self) -> Result<Termios> {
        termios::tcgetattr(&self.tty).map_err(TermError::ModeSwitchFailed)
    }

    /// Toggle whether reads return immediately when no input is pending.
    pub fn set_nonblocking(&mut self, on: bool) -> Result<()> {
        let fd = self.tty.as_raw_fd();
        let bits = fcntl(fd, FcntlArg::F_GETFL).map_err(TermError::ModeSwitchFailed)?;
        let mut flags = OFlag::from_bits_truncate(bits);
        flags.set(OFlag::O_NONBLOCK, on);
        fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(TermError::ModeSwitchFailed)?;
        self.nonblocking = on;
        Ok(())
    }

    pub fn is_nonblocking(&self) -> bool {
        self.nonblocking
    }

    /// Read whatever bytes are available.
    ///
    /// In non-blocking mode `Ok(0)` means "no input yet"; the caller owns any
    /// retry or backoff.
    ///
    /// A blocking read interrupted by a signal is retried, so `Ok(0)` there
    /// still means end of input.
    pub fn read_raw(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            match self.tty.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) => match ReadAction::for_error(e.kind(), self.nonblocking) {
                    ReadAction::Empty => return Ok(0),
                    ReadAction::Retry => continue,
                    ReadAction::Fail => return Err(TermError::ReadFailed(e)),
                },
            }
        }
    }

    /// Non-blocking single-character probe.
    ///
    /// Leaves the blocking state as it found it.
    pub fn probe_char(&mut self) -> Result<Option<char>> {
        let was_nonblocking = self.nonblocking;
        if !was_nonblocking {
            self.set_nonblocking(true)?;
        }
        let mut buf = [0u8; 4];
        let read = self.read_raw(&mut buf);
        if !was_nonblocking {
            self.set_nonblocking(false)?;
        }
        match read? {
            0 => Ok(None),
            n => Ok(decode_char(&buf[..n])),
        }
    }
}

/// What a failed `read` turns into.
#[derive(Debug, PartialEq, Eq)]
enum ReadAction {
    /// No input yet
    Empty,
    Retry,
    Fail,
}

impl ReadAction {
    fn for_error(kind: io::ErrorKind, nonblocking: bool) -> Self {
        match kind {
            io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted if nonblocking => ReadAction::Empty,
            io::ErrorKind::Interrupted => ReadAction::Retry,
            _ => ReadAction::Fail,
        }
    }
}

impl Drop for TerminalController {
    fn drop(&mut self) {
        if self.nonblocking {
            let _ = self.set_nonblocking(false);
        }
        // Session is ending regardless; a failed restore is only reported
        if let Err(e) = self.exit_raw_mode() {
            warn!("Failed to restore terminal mode on drop: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::pty::openpty;
    use nix::sys::termios::LocalFlags;
    use std::io::Write;
    use std::time::Duration;

    /// Controller on a pty slave plus the master end for injecting input.
    fn pty_controller() -> (TerminalController, File) {
        let pty = openpty(None, None).unwrap();
        (
            TerminalController::from_file(File::from(pty.slave)),
            File::from(pty.master),
        )
    }

    fn read_with_retry(ctl: &mut TerminalController, buf: &mut [u8]) -> usize {
        for _ in 0..100 {
            let n = ctl.read_raw(buf).unwrap();
            if n > 0 {
                return n;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        0
    }

    #[test]
    fn test_open_non_terminal_is_unavailable() {
        let err = TerminalController::open_path("/dev/null").err().unwrap();
        assert!(matches!(err, TermError::DeviceUnavailable(_)));
        assert!(err.is_recoverable());

        let err = TerminalController::open_path("/nonexistent/tty").err().unwrap();
        assert!(matches!(err, TermError::DeviceUnavailable(_)));
    }

    #[test]
    fn test_raw_mode_disables_echo_and_canonical() {
        let (mut ctl, _master) = pty_controller();
        ctl.enter_raw_mode().unwrap();
        assert!(ctl.is_raw());

        let raw = ctl.current_mode().unwrap();
        assert!(!raw.local_flags.contains(LocalFlags::ECHO));
        assert!(!raw.local_flags.contains(LocalFlags::ICANON));
    }

    #[test]
    fn test_raw_mode_restores_exact_mode() {
        let (mut ctl, _master) = pty_controller();
        let before = ctl.current_mode().unwrap();

        ctl.enter_raw_mode().unwrap();
        ctl.exit_raw_mode().unwrap();
        assert!(!ctl.is_raw());

        let after = ctl.current_mode().unwrap();
        assert_eq!(after.input_flags, before.input_flags);
        assert_eq!(after.output_flags, before.output_flags);
        assert_eq!(after.control_flags, before.control_flags);
        assert_eq!(after.local_flags, before.local_flags);
        assert_eq!(after.control_chars, before.control_chars);
    }

    #[test]
    fn test_enter_twice_keeps_original_mode() {
        let (mut ctl, _master) = pty_controller();
        let before = ctl.current_mode().unwrap();

        ctl.enter_raw_mode().unwrap();
        ctl.enter_raw_mode().unwrap();
        let saved = ctl.saved_mode().unwrap();
        assert_eq!(saved.local_flags, before.local_flags);

        ctl.exit_raw_mode().unwrap();
        // Second exit has nothing left to restore
        ctl.exit_raw_mode().unwrap();
        assert_eq!(ctl.current_mode().unwrap().local_flags, before.local_flags);
    }

    #[test]
    fn test_nonblocking_empty_read_is_zero() {
        let (mut ctl, _master) = pty_controller();
        ctl.enter_raw_mode().unwrap();
        ctl.set_nonblocking(true).unwrap();
        assert!(ctl.is_nonblocking());

        let mut buf = [0u8; 8];
        assert_eq!(ctl.read_raw(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_nonblocking_read_delivers_input() {
        let (mut ctl, mut master) = pty_controller();
        ctl.enter_raw_mode().unwrap();
        ctl.set_nonblocking(true).unwrap();

        master.write_all(b"x").unwrap();
        let mut buf = [0u8; 8];
        let n = read_with_retry(&mut ctl, &mut buf);
        assert_eq!(n, 1);
        assert_eq!(buf[0], b'x');
    }

    #[test]
    fn test_interrupted_blocking_read_is_retried() {
        use io::ErrorKind::{Interrupted, WouldBlock};
        assert_eq!(ReadAction::for_error(Interrupted, false), ReadAction::Retry);
        assert_eq!(ReadAction::for_error(Interrupted, true), ReadAction::Empty);
        assert_eq!(ReadAction::for_error(WouldBlock, true), ReadAction::Empty);
        assert_eq!(ReadAction::for_error(WouldBlock, false), ReadAction::Fail);
    }

    #[test]
    fn test_blocking_read_waits_for_input() {
        let (mut ctl, mut master) = pty_controller();
        ctl.enter_raw_mode().unwrap();
        master.write_all(b"ok").unwrap();

        let mut buf = [0u8; 8];
        let n = ctl.read_raw(&mut buf).unwrap();
        assert!(n > 0);
        assert_eq!(buf[0], b'o');
    }

    #[test]
    fn test_probe_char_restores_blocking() {
        let (mut ctl, mut master) = pty_controller();
        ctl.enter_raw_mode().unwrap();

        assert_eq!(ctl.probe_char().unwrap(), None);
        assert!(!ctl.is_nonblocking());

        master.write_all("한".as_bytes()).unwrap();
        let mut found = None;
        for _ in 0..100 {
            if let Some(ch) = ctl.probe_char().unwrap() {
                found = Some(ch);
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(found, Some('한'));
    }
}
