//! The binary in line mode, driven through its stdin.

use std::env;
use std::fs;
use std::io::Write;
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

fn scratch_home(name: &str) -> PathBuf {
    let dir = env::temp_dir().join(format!("mooze-plain-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Start `mooze --plain` with stdin held open by the returned child.
fn spawn_plain(name: &str) -> Child {
    Command::new(env!("CARGO_BIN_EXE_mooze"))
        .arg("--plain")
        .env("HOME", scratch_home(name))
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap()
}

fn wait_exit(child: &mut Child, timeout: Duration) -> Option<ExitStatus> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Some(status) = child.try_wait().unwrap() {
            return Some(status);
        }
        thread::sleep(Duration::from_millis(20));
    }
    let _ = child.kill();
    let _ = child.wait();
    None
}

fn assert_signal_ends_waiting_process(name: &str, signal: Signal) {
    let mut child = spawn_plain(name);
    let _stdin = child.stdin.take();
    thread::sleep(Duration::from_millis(200));

    kill(Pid::from_raw(child.id() as i32), signal).unwrap();
    let status = wait_exit(&mut child, Duration::from_secs(5)).expect("still running after signal");
    assert_eq!(status.signal(), Some(signal as i32));
}

#[test]
fn test_sigint_ends_plain_mode_while_reading() {
    assert_signal_ends_waiting_process("int", Signal::SIGINT);
}

#[test]
fn test_sigterm_ends_plain_mode_while_reading() {
    assert_signal_ends_waiting_process("term", Signal::SIGTERM);
}

#[test]
fn test_quit_command_exits_cleanly() {
    let mut child = spawn_plain("quit");
    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(b"u /ping\nq\n").unwrap();

    let status = wait_exit(&mut child, Duration::from_secs(5)).expect("still running after q");
    assert!(status.success());
}
