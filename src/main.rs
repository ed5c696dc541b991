//! mooze - Yet another REST api test tool for command-line users
//!
//! This binary drives the terminal core: it draws a request window and a
//! key binding window, and reads the request's URL, method and body at
//! labeled prompts.
//!
//! # Quick Start
//!
//! ```text
//! mooze                  # Full-screen mode
//! mooze --plain          # Line mode, no terminal control
//! mooze --config FILE    # Use another config file
//! ```
//!
//! # Keys
//!
//! | Key | Action |
//! |-----|--------|
//! | u | Edit URL |
//! | m | Edit method |
//! | b | Edit body |
//! | r | Refresh screen |
//! | q / Ctrl+C | Quit |

use std::env;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Stdout, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use mooze::config::Config;
use mooze::core::Style;
use mooze::ui::{Event, EventSource, KeyCode, LineRead, Modifiers, PromptKind, Renderer, ShutdownSignal, Window};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

const TITLE: &str = "Mooze: Yet another REST api test tool for command-line users";

/// Width used when rendering windows as plain text
const PLAIN_WIDTH: u16 = 72;

/// Command line options
#[derive(Default)]
struct Args {
    plain: bool,
    config_path: Option<PathBuf>,
}

fn print_version() {
    eprintln!("mooze {}", VERSION);
}

fn print_help() {
    eprintln!("mooze {} - Yet another REST api test tool for command-line users", VERSION);
    eprintln!();
    eprintln!("Usage: mooze [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -p, --plain           Line mode without full-screen terminal control");
    eprintln!("  -c, --config <FILE>   Read configuration from FILE");
    eprintln!("  -h, --help            Show this help");
    eprintln!("  -v, --version         Show version");
    eprintln!();
    eprintln!("Configuration: ~/.mooze/config.toml");
    eprintln!("Log file:      ~/.mooze/mooze.log (RUST_LOG overrides log_level)");
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-p" | "--plain" => {
                parsed.plain = true;
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing config file argument".to_string());
                }
                parsed.config_path = Some(PathBuf::from(&args[i]));
            }
            arg => {
                return Err(format!("Unknown option: {}", arg));
            }
        }
        i += 1;
    }

    Ok(parsed)
}

fn init_logging(config: &Config) {
    let log_path = Config::log_path().unwrap_or_else(|| PathBuf::from("mooze.log"));

    // Create log directory if needed
    if let Some(parent) = log_path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// The request being edited
#[derive(Default)]
struct Request {
    url: String,
    method: String,
    body: String,
}

impl Request {
    fn set(&mut self, kind: PromptKind, value: String) {
        match kind {
            PromptKind::Url => self.url = value,
            PromptKind::Method => self.method = value.to_uppercase(),
            PromptKind::Body => self.body = value,
            PromptKind::Command => {}
        }
    }

    fn lines(&self) -> Vec<String> {
        vec![
            format!("URL:    {}", self.url),
            format!("Method: {}", self.method),
            format!("Body:   {}", self.body),
        ]
    }
}

/// Prompt opened by a key, if any.
fn prompt_for_key(ch: char) -> Option<PromptKind> {
    match ch {
        'u' => Some(PromptKind::Url),
        'm' => Some(PromptKind::Method),
        'b' => Some(PromptKind::Body),
        _ => None,
    }
}

fn key_bindings() -> Vec<String> {
    vec![
        "Request".to_string(),
        "  (u)rl   (m)ethod   (b)ody".to_string(),
        "Operations".to_string(),
        "  (r)efresh screen   (q)uit".to_string(),
    ]
}

/// Lay out the request and key binding windows for a screen size.
fn layout(config: &Config, request: &Request, width: u16) -> [Window; 2] {
    let border = config.border();
    [
        Window::new(0, 0, 5, width)
            .with_title("Request")
            .with_content(request.lines())
            .with_border(border),
        Window::new(5, 0, 6, width)
            .with_title(TITLE)
            .with_content(key_bindings())
            .with_border(border),
    ]
}

fn draw<W: Write>(renderer: &mut Renderer<W>, config: &Config, request: &Request) -> mooze::Result<()> {
    let (width, _) = renderer.screen().dimensions();
    let style = config.window_style();
    renderer.clear();
    for window in layout(config, request, width) {
        renderer.render_window(&window, style);
    }
    renderer.show()
}

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    let config = match &args.config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    init_logging(&config);
    info!("mooze {} starting", VERSION);

    if args.plain {
        return run_plain(&config);
    }

    match Renderer::open(&config) {
        Ok(renderer) => {
            // Plain mode keeps the default signal actions
            let shutdown = ShutdownSignal::install()?;
            run_interactive(renderer, &config, shutdown)
        }
        Err(e) if e.is_recoverable() => {
            warn!("{}; falling back to plain mode", e);
            eprintln!("No terminal available, using plain mode");
            run_plain(&config)
        }
        Err(e) => Err(e.into()),
    }
}

fn run_interactive(mut renderer: Renderer<Stdout>, config: &Config, shutdown: ShutdownSignal) -> anyhow::Result<()> {
    let mut events = EventSource::terminal(shutdown).with_tick(config.poll_interval());
    let mut request = Request::default();

    renderer.hide_cursor()?;
    draw(&mut renderer, config, &request)?;

    while let Some(event) = events.poll()? {
        match event {
            Event::Key(key) if key.is_ctrl('c') => break,
            Event::Key(key) if key.modifiers.contains(Modifiers::CTRL) => {}
            Event::Key(key) => match key.code {
                KeyCode::Char('q') => break,
                KeyCode::Char('r') => renderer.reload()?,
                KeyCode::Char(ch) => {
                    let Some(kind) = prompt_for_key(ch) else {
                        continue;
                    };
                    let (_, height) = renderer.screen().dimensions();
                    renderer.move_to(height, 1)?;
                    renderer.show_cursor()?;
                    let read = events.read_line_typed(kind, renderer.writer())?;
                    renderer.clear_line()?;
                    renderer.hide_cursor()?;

                    match read {
                        LineRead::Line(line) => request.set(kind, line),
                        LineRead::Cancelled => {}
                        LineRead::Eof => break,
                    }
                    draw(&mut renderer, config, &request)?;
                    renderer.sync()?;
                }
                _ => {}
            },
            Event::Resize(width, height) => {
                renderer.handle_resize(width, height)?;
                draw(&mut renderer, config, &request)?;
            }
            Event::Mouse(_) => {}
        }
    }

    info!("mooze exiting");
    renderer.finish()?;
    Ok(())
}

/// Line mode: windows are rendered to text and commands read from stdin.
///
/// SIGINT and SIGTERM end the process with their default action.
fn run_plain(config: &Config) -> anyhow::Result<()> {
    let mut request = Request::default();
    let mut stdout = io::stdout();
    print_plain(&mut stdout, config, &request)?;
    writeln!(stdout, "Commands: u <url>, m <method>, b <body>, q")?;
    stdout.flush()?;

    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        let (cmd, value) = line.split_once(' ').unwrap_or((line, ""));

        match cmd {
            "" => continue,
            "q" | "quit" => break,
            "r" => {}
            _ => {
                let kind = cmd
                    .chars()
                    .next()
                    .filter(|_| cmd.len() == 1)
                    .and_then(prompt_for_key)
                    .unwrap_or_else(|| PromptKind::from_name(cmd));
                if kind == PromptKind::Command {
                    writeln!(stdout, "Unknown command: {}", cmd)?;
                    continue;
                }
                request.set(kind, value.trim().to_string());
            }
        }
        print_plain(&mut stdout, config, &request)?;
        stdout.flush()?;
    }

    info!("mooze exiting (plain mode)");
    Ok(())
}

fn print_plain<W: Write>(out: &mut W, config: &Config, request: &Request) -> anyhow::Result<()> {
    let mut renderer = Renderer::headless(io::sink(), PLAIN_WIDTH, 11);
    let style = Style::default();
    for window in layout(config, request, PLAIN_WIDTH) {
        renderer.render_window(&window, style);
    }
    writeln!(out, "{}", renderer.snapshot())?;
    Ok(())
}
