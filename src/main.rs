//! sockterm - An interactive terminal session client
//!
//! sockterm connects to a remote shell session over a websocket, renders the
//! session output as plain text, and forwards keystrokes. The remote end owns
//! the PTY; this client is the thin interactive surface in front of it.
//!
//! # Quick Start
//!
//! ```text
//! sockterm                                 # Connect to the configured endpoint
//! sockterm -u ws://host:8090/terminal      # Connect to an explicit endpoint
//! ```
//!
//! # Local keybindings (everything else goes to the remote shell)
//!
//! | Key | Action |
//! |-----|--------|
//! | Ctrl+Shift+R | Start a new session |
//! | Ctrl+Shift+X | Close the session (asks the shell to exit) |
//! | Ctrl+Shift+L | Clear the local output buffer |
//! | Ctrl+Shift+C | Copy the output buffer to the clipboard |
//! | Ctrl+Shift+V | Paste from the clipboard |
//! | Ctrl+Shift+Plus / Minus | Adjust the font scale used for sizing |
//! | Ctrl+Shift+Q | Quit |

mod config;
mod core;
mod transport;
mod ui;

use std::env;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::core::session::{Geometry, Session};
use crate::transport::ws::WsConnector;
use crate::ui::{Encoded, InputEncoder, Modifiers, Renderer};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    eprintln!("sockterm {}", VERSION);
}

fn print_help() {
    eprintln!("sockterm {} - An interactive terminal session client", VERSION);
    eprintln!();
    eprintln!("Usage: sockterm [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -u, --url <URL>        Websocket endpoint of the session service");
    eprintln!("  -f, --font-size <PT>   Font size for cell geometry estimation");
    eprintln!("  -v, --version          Show version");
    eprintln!("  -h, --help             Show this help");
    eprintln!();
    eprintln!("Local keybindings (everything else is sent to the remote shell):");
    eprintln!("  Ctrl+Shift+R           Start a new session");
    eprintln!("  Ctrl+Shift+X           Close the session");
    eprintln!("  Ctrl+Shift+L           Clear the output buffer");
    eprintln!("  Ctrl+Shift+C           Copy output to the clipboard");
    eprintln!("  Ctrl+Shift+V           Paste from the clipboard");
    eprintln!("  Ctrl+Shift+Plus/Minus  Adjust the font scale used for sizing");
    eprintln!("  Ctrl+Shift+Q           Quit");
    eprintln!();
    eprintln!("Configuration: ~/.sockterm/config.toml");
}

fn parse_args(config: &mut Config) -> Result<(), String> {
    let args: Vec<String> = env::args().collect();
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
            "-u" | "--url" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing URL argument".to_string());
                }
                config.url = args[i].clone();
            }
            "-f" | "--font-size" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing font size argument".to_string());
                }
                config.font_size = args[i]
                    .parse()
                    .map_err(|_| format!("Invalid font size: {}", args[i]))?;
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(())
}

fn init_logging() {
    let Some(dir) = config::app_dir() else {
        return;
    };
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("sockterm.log"))
        .ok();

    if let Some(file) = log_file {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::INFO)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let mut config = Config::load();
    if let Err(e) = parse_args(&mut config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    init_logging();
    info!(url = %config.url, "sockterm starting");

    let mut renderer = Renderer::new(config.url.clone());
    renderer.init()?;

    let result = run(&config, &mut renderer);

    let _ = renderer.cleanup();
    let _ = terminal::disable_raw_mode();

    if let Err(ref e) = result {
        error!(error = %e, "exited with error");
        eprintln!("Error: {}", e);
    }
    info!("sockterm exiting");
    result
}

fn run(config: &Config, renderer: &mut Renderer) -> anyhow::Result<()> {
    let connector = WsConnector::new(config.url.clone());
    let mut session = Session::new(Box::new(connector), config.font_size, config.scrollback_lines);

    let now = Instant::now();
    if let Some(geometry) = host_geometry(config.font_size) {
        session.update_geometry(geometry, now);
    }
    if let Err(e) = session.connect(now) {
        // The session stays usable; Ctrl+Shift+R retries once the service is
        // reachable.
        warn!(error = %e, "initial connect failed");
    }

    run_main_loop(&mut session, renderer, config.font_size)
}

/// Main event loop
fn run_main_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    mut font_size: f64,
) -> anyhow::Result<()> {
    let poll_timeout = Duration::from_millis(10);

    loop {
        let now = Instant::now();
        session.poll_transport(now);
        session.tick(now);

        if session.take_dirty() {
            let idle = session.idle_warning().then(|| session.idle_remaining_secs());
            renderer.render(session.scrollback(), session.state(), idle)?;
        }

        if event::poll(poll_timeout)? {
            match event::read()? {
                Event::Key(key_event) => {
                    if key_event.kind != KeyEventKind::Press {
                        continue;
                    }
                    if !handle_key(session, &key_event, Instant::now(), &mut font_size)? {
                        break;
                    }
                }
                Event::Paste(text) => {
                    session.send_paste(InputEncoder::encode_paste(&text));
                }
                Event::Resize(cols, rows) => {
                    let geometry = estimate_geometry(cols, rows, font_size);
                    session.update_geometry(geometry, Instant::now());
                }
                _ => {}
            }
        }
    }

    Ok(())
}

/// Smallest and largest usable font scale for cell estimation.
const MIN_FONT_SIZE: f64 = 6.0;
const MAX_FONT_SIZE: f64 = 32.0;

/// Handle one key press. Returns false to quit.
fn handle_key(
    session: &mut Session,
    key: &KeyEvent,
    now: Instant,
    font_size: &mut f64,
) -> anyhow::Result<bool> {
    match InputEncoder::encode(key) {
        Encoded::Bytes(bytes) => session.send_bytes(&bytes),
        Encoded::Text(text) => session.send_text(&text),
        Encoded::Consumed => {}
        Encoded::PassThrough => {
            let mods = Modifiers::from(key.modifiers);
            if mods.contains(Modifiers::CTRL | Modifiers::SHIFT) {
                if let KeyCode::Char(ch) = key.code {
                    match ch.to_ascii_lowercase() {
                        'q' => return Ok(false),
                        'r' => {
                            if let Err(e) = session.reconnect(now) {
                                warn!(error = %e, "reconnect failed");
                            }
                        }
                        'x' => session.close(now),
                        'l' => session.clear_output(),
                        'c' => copy_to_clipboard(session),
                        'v' => paste_from_clipboard(session),
                        '+' | '=' => {
                            *font_size = (*font_size + 1.0).min(MAX_FONT_SIZE);
                            session.set_font_size(*font_size);
                        }
                        '-' | '_' => {
                            *font_size = (*font_size - 1.0).max(MIN_FONT_SIZE);
                            session.set_font_size(*font_size);
                        }
                        _ => {}
                    }
                }
            }
        }
    }
    Ok(true)
}

fn copy_to_clipboard(session: &Session) {
    let text = session.scrollback().text().to_string();
    match arboard::Clipboard::new() {
        Ok(mut clipboard) => {
            if let Err(e) = clipboard.set_text(text) {
                warn!(error = %e, "clipboard copy failed");
            }
        }
        Err(e) => warn!(error = %e, "clipboard unavailable"),
    }
}

fn paste_from_clipboard(session: &mut Session) {
    match arboard::Clipboard::new() {
        Ok(mut clipboard) => match clipboard.get_text() {
            Ok(text) => session.send_paste(&text),
            Err(e) => warn!(error = %e, "clipboard read failed"),
        },
        Err(e) => warn!(error = %e, "clipboard unavailable"),
    }
}

/// Drawable area of the host terminal for the current size in cells.
///
/// Inverse of the session's cell estimate, with half a cell of padding so the
/// cols/rows round-trip is stable against floor rounding.
fn estimate_geometry(cols: u16, rows: u16, font_size: f64) -> Geometry {
    Geometry {
        width: (cols as f64 + 0.5) * font_size * 0.6,
        height: (rows as f64 + 0.5) * font_size * 1.2,
    }
}

fn host_geometry(font_size: f64) -> Option<Geometry> {
    let (cols, rows) = terminal::size().ok()?;
    Some(estimate_geometry(cols, rows, font_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_geometry_round_trips_through_winsize() {
        for (cols, rows) in [(80u16, 24u16), (95, 23), (120, 40), (1, 1)] {
            let g = estimate_geometry(cols, rows, 14.0);
            let back_cols = (g.width / (14.0 * 0.6)).floor() as u16;
            let back_rows = (g.height / (14.0 * 1.2)).floor() as u16;
            assert_eq!((back_cols, back_rows), (cols, rows));
        }
    }
}
