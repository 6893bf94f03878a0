//! bbsterm - demo board for the terminal I/O engine
//!
//! Runs a short scripted BBS session on the console: a banner, a typed
//! greeting, a few prompts, and chat/broadcast notices that arrive while you
//! type.
//!
//! # Quick Start
//!
//! ```text
//! bbsterm                      # Scripted session with typing simulation
//! bbsterm --no-slow            # Print everything instantly
//! bbsterm --scheme dracula     # Pick a color scheme
//! bbsterm --export out.html    # Save the session as HTML on exit
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use crossterm::event::{self, Event, KeyEvent};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use bbsterm::ui::{ConsoleSink, KeyMapper};
use bbsterm::{ColorScheme, Config, NoticeFeed, Terminal};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Class scoping the exported stylesheet
const EXPORT_ROOT: &str = "bbsterm";

const BANNER: &str = r#"<pre class="art">
 ___  ___  ___ _____ ___ ___ __  __
| _ )| _ )/ __|_   _| __| _ \  \/  |
| _ \| _ \\__ \ | | | _||   / |\/| |
|___/|___/|___/ |_| |___|_|_\_|  |_|
</pre>"#;

/// Frames pushed by the fake server, with the pause before each
const DEMO_NOTICES: &[(u64, &str)] = &[
    (3, r#"{"type":"broadcast","message":"Welcome to the demo board"}"#),
    (4, r#"{"type":"chat","from":"sysop","message":"type your name, I'll wait"}"#),
    (6, r#"{"type":"challenge","from":"mallory","game":"tic-tac-toe"}"#),
    (8, r#"{"type":"broadcast","message":"Board closes in 1 minute"}"#),
];

/// Command line options
#[derive(Debug, Default)]
struct Args {
    no_slow: bool,
    speed_ms: Option<u64>,
    scheme: Option<String>,
    export: Option<PathBuf>,
}

fn print_version() {
    eprintln!("bbsterm {}", VERSION);
}

fn print_help() {
    eprintln!("bbsterm {} - Terminal I/O engine demo board", VERSION);
    eprintln!();
    eprintln!("Usage: bbsterm [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --no-slow             Disable typing simulation");
    eprintln!("  --speed <MS>          Pause between typed characters");
    eprintln!("  --scheme <NAME>       Color scheme");
    eprintln!("  --export <PATH>       Write the session as HTML on exit");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Keys:");
    eprintln!("  Enter                 Submit the line");
    eprintln!("  Backspace             Erase the last character");
    eprintln!("  Space                 Continue at \"press any key\" prompts");
    eprintln!("  Ctrl+C                Quit");
    eprintln!();
    eprintln!("Configuration: ~/.bbsterm/config.toml");
    eprintln!("Log file:      ~/.bbsterm/bbsterm.log");
    eprintln!();
    eprintln!("Color schemes: {}", ColorScheme::list().join(", "));
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
            "--no-slow" => {
                parsed.no_slow = true;
            }
            "--speed" => {
                i += 1;
                let value = args.get(i).ok_or("Missing --speed argument")?;
                let ms = value
                    .parse()
                    .map_err(|_| format!("Invalid --speed value: {}", value))?;
                parsed.speed_ms = Some(ms);
            }
            "--scheme" => {
                i += 1;
                let name = args.get(i).ok_or("Missing --scheme argument")?;
                if !ColorScheme::list().contains(&name.to_lowercase().as_str()) {
                    return Err(format!(
                        "Unknown color scheme: {}. Available: {}",
                        name,
                        ColorScheme::list().join(", ")
                    ));
                }
                parsed.scheme = Some(name.clone());
            }
            "--export" => {
                i += 1;
                let path = args.get(i).ok_or("Missing --export argument")?;
                parsed.export = Some(PathBuf::from(path));
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(parsed)
}

fn init_logging(config: &Config) {
    let log_path = config.log_path();
    if let Some(parent) = log_path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut config = Config::load();
    if args.no_slow {
        config.typing.simulate_speed = false;
    }
    if let Some(ms) = args.speed_ms {
        config.typing.speed_ms = ms;
    }
    if let Some(scheme) = &args.scheme {
        config.color_scheme = scheme.clone();
    }

    init_logging(&config);
    info!("bbsterm {} starting...", VERSION);

    let scheme = config.get_color_scheme();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;
    let result = runtime.block_on(run(&config, scheme.clone()));
    // Dropping the runtime drops every terminal handle, which restores the
    // console before anything else is printed.
    drop(runtime);

    let rendered = result?;
    if let Some(path) = &args.export {
        export_html(path, &scheme, &rendered)?;
        eprintln!("Session exported to {}", path.display());
    }

    info!("bbsterm exiting");
    Ok(())
}

/// Run the session; returns the rendered log
async fn run(config: &Config, scheme: ColorScheme) -> anyhow::Result<String> {
    let mut console = ConsoleSink::stdout(scheme);
    console.init().context("Failed to initialize console")?;
    let terminal = Terminal::with_config(console, config.typing);

    let (key_tx, key_rx) = mpsc::channel(64);
    spawn_key_reader(key_tx);
    let (quit_tx, quit_rx) = oneshot::channel();
    tokio::spawn(forward_keys(terminal.clone(), key_rx, quit_tx));

    let (notice_tx, notice_rx) = mpsc::channel(16);
    tokio::spawn(NoticeFeed::new(terminal.clone()).run(notice_rx));
    tokio::spawn(demo_server(notice_tx));

    tokio::select! {
        result = script(&terminal) => result?,
        _ = quit_rx => info!("Interrupted"),
    }

    Ok(terminal.rendered())
}

/// Read console events on a dedicated thread; crossterm's reader blocks.
fn spawn_key_reader(tx: mpsc::Sender<KeyEvent>) {
    std::thread::spawn(move || loop {
        match event::read() {
            Ok(Event::Key(key)) => {
                if tx.blocking_send(key).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Failed to read console event: {}", e);
                break;
            }
        }
    });
}

async fn forward_keys(terminal: Terminal, mut keys: mpsc::Receiver<KeyEvent>, quit: oneshot::Sender<()>) {
    while let Some(event) = keys.recv().await {
        if KeyMapper::is_interrupt(&event) {
            break;
        }
        if let Some(key) = KeyMapper::map(&event) {
            let outcome = terminal.press_key(key);
            tracing::trace!("Key {:?} -> {:?}", key, outcome);
        }
    }
    let _ = quit.send(());
}

/// Stand-in for the game server's notice stream
async fn demo_server(frames: mpsc::Sender<String>) {
    for (pause, frame) in DEMO_NOTICES {
        tokio::time::sleep(Duration::from_secs(*pause)).await;
        if frames.send(frame.to_string()).await.is_err() {
            return;
        }
    }
}

async fn script(term: &Terminal) -> bbsterm::Result<()> {
    term.print_raw_markup(BANNER);
    term.println_slow("\x1b[1;32mWelcome to the bbsterm demo board.\x1b[0m", None)
        .await;
    term.println_slow("Notices may arrive while you type; your line stays intact.", None)
        .await;
    term.println("");

    let name = term.request_line(Some("\x1b[1mYour name:\x1b[0m ")).await?;
    let name = match name.trim() {
        "" => "stranger",
        trimmed => trimmed,
    };
    term.println_slow(&format!("Hello, \x1b[1;36m{}\x1b[0m!", name), None)
        .await;

    let game = term
        .request_line_timeout(
            Some("Pick a game \x1b[33m[chess/go]\x1b[0m (20s): "),
            Duration::from_secs(20),
        )
        .await?;
    match game.trim().to_lowercase().as_str() {
        "" => term.println("\x1b[90mToo slow! Maybe next time.\x1b[0m"),
        "chess" | "go" => term.println(&format!("\x1b[32mQueued for {}.\x1b[0m", game.trim())),
        other => term.println_plain(&format!("No such game: {}", other)),
    }

    term.print("\x1b[1mPress SPACE to continue\x1b[0m");
    term.request_line(None).await?;

    term.clear();
    term.println_slow("\x1b[1;35mGoodbye!\x1b[0m", Some(40)).await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    Ok(())
}

fn export_html(path: &Path, scheme: &ColorScheme, rendered: &str) -> anyhow::Result<()> {
    let page = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>bbsterm session</title>\n<style>\n{}</style>\n</head>\n\
         <body>\n<div class=\"{}\">{}</div>\n</body>\n</html>\n",
        scheme.stylesheet(EXPORT_ROOT),
        EXPORT_ROOT,
        rendered
    );
    fs::write(path, page).with_context(|| format!("Failed to write {}", path.display()))
}
