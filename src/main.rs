// ABOUTME: Entry point for the MSSQL Manager terminal application
// ABOUTME: Sets up logging and settings, starts the database worker, and runs the UI

use std::fs::{self, OpenOptions};
use std::io::{self, Stdout};

use anyhow::{Context, Result};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::LevelFilter;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use mssql_manager_lib::config::{self, Settings};
use mssql_manager_lib::ui::{worker, App};

fn main() -> Result<()> {
    init_logging();
    log::info!("Starting MSSQL Manager {}", env!("CARGO_PKG_VERSION"));

    let settings_path = Settings::settings_path()
        .map_err(|e| log::warn!("Settings will not be saved: {}", e))
        .ok();
    let settings = match settings_path.as_deref().map(Settings::load_from) {
        Some(Ok(settings)) => settings,
        Some(Err(e)) => {
            log::warn!("Using default settings: {}", e);
            Settings::default()
        }
        None => Settings::default(),
    };

    let rt = Runtime::new().context("failed to initialize tokio runtime")?;
    let (requests_tx, requests_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let worker = worker::spawn(rt.handle(), requests_rx, events_tx);

    let mut terminal =
        init_terminal().context("failed to initialize terminal; are you running in a real TTY?")?;

    let mut app = App::new(settings, settings_path, requests_tx, events_rx);
    let res = app.run(&mut terminal);

    restore_terminal(terminal)?;

    // Dropping the app closes the request channel; the worker then closes its connection
    drop(app);
    if let Err(e) = rt.block_on(worker) {
        log::warn!("Database worker ended abnormally: {}", e);
    }
    log::info!("MSSQL Manager stopped");

    res
}

/// Log to a file; the terminal belongs to the UI. `RUST_LOG` overrides the default level.
fn init_logging() {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info).parse_default_env();

    match open_log_file() {
        Ok(file) => {
            builder
                .target(env_logger::Target::Pipe(Box::new(file)))
                .write_style(env_logger::WriteStyle::Never);
        }
        Err(_) => {
            builder.filter_level(LevelFilter::Off);
        }
    }

    let _ = builder.try_init();
}

fn open_log_file() -> Result<fs::File> {
    let path = config::log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok(file)
}

fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
