// main.rs for quakemap: earthquake and plate boundary map in the terminal
mod app;
mod config;
mod event;
mod export;
mod feeds;
mod layers;
mod style;
mod ui;
mod viewport;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::fs;
use std::io::{self, Stdout};
use std::sync::Mutex;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::config::{Command, Config, USAGE};
use crate::event::{Event, EventHandler};

type Tui = Terminal<CrosstermBackend<Stdout>>;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = match Config::from_args(&args, |key| std::env::var(key).ok())? {
        Command::Run(config) => config,
        Command::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
    };

    if config.export.is_some() {
        init_logging(None)?;
        return export::run(&config);
    }

    init_logging(Some(&config))?;
    info!(quakes = %config.quakes, plates = %config.plates, "starting interactive map");

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &config);
    restore_terminal(&mut terminal)?;
    result
}

/// Logs to stderr, or to the configured log file while the TUI owns the screen.
fn init_logging(tui: Option<&Config>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match tui {
        Some(config) => {
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .with_context(|| format!("failed to open log file {}", config.log_file.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(io::stderr).try_init(),
    }
    .map_err(|e| anyhow::anyhow!("failed to initialise logging: {}", e))
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("failed to create terminal")
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

fn run_app(terminal: &mut Tui, config: &Config) -> Result<()> {
    let mut app = App::new(config.viewport());
    let events = EventHandler::new(config.tick_rate);
    event::spawn_feed_loader(
        config.quakes.clone(),
        config.plates.clone(),
        config.timeout,
        events.sender(),
    );

    while !app.should_quit {
        terminal
            .draw(|frame| ui::render(frame, &app))
            .context("failed to draw frame")?;

        let Some(event) = events
            .next(config.tick_rate)
            .context("event channel closed")?
        else {
            continue;
        };
        match event {
            Event::Tick | Event::Resize => {}
            Event::Input(key) => app.handle_key(key),
            Event::Mouse(mouse) => app.handle_mouse(mouse),
            Event::Feed(feed) => app.apply_feed(feed),
        }

        if app.take_reload_request() {
            debug!("spawning feed loader");
            event::spawn_feed_loader(
                config.quakes.clone(),
                config.plates.clone(),
                config.timeout,
                events.sender(),
            );
        }
    }

    info!("quitting");
    Ok(())
}
