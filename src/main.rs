use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use meeting_notes::handler::handle_event;
use meeting_notes::tui::{self, EventHandler, Tui};
use meeting_notes::{speech, ui, App, Config, HttpBackend};

#[derive(Parser)]
#[command(name = "meeting-notes")]
#[command(about = "Analyze meeting notes, transcribe recordings and ask questions about a meeting")]
struct Cli {
    /// Base URL of the analysis backend (overrides config and environment)
    #[arg(long)]
    backend_url: Option<String>,

    /// Config file to read and write
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log file (the terminal is taken by the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = init_logging(cli.log_file.as_deref())?;

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load_from(&config_path).unwrap_or_else(|e| {
        tracing::warn!(path = %config_path.display(), error = %e, "ignoring unreadable config");
        Config::new()
    });

    let backend_url = cli.backend_url.unwrap_or_else(|| config.backend_url());
    let backend = HttpBackend::new(&backend_url, config.request_timeout())?;
    let speech = speech::detect(&config);
    tracing::info!(
        backend = %backend_url,
        speech = speech.is_some(),
        log = %log_path.display(),
        "starting"
    );

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(&config, Some(config_path), Arc::new(backend), speech, events.sender());

    let result = run(&mut terminal, &mut app, &mut events).await;
    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;
        match events.next().await {
            Some(event) => handle_event(app, event),
            None => break,
        }
    }
    app.stop_listening();
    Ok(())
}

fn init_logging(path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => dirs::cache_dir()
            .ok_or_else(|| anyhow!("Could not determine cache directory"))?
            .join("meeting-notes")
            .join("meeting-notes.log"),
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("meeting_notes=info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(path)
}
