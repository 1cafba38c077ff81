use std::fs::{self, OpenOptions};
use std::sync::{Arc, Mutex};
use anyhow::Result;
use clap::{ArgAction, Parser};
use tracing::{info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

mod app;
mod chat;
mod clipboard;
mod config;
mod handler;
mod markdown;
mod state;
mod tui;
mod ui;

use app::App;
use chat::ChatClient;
use config::Config;
use tui::{EventHandler, Tui};

#[derive(Parser, Debug)]
#[command(name = "local-chat", version, about = "Chat with a local LLM endpoint from the terminal")]
struct Cli {
    /// Chat endpoint URL (POST {"message": ...} -> {"reply": ...})
    #[arg(long, env = "LOCAL_CHAT_ENDPOINT")]
    endpoint: Option<String>,

    /// Request timeout in seconds (default: no timeout)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Write the resolved endpoint and timeout to the config file
    #[arg(long)]
    save_config: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let file_config = Config::load().unwrap_or_else(|e| {
        warn!("ignoring unreadable config: {:#}", e);
        Config::default()
    });
    let config = file_config.merged(cli.endpoint, cli.timeout);
    let settings = config.settings()?;

    if cli.save_config {
        config.save()?;
        info!(path = %Config::get_config_path()?.display(), "config saved");
    }

    let client = ChatClient::new(&settings.endpoint, settings.timeout)?;
    info!(endpoint = %client.endpoint(), timeout = ?settings.timeout, "starting local-chat");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, client).await;
    tui::restore()?;

    result
}

async fn run(terminal: &mut Tui, client: ChatClient) -> Result<()> {
    let mut events = EventHandler::new();
    let endpoint = client.endpoint().to_string();
    let mut app = App::new(Arc::new(client), events.sender(), endpoint);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event),
            None => break,
        }
    }

    app.shutdown();
    Ok(())
}

/// Log to a file: stderr belongs to the TUI.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let Some(log_dir) = dirs::cache_dir().map(|dir| dir.join("local-chat")) else {
        return;
    };
    if fs::create_dir_all(&log_dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("local-chat.log"))
    else {
        return;
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(filter)
        .init();
}
