use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use riskdash::config::Config;
use riskdash::credentials::SqliteCredentialStore;
use riskdash::dashboard::{Command, DashboardController, DashboardRuntime, Outcome, HELP};
use riskdash::output::{OutputFormat, OutputHandler};
use riskdash::scoring::ScoringClient;
use riskdash::session::SessionGate;

enum Event {
    Line(std::io::Result<Option<String>>),
    Fetched(bool),
    Interrupt,
}

/// Interactive risk dashboard driven by commands on stdin
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    log::info!("Starting risk dashboard...");

    // Load configuration
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = if config_path.exists() {
        Config::from_file(&config_path)?
    } else {
        log::warn!("Config file not found, using defaults");
        Config::default()
    };

    let store = Arc::new(SqliteCredentialStore::new(&config.session.store_path)?);
    let session = SessionGate::new(store, config.session.marker_key.clone());
    let controller = DashboardController::new(session, config.view_defaults()?);
    let client = ScoringClient::new(&config.backend.base_url, config.request_timeout())?;
    log::info!("Scoring endpoint: {}", client.endpoint());
    log::info!("Available models: {}", config.view.models.join(", "));

    let mut output = OutputHandler::new(
        OutputFormat::from_str(&config.output.format),
        config.output.file_path.clone(),
    )?;

    let mut runtime = DashboardRuntime::new(controller, Arc::new(client));
    runtime.start();
    output.write_view(&runtime.controller().view())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let event = tokio::select! {
            line = lines.next_line() => Event::Line(line),
            applied = runtime.next_completion() => Event::Fetched(applied),
            _ = tokio::signal::ctrl_c() => Event::Interrupt,
        };

        match event {
            Event::Interrupt => {
                log::info!("Received shutdown signal, stopping...");
                break;
            }
            Event::Fetched(applied) => {
                if applied {
                    output.write_view(&runtime.controller().view())?;
                }
            }
            Event::Line(Ok(None)) => break,
            Event::Line(Err(e)) => {
                log::error!("Error reading stdin: {}", e);
                break;
            }
            Event::Line(Ok(Some(line))) => {
                if line.trim().is_empty() {
                    continue;
                }

                let command = match line.parse::<Command>() {
                    Ok(command) => command,
                    Err(e) => {
                        output.write_line(&format!("{} (type 'help')", e))?;
                        continue;
                    }
                };

                match runtime.handle(command) {
                    Ok(Outcome::Quit) => break,
                    Ok(Outcome::Help) => output.write_line(HELP)?,
                    Ok(Outcome::Render) => output.write_view(&runtime.controller().view())?,
                    Err(e) => output.write_line(&format!("Error: {}", e))?,
                }
            }
        }
    }

    output.flush()?;
    log::info!("Risk dashboard stopped");
    Ok(())
}
