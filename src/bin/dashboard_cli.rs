use std::path::PathBuf;
use std::sync::Arc;
use structopt::StructOpt;

use riskdash::config::Config;
use riskdash::credentials::SqliteCredentialStore;
use riskdash::dashboard::{DashboardController, DashboardRuntime};
use riskdash::models::{Filter, SortKey};
use riskdash::output::{OutputFormat, OutputHandler};
use riskdash::scoring::ScoringClient;
use riskdash::session::SessionGate;

/// Risk dashboard command line interface
#[derive(StructOpt, Debug)]
#[structopt(name = "riskdash", about = "Risk score dashboard CLI")]
pub enum Cli {
    /// Generate a default configuration file
    Config {
        /// Output path for the configuration file
        #[structopt(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
    /// Log in with the admin password
    Login {
        #[structopt(short, long, default_value = "config.toml")]
        config: PathBuf,
        /// Admin password
        #[structopt(short, long)]
        password: String,
    },
    /// Log out and forget the session
    Logout {
        #[structopt(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
    /// Show whether a session is active
    Status {
        #[structopt(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
    /// Fetch scores once and render the dashboard
    Show {
        #[structopt(short, long, default_value = "config.toml")]
        config: PathBuf,
        /// Scoring model (defaults to the configured one)
        #[structopt(short, long)]
        model: Option<String>,
        /// all | normal | risk | "high risk" | suspicious
        #[structopt(short, long)]
        filter: Option<Filter>,
        /// id | score
        #[structopt(short, long)]
        sort: Option<SortKey>,
        /// Show the trend for this record id
        #[structopt(long)]
        select: Option<String>,
        /// console | json | jsonl (defaults to the configured one)
        #[structopt(long)]
        format: Option<String>,
    },
}

fn load_config(path: &PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
    if path.exists() {
        Ok(Config::from_file(path)?)
    } else {
        log::warn!("Config file not found, using defaults");
        Ok(Config::default())
    }
}

fn open_session(config: &Config) -> Result<SessionGate, Box<dyn std::error::Error>> {
    let store = Arc::new(SqliteCredentialStore::new(&config.session.store_path)?);
    Ok(SessionGate::new(store, config.session.marker_key.clone()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("warn"));

    let cli = Cli::from_args();

    match cli {
        Cli::Config { output } => {
            let config = Config::default();
            config.to_file(&output)?;
            println!("Default configuration written to: {:?}", output);
        }
        Cli::Login { config, password } => {
            let config = load_config(&config)?;
            let mut session = open_session(&config)?;
            match session.login(&password) {
                Ok(()) => println!("Logged in"),
                Err(e) => {
                    eprintln!("Login failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Cli::Logout { config } => {
            let config = load_config(&config)?;
            open_session(&config)?.logout()?;
            println!("Logged out");
        }
        Cli::Status { config } => {
            let config = load_config(&config)?;
            if open_session(&config)?.is_authorized() {
                println!("Session active");
            } else {
                println!("Not logged in");
            }
        }
        Cli::Show { config, model, filter, sort, select, format } => {
            let config = load_config(&config)?;
            let session = open_session(&config)?;
            if !session.is_authorized() {
                eprintln!("Not logged in. Run 'riskdash login --password <password>' first");
                std::process::exit(1);
            }

            let mut defaults = config.view_defaults()?;
            if let Some(model) = model {
                defaults.model = model;
            }
            if let Some(filter) = filter {
                defaults.filter = filter;
            }
            if let Some(sort) = sort {
                defaults.sort_key = sort;
            }

            let client = ScoringClient::new(&config.backend.base_url, config.request_timeout())?;
            let controller = DashboardController::new(session, defaults);
            let mut runtime = DashboardRuntime::new(controller, Arc::new(client));

            let tokio_runtime = tokio::runtime::Runtime::new()?;
            tokio_runtime.block_on(async {
                runtime.start();
                runtime.settle().await;
            });

            if let Some(id) = select {
                if let Err(e) = runtime.handle(riskdash::dashboard::Command::Select(id)) {
                    eprintln!("{}", e);
                }
            }

            let format = format.unwrap_or_else(|| config.output.format.clone());
            let mut output = OutputHandler::new(
                OutputFormat::from_str(&format),
                config.output.file_path.clone(),
            )?;
            output.write_view(&runtime.controller().view())?;
            output.flush()?;
        }
    }

    Ok(())
}
