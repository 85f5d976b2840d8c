//! pastesync CLI
//!
//! Command-line client for a live paste-sharing service.

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pastesync_core::{Config, HttpPasteStore, PasteId};

mod commands;
mod editor;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "pastesync")]
#[command(about = "pastesync - view, follow and edit shared pastes live")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Paste service base URL (overrides config)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a paste once and print it
    #[command(alias = "show")]
    View {
        /// Paste id, path (/00001), query (?00001) or full URL
        id: String,
    },
    /// Print a paste and follow live updates until interrupted
    Watch {
        /// Paste id, path, query or full URL
        id: String,
    },
    /// Edit a paste in $EDITOR while staying subscribed
    Edit {
        /// Paste id, path, query or full URL
        id: String,
    },
    /// Create a new paste
    #[command(alias = "new")]
    Create {
        /// Paste body (read from stdin if not provided)
        #[arg(short, long)]
        text: Option<String>,
    },
    /// Show the audit history, newest first
    #[command(alias = "ls")]
    History,
    /// Retire a paste from the history
    #[command(alias = "rm")]
    Delete {
        /// Paste id
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (server_url, max_reconnect_attempts, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands work on the file itself, without overrides
    if let Commands::Config { command } = &cli.command {
        return match command.clone().unwrap_or(ConfigCommands::Show) {
            ConfigCommands::Show => commands::config::show(cli.config.as_ref(), &output),
            ConfigCommands::Set { key, value } => {
                commands::config::set(key, value, cli.config.as_ref(), &output)
            }
        };
    }

    let config = load_config(&cli)?;
    init_logging(&config);

    let store = HttpPasteStore::new(&config).context("Failed to create HTTP client")?;

    match cli.command {
        Commands::View { id } => commands::paste::view(&store, parse_id(&id)?, &output).await,
        Commands::Watch { id } => {
            commands::paste::watch(store, &config, parse_id(&id)?, &output).await
        }
        Commands::Edit { id } => {
            commands::paste::edit(store, &config, parse_id(&id)?, &output).await
        }
        Commands::Create { text } => commands::paste::create(&store, text, &output).await,
        Commands::History => commands::history::list(&store, &output).await,
        Commands::Delete { id, yes } => {
            commands::history::delete(&store, parse_id(&id)?, yes, &output).await
        }
        Commands::Config { .. } => Ok(()),
    }
}

/// Load config and apply command-line overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    if let Some(server) = &cli.server {
        config.server_url = server.trim_end_matches('/').to_string();
    }
    config.validate()?;
    Ok(config)
}

fn parse_id(input: &str) -> Result<PasteId> {
    PasteId::parse(input).with_context(|| format!("Invalid paste id: '{}'", input))
}

/// Initialize logging
///
/// Only logs if PASTESYNC_LOG is set. Logs go to config.log_file when set,
/// stderr otherwise, so they never mix with paste output on stdout.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("PASTESYNC_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "pastesync_core={},pastesync_cli={}",
        log_level, log_level
    ));

    match &config.log_file {
        Some(log_path) => {
            let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
                    return;
                }
            };
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();
            info!("Logging initialized to {:?}", log_path);
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
