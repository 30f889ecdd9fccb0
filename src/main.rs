//! ChatLedger - AI chat with usage accounting
//!
//! Main entry point for the ChatLedger CLI.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatledger::cli::{Cli, Commands};
use chatledger::commands;
use chatledger::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    // If the user supplied a database path on the CLI, mirror it into
    // CHATLEDGER_DB so the storage initializer can pick it up. This keeps
    // callers unchanged while allowing `SqliteStorage::new()` to honor an
    // override.
    if let Some(db_path) = &cli.db {
        std::env::set_var("CHATLEDGER_DB", db_path);
        tracing::info!("Using database override from CLI: {}", db_path);
    }

    // Load configuration
    let config_path = cli.config.clone().unwrap_or_else(|| "config/config.yaml".to_string());
    let config = Config::load(&config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::New {
            title,
            preset,
            system_prompt,
        } => {
            tracing::info!("Creating new conversation");
            commands::chat::run_new(config, title, preset, system_prompt)?;
            Ok(())
        }
        Commands::Send {
            conversation,
            preset,
            message,
        } => {
            tracing::info!("Sending chat message");
            if let Some(id) = &conversation {
                tracing::debug!("Continuing conversation: {}", id);
            }
            commands::chat::run_send(config, conversation, preset, message).await?;
            Ok(())
        }
        Commands::History { command } => {
            tracing::info!("Starting history command");
            let principal = config.principal()?;
            commands::history::handle_history(&principal, command)?;
            Ok(())
        }
        Commands::Usage => {
            tracing::info!("Starting usage command");
            let principal = config.principal()?;
            commands::usage::show_usage(&principal).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "chatledger=debug"
    } else {
        "chatledger=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
