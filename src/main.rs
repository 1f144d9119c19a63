//! Polychat - multi-provider LLM chat CLI
//!
//! Binary entry point: initializes logging, loads configuration, and
//! dispatches to the selected command.

use polychat::cli::{parse_args, Commands, SessionCommands};
use polychat::commands;
use polychat::config::Config;
use polychat::error::Result;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "polychat=debug" } else { "polychat=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_args();
    init_tracing(cli.verbose);

    let config = Config::load(&cli.config, &cli)?;
    config.validate()?;

    match &cli.command {
        Commands::Chat { private, .. } => {
            commands::chat::run_chat(&config, *private).await?;
        }
        Commands::Sessions { command } => match command {
            SessionCommands::List => commands::sessions::run_list(&config)?,
            SessionCommands::Delete { name } => commands::sessions::run_delete(&config, name)?,
        },
        Commands::Models { provider } => {
            commands::models::run_models(&config, provider.as_deref()).await?;
        }
    }

    Ok(())
}
