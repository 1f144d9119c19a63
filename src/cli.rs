//! Command-line interface for Polychat
//!
//! This module defines the CLI structure using clap's derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Multi-provider LLM chat with streaming responses and persistent sessions
#[derive(Parser, Debug)]
#[command(name = "polychat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Provider to use (openai, ollama)
        #[arg(short, long)]
        provider: Option<String>,

        /// Model to use (overrides the configured model)
        #[arg(short, long)]
        model: Option<String>,

        /// Start in private mode (nothing is written to disk)
        #[arg(long)]
        private: bool,

        /// Directory holding session files
        #[arg(long, env = "POLYCHAT_SESSION_DIR")]
        session_dir: Option<PathBuf>,
    },

    /// Manage saved sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// List models available from a provider
    Models {
        /// Provider to query (defaults to the configured one)
        #[arg(short, long)]
        provider: Option<String>,
    },
}

/// Session management subcommands
#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// List saved sessions
    List,

    /// Delete a saved session
    Delete {
        /// Name of the session to delete
        name: String,
    },
}

/// Parse command-line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_command() {
        let cli = Cli::try_parse_from(["polychat", "chat"]).unwrap();
        match cli.command {
            Commands::Chat {
                provider,
                model,
                private,
                session_dir,
            } => {
                assert!(provider.is_none());
                assert!(model.is_none());
                assert!(!private);
                assert!(session_dir.is_none());
            }
            _ => panic!("Expected chat command"),
        }
    }

    #[test]
    fn test_parse_chat_with_overrides() {
        let cli = Cli::try_parse_from([
            "polychat",
            "chat",
            "--provider",
            "openai",
            "--model",
            "o3",
            "--private",
        ])
        .unwrap();
        match cli.command {
            Commands::Chat {
                provider,
                model,
                private,
                ..
            } => {
                assert_eq!(provider.as_deref(), Some("openai"));
                assert_eq!(model.as_deref(), Some("o3"));
                assert!(private);
            }
            _ => panic!("Expected chat command"),
        }
    }

    #[test]
    fn test_parse_sessions_list() {
        let cli = Cli::try_parse_from(["polychat", "sessions", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Sessions {
                command: SessionCommands::List
            }
        ));
    }

    #[test]
    fn test_parse_sessions_delete() {
        let cli = Cli::try_parse_from(["polychat", "sessions", "delete", "old_session"]).unwrap();
        match cli.command {
            Commands::Sessions {
                command: SessionCommands::Delete { name },
            } => assert_eq!(name, "old_session"),
            _ => panic!("Expected sessions delete command"),
        }
    }

    #[test]
    fn test_parse_models_command() {
        let cli = Cli::try_parse_from(["polychat", "models", "--provider", "ollama"]).unwrap();
        match cli.command {
            Commands::Models { provider } => assert_eq!(provider.as_deref(), Some("ollama")),
            _ => panic!("Expected models command"),
        }
    }

    #[test]
    fn test_custom_config_path() {
        let cli = Cli::try_parse_from(["polychat", "--config", "/tmp/alt.yaml", "chat"]).unwrap();
        assert_eq!(cli.config, "/tmp/alt.yaml");
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["polychat", "chat"]).unwrap();
        assert_eq!(cli.config, "config/config.yaml");
    }

    #[test]
    fn test_missing_command_fails() {
        assert!(Cli::try_parse_from(["polychat"]).is_err());
    }
}
