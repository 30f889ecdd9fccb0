//! Command-line interface definition for ChatLedger
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for sending chat messages, browsing history,
//! and inspecting token usage.

use clap::{Parser, Subcommand};

/// ChatLedger - AI chat with usage accounting
///
/// Send messages to a hosted completion model while tracking token
/// consumption against plan quotas.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatledger")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the conversation database path
    #[arg(long)]
    pub db: Option<String>,

    /// Principal id to act as (overrides user.id from config)
    #[arg(long)]
    pub user: Option<String>,

    /// Plan tier to act under: free, pro, or premium
    #[arg(long)]
    pub plan: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for ChatLedger
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create a new conversation
    New {
        /// Initial title (defaults to "New Conversation" until the first exchange)
        #[arg(short, long)]
        title: Option<String>,

        /// System prompt preset (general, coding, business, creative, academic, saas)
        #[arg(short, long)]
        preset: Option<String>,

        /// Custom system prompt text (overrides --preset)
        #[arg(long)]
        system_prompt: Option<String>,
    },

    /// Send a message and print the assistant reply
    Send {
        /// Conversation to continue (full id or 8-char prefix);
        /// a new conversation is created when omitted
        #[arg(short = 'C', long)]
        conversation: Option<String>,

        /// System prompt preset for this send
        #[arg(short, long)]
        preset: Option<String>,

        /// The message to send
        message: String,
    },

    /// Browse stored conversations
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Show token usage and quota for the configured principal
    Usage,
}

/// History subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List conversations
    List,

    /// Show a conversation's recent messages
    Show {
        /// Conversation id (full or 8-char prefix)
        id: String,

        /// Maximum messages to display
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },

    /// Delete a conversation and its messages
    Delete {
        /// Conversation id (full or 8-char prefix)
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            db: None,
            user: None,
            plan: None,
            command: Commands::Usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Usage));
    }

    #[test]
    fn test_cli_parse_send_command() {
        let cli = Cli::try_parse_from(["chatledger", "send", "hello there"]);
        assert!(cli.is_ok());
        let cli = cli.unwrap();
        if let Commands::Send {
            conversation,
            preset,
            message,
        } = cli.command
        {
            assert_eq!(conversation, None);
            assert_eq!(preset, None);
            assert_eq!(message, "hello there");
        } else {
            panic!("Expected Send command");
        }
    }

    #[test]
    fn test_cli_parse_send_with_conversation() {
        let cli =
            Cli::try_parse_from(["chatledger", "send", "--conversation", "abcd1234", "hi"]).unwrap();
        if let Commands::Send { conversation, .. } = cli.command {
            assert_eq!(conversation, Some("abcd1234".to_string()));
        } else {
            panic!("Expected Send command");
        }
    }

    #[test]
    fn test_cli_parse_send_with_preset() {
        let cli = Cli::try_parse_from(["chatledger", "send", "--preset", "coding", "help"]).unwrap();
        if let Commands::Send { preset, .. } = cli.command {
            assert_eq!(preset, Some("coding".to_string()));
        } else {
            panic!("Expected Send command");
        }
    }

    #[test]
    fn test_cli_parse_send_requires_message() {
        let cli = Cli::try_parse_from(["chatledger", "send"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_parse_new_command() {
        let cli = Cli::try_parse_from(["chatledger", "new", "--title", "Ideas"]).unwrap();
        if let Commands::New { title, preset, .. } = cli.command {
            assert_eq!(title, Some("Ideas".to_string()));
            assert_eq!(preset, None);
        } else {
            panic!("Expected New command");
        }
    }

    #[test]
    fn test_cli_parse_new_with_system_prompt() {
        let cli =
            Cli::try_parse_from(["chatledger", "new", "--system-prompt", "You are terse."])
                .unwrap();
        if let Commands::New { system_prompt, .. } = cli.command {
            assert_eq!(system_prompt, Some("You are terse.".to_string()));
        } else {
            panic!("Expected New command");
        }
    }

    #[test]
    fn test_cli_parse_history_list() {
        let cli = Cli::try_parse_from(["chatledger", "history", "list"]).unwrap();
        if let Commands::History { command } = cli.command {
            assert!(matches!(command, HistoryCommand::List));
        } else {
            panic!("Expected History command");
        }
    }

    #[test]
    fn test_cli_parse_history_show_with_limit() {
        let cli =
            Cli::try_parse_from(["chatledger", "history", "show", "abcd1234", "--limit", "5"])
                .unwrap();
        if let Commands::History { command } = cli.command {
            if let HistoryCommand::Show { id, limit } = command {
                assert_eq!(id, "abcd1234");
                assert_eq!(limit, 5);
            } else {
                panic!("Expected Show command");
            }
        } else {
            panic!("Expected History command");
        }
    }

    #[test]
    fn test_cli_parse_history_show_default_limit() {
        let cli = Cli::try_parse_from(["chatledger", "history", "show", "abcd1234"]).unwrap();
        if let Commands::History {
            command: HistoryCommand::Show { limit, .. },
        } = cli.command
        {
            assert_eq!(limit, 50);
        } else {
            panic!("Expected History Show command");
        }
    }

    #[test]
    fn test_cli_parse_history_delete() {
        let cli = Cli::try_parse_from(["chatledger", "history", "delete", "abcd1234"]).unwrap();
        if let Commands::History { command } = cli.command {
            if let HistoryCommand::Delete { id } = command {
                assert_eq!(id, "abcd1234");
            } else {
                panic!("Expected Delete command");
            }
        } else {
            panic!("Expected History command");
        }
    }

    #[test]
    fn test_cli_parse_usage() {
        let cli = Cli::try_parse_from(["chatledger", "usage"]).unwrap();
        assert!(matches!(cli.command, Commands::Usage));
    }

    #[test]
    fn test_cli_parse_global_overrides() {
        let cli = Cli::try_parse_from([
            "chatledger",
            "--user",
            "user-42",
            "--plan",
            "pro",
            "--db",
            "/tmp/test.db",
            "usage",
        ])
        .unwrap();
        assert_eq!(cli.user, Some("user-42".to_string()));
        assert_eq!(cli.plan, Some("pro".to_string()));
        assert_eq!(cli.db, Some("/tmp/test.db".to_string()));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli =
            Cli::try_parse_from(["chatledger", "--config", "custom.yaml", "usage"]).unwrap();
        assert_eq!(cli.config, Some("custom.yaml".to_string()));
    }

    #[test]
    fn test_cli_parse_with_verbose() {
        let cli = Cli::try_parse_from(["chatledger", "-v", "usage"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parse_missing_command() {
        let cli = Cli::try_parse_from(["chatledger"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_parse_invalid_command() {
        let cli = Cli::try_parse_from(["chatledger", "invalid"]);
        assert!(cli.is_err());
    }
}
