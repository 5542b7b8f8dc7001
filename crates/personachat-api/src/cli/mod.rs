//! CLI command definitions for the `pchat` binary.
//!
//! Uses clap derive macros for argument parsing. Subcommands are grouped
//! by resource (e.g., `pchat personas list`, `pchat history yoda`).

pub mod history;
pub mod models;
pub mod persona;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat with AI personas over a REST API.
#[derive(Parser)]
#[command(name = "pchat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to a config.toml (defaults to {data_dir}/config.toml).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (overrides config and PORT).
        #[arg(long)]
        port: Option<u16>,

        /// Host to bind to (overrides config and HOST).
        #[arg(long)]
        host: Option<String>,
    },

    /// Manage personas.
    Personas {
        #[command(subcommand)]
        action: PersonaAction,
    },

    /// Show or clear the chat history with a persona.
    History {
        /// Persona id (e.g., yoda).
        persona_id: String,

        /// Scope to one user; omitted means the anonymous user.
        #[arg(long)]
        user: Option<String>,

        /// Delete the history instead of printing it.
        #[arg(long)]
        clear: bool,
    },

    /// List supported models and whether their provider is configured.
    Models,

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum PersonaAction {
    /// List all personas.
    List,

    /// Show one persona, including its system prompt.
    Show {
        /// Persona id.
        id: String,
    },

    /// Create a custom persona.
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,

        /// System prompt that defines the persona's voice.
        #[arg(long)]
        system_prompt: String,

        #[arg(long)]
        avatar_url: Option<String>,
    },

    /// Delete a custom persona and its chat history.
    Delete {
        /// Persona id.
        id: String,

        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}

/// Relative time for table cells ("5m ago").
pub(crate) fn format_relative_time(dt: &chrono::DateTime<chrono::Utc>) -> String {
    let diff = chrono::Utc::now() - *dt;

    if diff.num_minutes() < 1 {
        "just now".to_string()
    } else if diff.num_hours() < 1 {
        format!("{}m ago", diff.num_minutes())
    } else if diff.num_days() < 1 {
        format!("{}h ago", diff.num_hours())
    } else if diff.num_days() < 30 {
        format!("{}d ago", diff.num_days())
    } else {
        dt.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_persona_create() {
        let cli = Cli::try_parse_from([
            "pchat",
            "--json",
            "personas",
            "create",
            "--name",
            "Pirate",
            "--description",
            "Arr",
            "--system-prompt",
            "You are a pirate.",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Personas {
                action: PersonaAction::Create { name, system_prompt, avatar_url, .. },
            } => {
                assert_eq!(name, "Pirate");
                assert_eq!(system_prompt, "You are a pirate.");
                assert!(avatar_url.is_none());
            }
            _ => panic!("expected personas create"),
        }
    }

    #[test]
    fn test_parse_history_flags() {
        let cli = Cli::try_parse_from(["pchat", "-vv", "history", "yoda", "--user", "luke", "--clear"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::History { persona_id, user, clear } => {
                assert_eq!(persona_id, "yoda");
                assert_eq!(user.as_deref(), Some("luke"));
                assert!(clear);
            }
            _ => panic!("expected history"),
        }
    }

    #[test]
    fn test_relative_time() {
        let now = chrono::Utc::now();
        assert_eq!(format_relative_time(&now), "just now");
        assert_eq!(format_relative_time(&(now - chrono::Duration::minutes(5))), "5m ago");
        assert_eq!(format_relative_time(&(now - chrono::Duration::hours(3))), "3h ago");
    }
}
