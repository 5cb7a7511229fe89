//! CLI module for ragchat
//!
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod chat;
pub mod init;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Chat with the documents in a local folder
#[derive(Parser, Debug)]
#[command(
    name = "ragchat",
    version,
    about = "Chat with your local documents",
    long_about = "Indexes the PDF, text, Word and Excel files in a local folder once, then\n\
                  answers questions with a hosted LLM, using the closest documents as context\n\
                  when they are relevant enough.\n\n\
                  Run without arguments to start the web UI.",
    after_help = "EXAMPLES:\n    \
                  ragchat init                  # Scaffold ragchat.toml and the knowledge folder\n    \
                  ragchat                       # Start the web UI\n    \
                  ragchat chat                  # Chat in the terminal\n    \
                  ragchat index --rebuild       # Re-read the folder into a fresh index\n    \
                  ragchat --config my.toml      # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "ragchat.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Log output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the web chat UI (default)
    Serve,

    /// Chat in the terminal
    Chat,

    /// Build the knowledge index without starting a chat
    Index {
        /// Drop the existing index and re-read the knowledge folder
        #[arg(long)]
        rebuild: bool,
    },

    /// Show the knowledge index status
    Status,

    /// Initialize a new ragchat project with configuration files
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files without prompting
        #[arg(short, long)]
        force: bool,

        /// LLM provider to configure (gemini or ollama)
        #[arg(long, default_value = "gemini")]
        provider: String,

        /// Port for the web UI
        #[arg(long, default_value = "8501")]
        port: u16,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
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
    fn test_no_subcommand_defaults() {
        let cli = Cli::try_parse_from(["ragchat"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("ragchat.toml"));
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn test_index_rebuild_flag() {
        let cli = Cli::try_parse_from(["ragchat", "index", "--rebuild"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Index { rebuild: true })));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ragchat",
            "chat",
            "--config",
            "other.toml",
            "--log-format",
            "json",
            "--no-color",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Chat)));
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(cli.no_color);
    }
}
