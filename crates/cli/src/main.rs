//! chatsieve CLI — the main entry point.
//!
//! Commands:
//! - `run`        — Classify a JSON-lines event stream
//! - `check`      — Classify a single message
//! - `similarity` — Score two texts with the similarity metric
//! - `config`     — Show, locate or validate configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::run::OutputFormat;

#[derive(Parser)]
#[command(
    name = "chatsieve",
    about = "chatsieve — chat spam classifier",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.chatsieve/config.toml)
    #[arg(short, long, global = true, env = "CHATSIEVE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a stream of JSON-lines chat events
    Run {
        /// Read events from a file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Print flagged messages only
        #[arg(long)]
        flagged_only: bool,
    },

    /// Classify a single message with a fresh state store
    Check {
        /// Sender id
        #[arg(short, long, default_value = "cli")]
        sender: String,

        /// Emote code, repeatable, in message order
        #[arg(short, long = "emote")]
        emotes: Vec<String>,

        /// Treat the message as a reply
        #[arg(long)]
        reply: bool,

        /// Message text
        text: String,
    },

    /// Score two texts with the bigram similarity metric
    Similarity { a: String, b: String },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the built-in defaults as TOML (the default action)
    Default,
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Load and validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries outcomes.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run {
            input,
            format,
            flagged_only,
        } => commands::run::run(config_path, input, format, flagged_only).await?,
        Commands::Check {
            sender,
            emotes,
            reply,
            text,
        } => commands::check::run(config_path, sender, emotes, reply, text)?,
        Commands::Similarity { a, b } => commands::similarity::run(config_path, &a, &b)?,
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Default) {
            ConfigAction::Default => commands::config_cmd::defaults(),
            ConfigAction::Show => commands::config_cmd::show(config_path)?,
            ConfigAction::Path => commands::config_cmd::path(config_path),
            ConfigAction::Validate => commands::config_cmd::validate(config_path)?,
        },
    }

    Ok(())
}
