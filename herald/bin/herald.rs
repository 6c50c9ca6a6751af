//! Command-line entry point for herald
//!
//! Sends a single message through the configured providers and prints the
//! delivery result as JSON.

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use herald::Herald;
use herald_common::Message;

/// Idempotent multi-provider email delivery
#[derive(Parser, Debug)]
#[command(name = "herald")]
#[command(about = "Deliver email through prioritised providers", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file (RON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Deliver one message
    Send {
        /// Recipient address (repeat for several recipients)
        #[arg(long = "to", required = true)]
        to: Vec<String>,

        #[arg(short, long)]
        subject: String,

        #[arg(short, long)]
        body: String,
    },
    /// Validate the configuration and list providers in priority order
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let herald = match cli.config {
        Some(path) => Herald::from_file(&path)?,
        None => find_config_file()?.map_or_else(
            || Ok(Herald::default()),
            |path| Herald::from_file(&path),
        )?,
    };
    herald.init();

    match cli.command {
        Commands::Send { to, subject, body } => {
            let message = Message::new(to, subject, body);
            let result = herald.send(&message).await?;

            println!("{}", serde_json::to_string_pretty(&result)?);

            Ok(if result.overall_success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Check => {
            let orchestrator = herald.orchestrator().await?;

            for (priority, name) in orchestrator.provider_names().enumerate() {
                println!("{}. {name}", priority + 1);
            }

            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Find the configuration file using the following precedence:
/// 1. `HERALD_CONFIG` environment variable
/// 2. ./herald.config.ron (current working directory)
/// 3. /etc/herald/herald.config.ron (system-wide config)
///
/// Returns `None` when no file exists, in which case built-in defaults apply.
fn find_config_file() -> anyhow::Result<Option<PathBuf>> {
    if let Ok(env_path) = std::env::var("HERALD_CONFIG") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(Some(path));
        }
        anyhow::bail!(
            "HERALD_CONFIG points to non-existent file: {}",
            path.display()
        );
    }

    let default_paths = [
        PathBuf::from("./herald.config.ron"),
        PathBuf::from("/etc/herald/herald.config.ron"),
    ];

    Ok(default_paths.into_iter().find(|path| path.exists()))
}
