// Askme chat assistant engine
// Main entry point for the askme binary

use clap::Parser;

use askme_engine::cli::{Cli, Command};
use askme_engine::config::Config;
use askme_engine::handlers::{handle_ask, handle_chat, handle_doctor, OutputFormat};
use askme_engine::telemetry::{init_telemetry, init_telemetry_with_level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Basic telemetry first, before config is loaded.
    init_telemetry();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // Re-initialize telemetry with the effective log level
    // (only takes effect if RUST_LOG env var is not set).
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    match cli.command {
        Command::Ask { question } => handle_ask(question, &config, format).await,
        Command::Chat => handle_chat(&config, format).await,
        Command::Doctor => handle_doctor(&config, format).await,
    }
}
