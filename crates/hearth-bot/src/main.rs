//! Main entry point for Hearth Bot.

use anyhow::Context;
use hearth_bot::HearthBot;
use hearth_common::logging::{init_logging, LoggingOptions};
use hearth_config::ConfigLoader;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::load().context("Failed to load configuration")?;

    // The guard flushes the file writer when dropped at exit.
    let _log_guard = init_logging(&LoggingOptions {
        level: config.logging.level.clone(),
        json_format: config.logging.json_format,
        directory: config.logging.directory.clone(),
        ..LoggingOptions::default()
    })
    .context("Failed to initialize logging")?;

    info!("Starting Hearth Bot v{}", env!("CARGO_PKG_VERSION"));

    let bot = HearthBot::new(config);
    if let Err(e) = bot.start().await {
        error!("Bot stopped with an error: {}", e);
        return Err(e).context("Hearth Bot failed");
    }

    info!("Hearth Bot stopped");
    Ok(())
}
