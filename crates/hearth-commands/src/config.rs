//! Config subcommands with Poise's built-in subcommand support.

use hearth_config::Config;
use tracing::{info, warn};

use crate::framework::{reply_ephemeral, Context, EnabledCogs, Error};

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// Which cogs the configuration turns on, one per line. Secrets are never shown.
pub fn cog_summary(config: &Config) -> String {
    let cogs = EnabledCogs::from_config(config);
    format!(
        "**Cogs**\n\
         Birthdays: {}\n\
         Flights: {}\n\
         Connections: {}\n\
         Server wrapped: {}\n\
         Music: {}\n\
         Speech: {}",
        on_off(cogs.birthdays),
        on_off(cogs.flights),
        on_off(cogs.connections),
        on_off(cogs.wrapped),
        on_off(cogs.music),
        on_off(cogs.speech),
    )
}

/// Configuration management commands.
#[poise::command(
    slash_command,
    subcommands("view", "reload"),
    required_permissions = "ADMINISTRATOR"
)]
pub async fn config(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// View which cogs are on.
#[poise::command(slash_command, required_permissions = "ADMINISTRATOR")]
pub async fn view(ctx: Context<'_>) -> Result<(), Error> {
    let config = ctx.data().config.get();
    reply_ephemeral(ctx, cog_summary(&config)).await
}

/// Re-read the configuration file and environment.
///
/// Cogs switched on or off still need a restart to register or drop commands.
#[poise::command(slash_command, required_permissions = "ADMINISTRATOR")]
pub async fn reload(ctx: Context<'_>) -> Result<(), Error> {
    let response = match ctx.data().config.reload() {
        Ok(_) => {
            info!(user = %ctx.author().id, "Configuration reloaded on request");
            "Configuration reloaded.".to_string()
        }
        Err(e) => {
            warn!(error = %e, "Configuration reload requested but failed");
            format!("Reload failed, keeping the current configuration: {e}")
        }
    };
    reply_ephemeral(ctx, response).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cog_summary_reflects_switches() {
        let mut config = Config::default();
        config.flights.enabled = true;
        config.speech.api_key = "secret".to_string();

        let summary = cog_summary(&config);
        assert!(summary.contains("Flights: on"));
        assert!(summary.contains("Speech: on"));
        assert!(summary.contains("Music: off"));
        assert!(!summary.contains("secret"));
    }
}
