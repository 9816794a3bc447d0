//! Poise framework setup and command registration logic.

use chrono::{DateTime, Utc};
use hearth_birthdays::BirthdayStore;
use hearth_config::{Config, ConfigCache};
use hearth_flights::FlightWatcher;
use hearth_graphs::{ConnectionStore, WrappedCache};
use hearth_workouts::WorkoutTracker;
use std::sync::Arc;
use thiserror::Error as ThisError;
use tracing::{error, warn};

/// Application data accessible in all commands.
pub struct Data {
    /// Live configuration.
    pub config: Arc<ConfigCache>,
    /// Workout tracker shared with the rollover task.
    pub tracker: Arc<WorkoutTracker>,
    /// Birthday store, when the birthday cog is enabled.
    pub birthdays: Option<BirthdayStore>,
    /// Flight schedule watcher shared with the scheduled check.
    pub flights: Option<Arc<FlightWatcher>>,
    /// Declared connections between members.
    pub connections: Option<ConnectionStore>,
    /// Cache of collected server wrapped stats.
    pub wrapped: Option<WrappedCache>,
    /// HTTP client for avatar downloads.
    pub http: reqwest::Client,
    /// Music and speech playback.
    #[cfg(feature = "voice")]
    pub voice: Option<hearth_voice::VoicePlayer>,
    /// Text-to-speech client, when an API key is configured.
    #[cfg(feature = "voice")]
    pub speech: Option<hearth_voice::FishSpeechClient>,
    /// When the bot process started.
    pub started_at: DateTime<Utc>,
}

impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("config", &"<ConfigCache>")
            .field("tracker", &"<WorkoutTracker>")
            .field("birthdays", &self.birthdays.is_some())
            .field("flights", &self.flights.is_some())
            .field("connections", &self.connections.is_some())
            .field("wrapped", &self.wrapped.is_some())
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

/// Application error type for commands.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Command context type.
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Errors raised by the command layer itself.
#[derive(Debug, ThisError)]
pub enum CommandError {
    /// A birthday command ran while the birthday cog is disabled.
    #[error("The birthday cog is disabled")]
    BirthdaysDisabled,

    /// A command of another optional cog ran while that cog is disabled.
    #[error("The {0} cog is disabled")]
    CogDisabled(&'static str),

    /// A guild-only command ran outside a guild.
    #[error("This command can only be used in a server")]
    NotInGuild,
}

/// Reply sent when a command fails unexpectedly.
pub const COMMAND_FAILED: &str = "⚠️ Something went wrong while running that command. Please try again later.";

/// Which optional cogs register their commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnabledCogs {
    /// `/set_birthday` and friends.
    pub birthdays: bool,
    /// `/check_flights`.
    pub flights: bool,
    /// `/addconnection`, `/removeconnection`, `/connectionchart`.
    pub connections: bool,
    /// `/server_wrapped`.
    pub wrapped: bool,
    /// `/join`, `/play`, `/skip`, `/queue`, `/stop`. Needs the `voice` feature.
    pub music: bool,
    /// `/say` and `/leave`. Needs the `voice` feature.
    pub speech: bool,
}

impl EnabledCogs {
    /// Switches as configured.
    pub fn from_config(config: &Config) -> Self {
        Self {
            birthdays: config.birthdays.enabled,
            flights: config.flights.enabled,
            connections: config.connections.enabled,
            wrapped: config.wrapped.enabled,
            music: config.music.enabled,
            speech: config.speech.is_enabled(),
        }
    }

    /// Every cog on.
    pub fn all() -> Self {
        Self {
            birthdays: true,
            flights: true,
            connections: true,
            wrapped: true,
            music: true,
            speech: true,
        }
    }
}

/// Every command the bot registers.
pub fn commands(cogs: EnabledCogs) -> Vec<poise::Command<Data, Error>> {
    let mut commands = vec![
        crate::about::about(),
        crate::config::config(),
        crate::workouts::set_goal(),
        crate::workouts::opt_out(),
        crate::workouts::leaderboard(),
        crate::workouts::my_workouts(),
    ];
    if cogs.birthdays {
        commands.extend([
            crate::birthdays::set_birthday(),
            crate::birthdays::when_is(),
            crate::birthdays::list_birthdays(),
            crate::birthdays::remove_birthday(),
        ]);
    }
    if cogs.flights {
        commands.push(crate::flights::check_flights());
    }
    if cogs.connections {
        commands.extend([
            crate::connections::addconnection(),
            crate::connections::removeconnection(),
            crate::connections::connectionchart(),
        ]);
    }
    if cogs.wrapped {
        commands.push(crate::wrapped::server_wrapped());
    }
    #[cfg(feature = "voice")]
    {
        if cogs.music {
            commands.extend([
                crate::music::join(),
                crate::music::play(),
                crate::music::skip(),
                crate::music::queue(),
                crate::music::stop(),
            ]);
        }
        if cogs.speech {
            commands.extend([crate::speech::say(), crate::speech::leave()]);
        }
    }
    commands
}

/// Creates a new Poise framework. The caller supplies the setup step.
pub fn create_framework(cogs: EnabledCogs) -> poise::FrameworkBuilder<Data, Error> {
    poise::Framework::builder().options(poise::FrameworkOptions {
        commands: commands(cogs),
        on_error: |error| Box::pin(on_error(error)),
        event_handler: |ctx, event, framework, data| {
            Box::pin(crate::events::event_handler(ctx, event, framework, data))
        },
        ..Default::default()
    })
}

/// Global error handler for the framework.
pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command '{}': {:?}", ctx.command().name, error);
            let reply = poise::CreateReply::default()
                .content(COMMAND_FAILED)
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                warn!("Could not report command failure: {}", e);
            }
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!("Error in event handler for {:?}: {:?}", event.snake_case_name(), error);
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling framework error: {}", e);
            }
        }
    }
}

/// Reply visible only to the invoking user.
pub(crate) async fn reply_ephemeral(ctx: Context<'_>, content: impl Into<String>) -> Result<(), Error> {
    ctx.send(poise::CreateReply::default().content(content).ephemeral(true))
        .await?;
    Ok(())
}
