//! Core bot logic using the Poise framework.

use chrono::Utc;
use hearth_birthdays::BirthdayStore;
use hearth_commands::{create_framework, Data, EnabledCogs, Error};
use hearth_config::{Config, ConfigCache};
use hearth_flights::{FlightFetcher, FlightStore, FlightWatcher};
use hearth_graphs::{ConnectionStore, WrappedCache};
use hearth_workouts::{
    roast_writer, JsonStore, Notifier, RolloverSettings, StreakCalculator, StreakRules, WeekCalendar,
    WeeklyRollover, WorkoutTracker,
};
use poise::serenity_prelude::{self as serenity, GatewayIntents};
use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::discord::DiscordNotifier;
use crate::error::BotResult;
use crate::scheduler::{BirthdayTask, FlightTask, RolloverTask};
use crate::task_manager::TaskManager;

/// Gateway intents the bot needs.
pub fn intents() -> GatewayIntents {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::DIRECT_MESSAGES;
    if cfg!(feature = "voice") {
        intents | GatewayIntents::GUILD_VOICE_STATES
    } else {
        intents
    }
}

/// Streak rules from the `workouts` section.
pub fn streak_calculator(config: &Config, calendar: WeekCalendar) -> StreakCalculator {
    StreakCalculator::new(
        calendar,
        StreakRules {
            include_current_week: config.workouts.streak_includes_current_week,
            max_lookback_weeks: config.workouts.max_lookback_weeks,
        },
    )
}

/// Long-lived services shared by commands and background tasks.
struct Services {
    config: Arc<ConfigCache>,
    tracker: Arc<WorkoutTracker>,
    birthdays: Option<BirthdayStore>,
    flights: Option<Arc<FlightWatcher>>,
    connections: Option<ConnectionStore>,
    wrapped: Option<WrappedCache>,
    http: reqwest::Client,
    tasks: Arc<TaskManager>,
}

/// Main bot structure.
pub struct HearthBot {
    config: Arc<ConfigCache>,
}

impl HearthBot {
    /// Creates a new bot instance.
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(ConfigCache::new(config)),
        }
    }

    /// Opens the stores, connects to Discord and runs until shutdown.
    pub async fn start(&self) -> BotResult<()> {
        let config = self.config.get();
        let timezone = config.workouts.timezone()?;
        let calendar = WeekCalendar::new(timezone);

        let store = JsonStore::new(&config.workouts.data_file, timezone);
        let tracker = Arc::new(WorkoutTracker::open(store, streak_calculator(&config, calendar)).await?);

        let birthdays = if config.birthdays.enabled {
            Some(BirthdayStore::connect(&config.birthdays.database_path).await?)
        } else {
            info!("Birthday cog disabled");
            None
        };

        let services = Services {
            config: self.config.clone(),
            tracker,
            birthdays: birthdays.clone(),
            flights: open_flights(&config).await?,
            connections: open_connections(&config).await?,
            wrapped: config.wrapped.enabled.then(|| {
                WrappedCache::new(&config.wrapped.cache_file, config.wrapped.cache_ttl())
            }),
            http: reqwest::Client::new(),
            tasks: Arc::new(TaskManager::with_defaults()),
        };
        let tasks = services.tasks.clone();

        let framework = create_framework(EnabledCogs::from_config(&config))
            .setup(move |ctx, ready, framework| Box::pin(setup(ctx, ready, framework, services)))
            .build();

        let builder = serenity::ClientBuilder::new(&config.discord.token, intents()).framework(framework);
        #[cfg(feature = "voice")]
        let builder = songbird::SerenityInit::register_songbird(builder);
        let mut client = builder.await?;

        info!("Discord client created");

        // Set up graceful shutdown handling
        let shard_manager = client.shard_manager.clone();
        let shutdown_tasks = tasks.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {:?}", e);
                return;
            }

            info!("Received shutdown signal, starting graceful shutdown");
            shutdown_tasks.shutdown().await;
            shard_manager.shutdown_all().await;
            info!("Discord client shutdown complete");
        });

        let result = client.start().await;

        tasks.shutdown().await;
        if let Some(store) = birthdays {
            store.close().await;
        }
        result?;
        Ok(())
    }
}

/// Setup function for Poise framework - registers commands and starts the background tasks
async fn setup(
    ctx: &serenity::Context,
    ready: &serenity::Ready,
    framework: &poise::Framework<Data, Error>,
    services: Services,
) -> Result<Data, Error> {
    info!("Bot connected as: {}", ready.user.name);
    info!("Connected to {} guilds", ready.guilds.len());

    let config = services.config.get();
    let commands = &framework.options().commands;
    match config.discord.guild_id.and_then(NonZeroU64::new) {
        Some(guild_id) => {
            poise::builtins::register_in_guild(ctx, commands, serenity::GuildId::from(guild_id)).await?;
            info!(guild_id = guild_id.get(), "Slash commands registered in guild");
        }
        None => {
            poise::builtins::register_globally(ctx, commands).await?;
            info!("Slash commands registered globally");
        }
    }

    spawn_background_tasks(&services, &config, DiscordNotifier::new(ctx.http.clone())).await?;

    #[cfg(feature = "voice")]
    let (voice, speech) = voice_services(ctx, &config, &services.http).await?;

    Ok(Data {
        config: services.config,
        tracker: services.tracker,
        birthdays: services.birthdays,
        flights: services.flights,
        connections: services.connections,
        wrapped: services.wrapped,
        http: services.http,
        #[cfg(feature = "voice")]
        voice,
        #[cfg(feature = "voice")]
        speech,
        started_at: Utc::now(),
    })
}

async fn open_flights(config: &Config) -> BotResult<Option<Arc<FlightWatcher>>> {
    if !config.flights.enabled {
        info!("Flight schedule cog disabled");
        return Ok(None);
    }
    let fetcher = Arc::new(FlightFetcher::new(&config.flights)?);
    let store = FlightStore::new(&config.flights.data_file);
    Ok(Some(Arc::new(FlightWatcher::open(fetcher, store).await)))
}

async fn open_connections(config: &Config) -> BotResult<Option<ConnectionStore>> {
    if !config.connections.enabled {
        info!("Connection chart cog disabled");
        return Ok(None);
    }
    Ok(Some(ConnectionStore::open(&config.connections.data_file).await?))
}

#[cfg(feature = "voice")]
async fn voice_services(
    ctx: &serenity::Context,
    config: &Config,
    http: &reqwest::Client,
) -> Result<(Option<hearth_voice::VoicePlayer>, Option<hearth_voice::FishSpeechClient>), Error> {
    let speech = hearth_voice::FishSpeechClient::from_config(&config.speech)?;
    if !config.music.enabled && speech.is_none() {
        return Ok((None, None));
    }
    let voice = match songbird::get(ctx).await {
        Some(manager) => Some(hearth_voice::VoicePlayer::new(manager, http.clone())),
        None => {
            warn!("Songbird is not registered; voice commands are unavailable");
            None
        }
    };
    Ok((voice, speech))
}

async fn spawn_background_tasks(services: &Services, config: &Config, notifier: DiscordNotifier) -> Result<(), Error> {
    let notifier: Arc<dyn Notifier> = Arc::new(notifier);
    let retry_delay = Duration::from_secs(config.workouts.retry_delay_seconds);

    if config.workouts.announcement_channel_id.0 == 0 {
        warn!("No announcement channel configured; weekly results cannot be posted");
    }
    let rollover = WeeklyRollover::new(
        services.tracker.clone(),
        notifier.clone(),
        roast_writer(&config.text_generation),
        RolloverSettings::from_config(&config.workouts),
    );
    let rollover_task = RolloverTask::new(rollover, retry_delay);
    services
        .tasks
        .spawn_task("weekly-rollover", move |cancel| rollover_task.run(cancel))
        .await?;

    if let Some(watcher) = &services.flights {
        if config.flights.channel_id.0 == 0 {
            warn!("No flight channel configured; new flights will not be announced");
        } else {
            let flight_task = FlightTask::new(
                watcher.clone(),
                notifier.clone(),
                config.flights.channel_id,
                config.flights.check_interval(),
            );
            services
                .tasks
                .spawn_task("flight-schedule", move |cancel| flight_task.run(cancel))
                .await?;
        }
    }

    if let Some(store) = &services.birthdays {
        if config.birthdays.channel_id.0 == 0 {
            warn!("No birthday channel configured; daily reminders are disabled");
        } else {
            let birthday_task = BirthdayTask::new(
                store.clone(),
                notifier,
                config.birthdays.channel_id,
                *services.tracker.calculator().calendar(),
                config.birthdays.check_time()?,
                retry_delay,
            );
            services
                .tasks
                .spawn_task("birthday-reminders", move |cancel| birthday_task.run(cancel))
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_common::test_utils::monday_anchor;

    #[test]
    fn test_intents_cover_confirmation_and_reactions() {
        let intents = intents();
        assert!(intents.contains(GatewayIntents::MESSAGE_CONTENT));
        assert!(intents.contains(GatewayIntents::GUILD_MESSAGES));
        assert!(intents.contains(GatewayIntents::GUILD_MESSAGE_REACTIONS));
        assert!(!intents.contains(GatewayIntents::GUILD_MEMBERS));
        assert_eq!(
            intents.contains(GatewayIntents::GUILD_VOICE_STATES),
            cfg!(feature = "voice")
        );
    }

    #[test]
    fn test_streak_rules_follow_config() {
        let mut config = Config::default();
        config.workouts.streak_includes_current_week = false;
        config.workouts.max_lookback_weeks = 8;

        let calculator = streak_calculator(&config, WeekCalendar::new(chrono_tz::UTC));
        // One workout in the in-progress week does not count when the rules exclude it.
        let history = [monday_anchor()];
        assert_eq!(calculator.compute_streak(&history, 1, monday_anchor()), 0);
    }
}
