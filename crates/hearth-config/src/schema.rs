//! Configuration schema definitions using serde.

use chrono::NaiveTime;
use chrono_tz::Tz;
use hearth_common::{parse_hh_mm, parse_timezone, ChannelId, HearthError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for Hearth Bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Discord configuration.
    pub discord: DiscordConfig,
    /// Workout tracker configuration.
    pub workouts: WorkoutsConfig,
    /// External text generation used for rollover admonishments.
    pub text_generation: TextGenerationConfig,
    /// Birthday cog configuration.
    pub birthdays: BirthdaysConfig,
    /// Flight schedule watcher configuration.
    pub flights: FlightsConfig,
    /// Relationship chart configuration.
    pub connections: ConnectionsConfig,
    /// Server wrapped configuration.
    pub wrapped: WrappedConfig,
    /// Voice channel music queue configuration.
    pub music: MusicConfig,
    /// Text-to-speech configuration.
    pub speech: SpeechConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Discord bot token.
    pub token: String,
    /// Register slash commands in this guild only (instant) instead of globally.
    pub guild_id: Option<u64>,
}

/// Workout tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkoutsConfig {
    /// Path of the JSON state file.
    pub data_file: PathBuf,
    /// Thread where workout pictures are posted and confirmed.
    pub thread_id: ChannelId,
    /// Channel for weekly announcements and acknowledgment requests.
    pub announcement_channel_id: ChannelId,
    /// IANA timezone used for week boundaries (Monday 00:00).
    pub timezone: String,
    /// Hours before the weekly boundary at which reminders are sent.
    pub warning_hours: u32,
    /// Consecutive missed weeks that trigger an acknowledgment request.
    pub miss_threshold: u32,
    /// Reaction a user must add to keep being tracked after escalation.
    pub acknowledgment_emoji: String,
    /// Days a pending acknowledgment may stay unanswered.
    pub acknowledgment_window_days: u32,
    /// Seconds to wait for a yes/no answer after a workout picture.
    pub confirmation_timeout_seconds: u64,
    /// Seconds to wait before retrying a failed rollover iteration.
    pub retry_delay_seconds: u64,
    /// Whether a met in-progress week adds one to the reported streak.
    pub streak_includes_current_week: bool,
    /// Upper bound on the number of weeks scanned when counting misses.
    pub max_lookback_weeks: u32,
}

impl WorkoutsConfig {
    /// Parsed week-boundary timezone.
    pub fn timezone(&self) -> Result<Tz, HearthError> {
        parse_timezone(&self.timezone)
    }
}

/// OpenAI-compatible chat completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextGenerationConfig {
    /// API key; generation is disabled when empty.
    pub api_key: String,
    /// Chat completions endpoint.
    pub api_url: String,
    /// Model name.
    pub model: String,
    /// Maximum tokens in the generated message.
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl TextGenerationConfig {
    /// Whether credentials are present.
    pub fn is_enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Birthday cog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BirthdaysConfig {
    /// Whether the birthday cog is loaded.
    pub enabled: bool,
    /// Path of the SQLite database.
    pub database_path: PathBuf,
    /// Channel receiving birthday reminders.
    pub channel_id: ChannelId,
    /// Local time of the daily check, `HH:MM`.
    pub check_time: String,
}

impl BirthdaysConfig {
    /// Parsed daily check time.
    pub fn check_time(&self) -> Result<NaiveTime, HearthError> {
        parse_hh_mm(&self.check_time).ok_or_else(|| {
            HearthError::validation_field(
                format!("check_time '{}' must be HH:MM", self.check_time),
                "birthdays.check_time",
            )
        })
    }
}

/// Flight schedule watcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightsConfig {
    /// Whether the flight schedule cog is loaded.
    pub enabled: bool,
    /// Terminal page that links the schedule PDF.
    pub page_url: String,
    /// Text the schedule PDF link must contain.
    pub link_marker: String,
    /// Path of the JSON file holding the last seen schedule.
    pub data_file: PathBuf,
    /// Channel receiving new flight notices.
    pub channel_id: ChannelId,
    /// Hours between automatic checks.
    pub check_interval_hours: u64,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl FlightsConfig {
    /// Time between automatic checks.
    pub fn check_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.check_interval_hours.saturating_mul(3600))
    }
}

/// Relationship chart configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionsConfig {
    /// Whether the connection chart cog is loaded.
    pub enabled: bool,
    /// Path of the JSON file holding the connections.
    pub data_file: PathBuf,
}

/// Server wrapped configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WrappedConfig {
    /// Whether the server wrapped cog is loaded.
    pub enabled: bool,
    /// Path of the JSON file caching collected statistics per guild.
    pub cache_file: PathBuf,
    /// Hours a cached collection stays fresh.
    pub cache_ttl_hours: u64,
    /// IANA timezone used for the activity-by-hour chart and the year start.
    pub timezone: String,
}

impl WrappedConfig {
    /// Parsed reporting timezone.
    pub fn timezone(&self) -> Result<Tz, HearthError> {
        parse_timezone(&self.timezone)
    }

    /// How long a cached collection stays fresh, capped at a year.
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cache_ttl_hours.min(24 * 366) as i64)
    }
}

/// Voice channel music queue configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicConfig {
    /// Whether the music commands are registered.
    pub enabled: bool,
}

/// Text-to-speech configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// API key; speech is disabled when empty.
    pub api_key: String,
    /// Voice model used for synthesis.
    pub reference_id: String,
    /// Synthesis endpoint.
    pub api_url: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl SpeechConfig {
    /// Whether credentials are present.
    pub fn is_enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines.
    pub json_format: bool,
    /// Directory for a daily-rolling log file.
    pub directory: Option<PathBuf>,
}

impl Config {
    /// Validates the configuration, returning the first problem found.
    pub fn validate(&self) -> Result<(), HearthError> {
        match crate::validator::ConfigValidator::problems(self).into_iter().next() {
            Some(problem) => Err(HearthError::config(problem)),
            None => Ok(()),
        }
    }
}
