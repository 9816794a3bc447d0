//! Default values for every configuration section.

use crate::schema::*;
use hearth_common::ChannelId;
use std::path::PathBuf;

impl Default for Config {
    fn default() -> Self {
        Self {
            discord: DiscordConfig::default(),
            workouts: WorkoutsConfig::default(),
            text_generation: TextGenerationConfig::default(),
            birthdays: BirthdaysConfig::default(),
            flights: FlightsConfig::default(),
            connections: ConnectionsConfig::default(),
            wrapped: WrappedConfig::default(),
            music: MusicConfig::default(),
            speech: SpeechConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            guild_id: None,
        }
    }
}

impl Default for WorkoutsConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("workout_data.json"),
            thread_id: ChannelId(0),
            announcement_channel_id: ChannelId(0),
            timezone: "UTC".to_string(),
            warning_hours: 6,
            miss_threshold: 2,
            acknowledgment_emoji: "✅".to_string(),
            acknowledgment_window_days: 7,
            confirmation_timeout_seconds: 60,
            retry_delay_seconds: 60,
            streak_includes_current_week: true,
            max_lookback_weeks: 52,
        }
    }
}

impl Default for TextGenerationConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 80,
            timeout_seconds: 15,
        }
    }
}

impl Default for BirthdaysConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: PathBuf::from("birthdays.db"),
            channel_id: ChannelId(0),
            check_time: "09:00".to_string(),
        }
    }
}

impl Default for FlightsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            page_url: "https://www.amc.af.mil/AMC-Travel-Site/Terminals/CONUS-Terminals/Joint-Base-Andrews-Passenger-Terminal/"
                .to_string(),
            link_marker: "72-Hour-Schedule".to_string(),
            data_file: PathBuf::from("flight_schedule.json"),
            channel_id: ChannelId(0),
            check_interval_hours: 24,
            timeout_seconds: 30,
        }
    }
}

impl Default for ConnectionsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            data_file: PathBuf::from("connection_chart.json"),
        }
    }
}

impl Default for WrappedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_file: PathBuf::from("server_wrapped_cache.json"),
            cache_ttl_hours: 24,
            timezone: "America/New_York".to_string(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            reference_id: String::new(),
            api_url: "https://api.fish.audio/v1/tts".to_string(),
            timeout_seconds: 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            directory: None,
        }
    }
}
