//! Configuration loading utilities

use crate::Config;
use hearth_common::{ChannelId, HearthError};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[source] HearthError),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParseError {
        var: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<ConfigError> for HearthError {
    fn from(err: ConfigError) -> Self {
        HearthError::config_with_source("Failed to load configuration", err)
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file with environment variable overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        info!("Loading configuration from {}", path.as_ref().display());
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config = Self::parse_yaml(&content)?;

        Self::apply_env_overrides(&mut config, |var| env::var(var).ok())?;
        config.validate().map_err(ConfigError::ValidationError)?;

        Ok(config)
    }

    /// Load configuration from `HEARTH_CONFIG_PATH`, `config.yaml`, `config.yml`,
    /// or defaults, in that order, then apply environment overrides.
    pub fn load() -> Result<Config, ConfigError> {
        match Self::locate(env::var("HEARTH_CONFIG_PATH").ok()) {
            Some(path) => Self::load_config(path),
            None => {
                info!("No configuration file found, using defaults with environment overrides");
                let mut config = Config::default();
                Self::apply_env_overrides(&mut config, |var| env::var(var).ok())?;
                config.validate().map_err(ConfigError::ValidationError)?;
                Ok(config)
            }
        }
    }

    /// Parses YAML without overrides or validation.
    pub fn parse_yaml(content: &str) -> Result<Config, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    fn locate(explicit: Option<String>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        ["config.yaml", "config.yml"]
            .into_iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Apply environment variable overrides using the given lookup.
    pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("DISCORD_TOKEN") {
            config.discord.token = token;
        }

        if let Some(api_key) = lookup("OPENAI_API_KEY") {
            config.text_generation.api_key = api_key;
        }

        if let Some(path) = lookup("HEARTH_WORKOUT_DATA") {
            config.workouts.data_file = PathBuf::from(path);
        }

        if let Some(path) = lookup("HEARTH_BIRTHDAY_DB") {
            config.birthdays.database_path = PathBuf::from(path);
        }

        if let Some(timezone) = lookup("HEARTH_TIMEZONE") {
            config.workouts.timezone = timezone;
        }

        if let Some(level) = lookup("HEARTH_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(id) = lookup("HEARTH_WORKOUT_THREAD_ID") {
            config.workouts.thread_id = parse_channel("HEARTH_WORKOUT_THREAD_ID", &id)?;
        }

        if let Some(id) = lookup("HEARTH_ANNOUNCEMENT_CHANNEL_ID") {
            config.workouts.announcement_channel_id =
                parse_channel("HEARTH_ANNOUNCEMENT_CHANNEL_ID", &id)?;
        }

        if let Some(token) = lookup("FISH_TOKEN") {
            config.speech.api_key = token;
        }

        if let Some(model) = lookup("MODEL_ID") {
            config.speech.reference_id = model;
        }

        if let Some(id) = lookup("HEARTH_FLIGHT_CHANNEL_ID") {
            config.flights.channel_id = parse_channel("HEARTH_FLIGHT_CHANNEL_ID", &id)?;
        }

        debug!("Environment overrides applied");
        Ok(())
    }
}

fn parse_channel(var: &str, value: &str) -> Result<ChannelId, ConfigError> {
    value
        .trim()
        .parse()
        .map(ChannelId)
        .map_err(|e| ConfigError::EnvParseError {
            var: var.to_string(),
            source: Box::new(e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        let lookup = lookup_from(&[
            ("DISCORD_TOKEN", "abc.def.ghi"),
            ("HEARTH_TIMEZONE", "Europe/Berlin"),
            ("HEARTH_WORKOUT_THREAD_ID", "1327019216510910546"),
        ]);

        ConfigLoader::apply_env_overrides(&mut config, lookup).unwrap();

        assert_eq!(config.discord.token, "abc.def.ghi");
        assert_eq!(config.workouts.timezone, "Europe/Berlin");
        assert_eq!(config.workouts.thread_id, ChannelId(1_327_019_216_510_910_546));
    }

    #[test]
    fn test_speech_and_flight_overrides() {
        let mut config = Config::default();
        assert!(!config.speech.is_enabled());
        let lookup = lookup_from(&[
            ("FISH_TOKEN", "fish"),
            ("MODEL_ID", "voice-1"),
            ("HEARTH_FLIGHT_CHANNEL_ID", "77"),
        ]);

        ConfigLoader::apply_env_overrides(&mut config, lookup).unwrap();

        assert!(config.speech.is_enabled());
        assert_eq!(config.speech.reference_id, "voice-1");
        assert_eq!(config.flights.channel_id, ChannelId(77));
    }

    #[test]
    fn test_bad_channel_override_is_reported() {
        let mut config = Config::default();
        let lookup = lookup_from(&[("HEARTH_ANNOUNCEMENT_CHANNEL_ID", "general")]);

        let err = ConfigLoader::apply_env_overrides(&mut config, lookup).unwrap_err();
        assert!(err.to_string().contains("HEARTH_ANNOUNCEMENT_CHANNEL_ID"));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = ConfigLoader::parse_yaml("discord:\n  token: t\nworkouts:\n  miss_threshold: 3\n").unwrap();
        assert_eq!(config.workouts.miss_threshold, 3);
        assert_eq!(config.workouts.warning_hours, 6);
        assert_eq!(config.birthdays.check_time, "09:00");
        assert!(!config.flights.enabled);
        assert!(config.connections.enabled);
        assert_eq!(config.wrapped.cache_ttl_hours, 24);
    }
}
