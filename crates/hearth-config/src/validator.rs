//! Runtime validation of a loaded configuration.

use crate::schema::Config;

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Collects every problem in the configuration, in a stable order.
    pub fn problems(config: &Config) -> Vec<String> {
        let mut problems = Vec::new();

        if config.discord.token.trim().is_empty() {
            problems.push("Discord token cannot be empty".to_string());
        }

        let workouts = &config.workouts;
        if let Err(e) = workouts.timezone() {
            problems.push(e.to_string());
        }
        if workouts.miss_threshold == 0 {
            problems.push("workouts.miss_threshold must be at least 1".to_string());
        }
        if workouts.warning_hours == 0 || workouts.warning_hours >= 24 * 7 {
            problems.push("workouts.warning_hours must be between 1 and 167".to_string());
        }
        if workouts.acknowledgment_emoji.trim().is_empty() {
            problems.push("workouts.acknowledgment_emoji cannot be empty".to_string());
        }
        if workouts.confirmation_timeout_seconds == 0 {
            problems.push("workouts.confirmation_timeout_seconds must be positive".to_string());
        }
        if workouts.max_lookback_weeks == 0 {
            problems.push("workouts.max_lookback_weeks must be at least 1".to_string());
        }
        if workouts.retry_delay_seconds == 0 {
            problems.push("workouts.retry_delay_seconds must be positive".to_string());
        }
        if workouts.acknowledgment_window_days == 0 {
            problems.push("workouts.acknowledgment_window_days must be at least 1".to_string());
        }

        if config.birthdays.enabled {
            if let Err(e) = config.birthdays.check_time() {
                problems.push(e.to_string());
            }
        }

        let flights = &config.flights;
        if flights.enabled {
            if flights.page_url.trim().is_empty() {
                problems.push("flights.page_url cannot be empty".to_string());
            }
            if flights.check_interval_hours == 0 {
                problems.push("flights.check_interval_hours must be at least 1".to_string());
            }
            if flights.timeout_seconds == 0 {
                problems.push("flights.timeout_seconds must be positive".to_string());
            }
        }

        if config.wrapped.enabled {
            if let Err(e) = config.wrapped.timezone() {
                problems.push(e.to_string());
            }
            if config.wrapped.cache_ttl_hours == 0 {
                problems.push("wrapped.cache_ttl_hours must be at least 1".to_string());
            }
        }

        let speech = &config.speech;
        if speech.is_enabled() {
            if speech.reference_id.trim().is_empty() {
                problems.push("speech.reference_id must be set when speech.api_key is".to_string());
            }
            if speech.timeout_seconds == 0 {
                problems.push("speech.timeout_seconds must be positive".to_string());
            }
        }

        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.discord.token = "token".to_string();
        config
    }

    #[test]
    fn test_defaults_only_miss_token() {
        let problems = ConfigValidator::problems(&Config::default());
        assert_eq!(problems, vec!["Discord token cannot be empty".to_string()]);
    }

    #[test]
    fn test_collects_multiple_problems() {
        let mut config = valid_config();
        config.workouts.timezone = "Atlantis/Capital".to_string();
        config.workouts.miss_threshold = 0;
        config.birthdays.check_time = "nine".to_string();

        let problems = ConfigValidator::problems(&config);
        assert_eq!(problems.len(), 3);
        assert!(problems[0].contains("Atlantis/Capital"));
    }

    #[test]
    fn test_zero_retry_delay_and_window_are_rejected() {
        let mut config = valid_config();
        config.workouts.retry_delay_seconds = 0;
        config.workouts.acknowledgment_window_days = 0;

        let problems = ConfigValidator::problems(&config);
        assert_eq!(
            problems,
            vec![
                "workouts.retry_delay_seconds must be positive".to_string(),
                "workouts.acknowledgment_window_days must be at least 1".to_string(),
            ]
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_enabled_cogs_are_checked() {
        let mut config = valid_config();
        config.flights.enabled = true;
        config.flights.check_interval_hours = 0;
        config.wrapped.timezone = "Nowhere/Special".to_string();
        config.speech.api_key = "key".to_string();

        let problems = ConfigValidator::problems(&config);
        assert_eq!(problems.len(), 3);
        assert!(problems[0].starts_with("flights.check_interval_hours"));
        assert!(problems[1].contains("Nowhere/Special"));
        assert!(problems[2].starts_with("speech.reference_id"));

        config.flights.enabled = false;
        config.wrapped.enabled = false;
        config.speech.api_key.clear();
        assert!(ConfigValidator::problems(&config).is_empty());
    }

    #[test]
    fn test_disabled_birthdays_skip_time_check() {
        let mut config = valid_config();
        config.birthdays.enabled = false;
        config.birthdays.check_time = "whenever".to_string();
        assert!(ConfigValidator::problems(&config).is_empty());
    }
}
