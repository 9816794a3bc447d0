//! Application-wide error types using thiserror.

use hearth_birthdays::BirthdayError;
use hearth_common::HearthError;
use hearth_config::ConfigError;
use hearth_flights::FlightError;
use hearth_graphs::ConnectionError;
use hearth_workouts::TrackerError;
use poise::serenity_prelude as serenity;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum BotError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Shared-layer error (invalid timezone, check time, logging setup).
    #[error(transparent)]
    Common(#[from] HearthError),

    /// The workout state could not be loaded or saved.
    #[error("Workout tracker error: {0}")]
    Tracker(#[from] TrackerError),

    /// The birthday database could not be opened.
    #[error("Birthday store error: {0}")]
    Birthdays(#[from] BirthdayError),

    /// The flight schedule fetcher could not be built.
    #[error("Flight schedule error: {0}")]
    Flights(#[from] FlightError),

    /// The connections file could not be read.
    #[error("Connection store error: {0}")]
    Connections(#[from] ConnectionError),

    /// Discord/Serenity error.
    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),
}

/// Result type for the bot application.
pub type BotResult<T> = Result<T, BotError>;
