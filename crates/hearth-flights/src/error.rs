//! Flight schedule errors.

use hearth_common::HearthError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for flight schedule operations
pub type Result<T> = std::result::Result<T, FlightError>;

/// Errors raised while fetching, parsing or storing the schedule.
#[derive(Debug, Error)]
pub enum FlightError {
    /// An HTTP request failed or returned an error status.
    #[error("Failed to {action}: {source}")]
    Request {
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The terminal page has no schedule PDF link.
    #[error("Could not find a schedule PDF link containing '{0}'")]
    LinkNotFound(String),

    /// The configured page URL is not a URL.
    #[error("Invalid schedule page URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The PDF could not be turned into text.
    #[error("Failed to read the schedule PDF: {0}")]
    Pdf(String),

    /// The stored schedule could not be written.
    #[error("Failed to write flight schedule to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The schedule could not be serialized.
    #[error("Failed to serialize flight schedule: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<FlightError> for HearthError {
    fn from(err: FlightError) -> Self {
        match err {
            FlightError::Request { .. } => HearthError::network_with_source("Flight schedule request failed", err),
            other => HearthError::new(other.to_string()),
        }
    }
}
