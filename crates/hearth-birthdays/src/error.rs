//! Birthday errors.

use hearth_common::HearthError;
use thiserror::Error;

/// Result type alias for birthday operations
pub type Result<T> = std::result::Result<T, BirthdayError>;

/// Errors raised by the birthday store and date parsing.
#[derive(Debug, Error)]
pub enum BirthdayError {
    /// The date is not a valid `MM-DD` calendar day.
    #[error("Invalid date '{0}'. Please use MM-DD (e.g., 12-25).")]
    InvalidDate(String),

    /// A database operation failed.
    #[error("Birthday database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<BirthdayError> for HearthError {
    fn from(err: BirthdayError) -> Self {
        match err {
            BirthdayError::InvalidDate(date) => {
                HearthError::validation_field(format!("Invalid date '{date}'"), "date")
            }
            BirthdayError::Database(e) => HearthError::database_with_source("Birthday query failed", e),
        }
    }
}
