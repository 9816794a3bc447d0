//! Test utilities and shared test helpers for Hearth Bot.
//!
//! Fixtures used by unit and integration tests across the workspace. Enabled
//! with the `testing` feature.

use chrono::{DateTime, TimeZone, Utc};

/// Test fixture for a UTC timestamp.
pub fn mock_timestamp(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
        .single()
        .expect("fixture timestamp must be valid")
}

/// A Monday at midnight UTC, convenient as a week boundary anchor.
pub fn monday_anchor() -> DateTime<Utc> {
    mock_timestamp(2024, 1, 1, 0, 0, 0)
}

/// Create a temporary directory for tests that automatically cleans up.
#[cfg(feature = "tempfile")]
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Discord-related test utilities.
pub mod discord_fixtures {
    use crate::{ChannelId, MessageId, UserId};

    /// Create a test channel ID.
    pub fn test_channel_id() -> ChannelId {
        ChannelId(123_456_789_012_345_678)
    }

    /// Create a test user ID.
    pub fn test_user_id() -> UserId {
        UserId(987_654_321_098_765_432)
    }

    /// Create a test message ID.
    pub fn test_message_id() -> MessageId {
        MessageId(555_000_111_222_333_444)
    }

    /// Create multiple distinct test user IDs.
    pub fn test_user_ids(count: usize) -> Vec<UserId> {
        (0..count)
            .map(|i| UserId(100_000_000_000_000_000 + i as u64))
            .collect()
    }
}
