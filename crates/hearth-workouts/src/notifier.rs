//! Outbound chat operations used by the rollover loop.

use async_trait::async_trait;
use hearth_common::{ChannelId, HearthError, MessageId, UserId};

/// The chat-platform side of the tracker.
///
/// The bot binary implements this over the Discord HTTP client; tests use a
/// recording fake.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a direct message to a user.
    async fn direct_message(&self, user: UserId, content: &str) -> Result<(), HearthError>;

    /// Post a message to a channel and return its id.
    async fn post(&self, channel: ChannelId, content: &str) -> Result<MessageId, HearthError>;

    /// Whether `user` reacted to a message with `emoji`.
    async fn has_reacted(
        &self,
        channel: ChannelId,
        message: MessageId,
        user: UserId,
        emoji: &str,
    ) -> Result<bool, HearthError>;
}
