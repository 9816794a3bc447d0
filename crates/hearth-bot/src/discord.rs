//! Discord side of the tracker's notifier port.

use async_trait::async_trait;
use hearth_commands::ids;
use hearth_common::{ChannelId, HearthError, MessageId, UserId};
use hearth_workouts::Notifier;
use poise::serenity_prelude::{self as serenity, CreateMessage, Http, ReactionType};
use std::sync::Arc;

/// Reaction users fetched per request; Discord's maximum.
const REACTION_PAGE: u8 = 100;

/// [`Notifier`] over the serenity HTTP client.
#[derive(Clone)]
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    /// Wrap the client's HTTP handle.
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

fn unset(what: &str, id: u64) -> HearthError {
    HearthError::discord(format!("{what} id {id} is not set"))
}

fn api_error(action: &str, source: serenity::Error) -> HearthError {
    HearthError::discord_with_source(format!("Failed to {action}"), source)
}

/// Reaction for a configured emoji: unicode, or `<:name:id>` for a custom one.
pub fn reaction_for(emoji: &str) -> ReactionType {
    ReactionType::try_from(emoji).unwrap_or_else(|_| ReactionType::Unicode(emoji.to_string()))
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn direct_message(&self, user: UserId, content: &str) -> Result<(), HearthError> {
        let id = ids::to_user(user).ok_or_else(|| unset("user", user.0))?;
        id.direct_message(&*self.http, CreateMessage::new().content(content))
            .await
            .map_err(|e| api_error("send direct message", e))?;
        Ok(())
    }

    async fn post(&self, channel: ChannelId, content: &str) -> Result<MessageId, HearthError> {
        let id = ids::to_channel(channel).ok_or_else(|| unset("channel", channel.0))?;
        let message = id
            .say(&*self.http, content)
            .await
            .map_err(|e| api_error("post channel message", e))?;
        Ok(ids::message(message.id))
    }

    async fn has_reacted(
        &self,
        channel: ChannelId,
        message: MessageId,
        user: UserId,
        emoji: &str,
    ) -> Result<bool, HearthError> {
        let channel_id = ids::to_channel(channel).ok_or_else(|| unset("channel", channel.0))?;
        let message_id = ids::to_message(message).ok_or_else(|| unset("message", message.0))?;
        let reaction = reaction_for(emoji);

        let mut after: Option<serenity::UserId> = None;
        loop {
            let page = channel_id
                .reaction_users(&*self.http, message_id, reaction.clone(), Some(REACTION_PAGE), after)
                .await
                .map_err(|e| api_error("read reactions", e))?;

            if page.iter().any(|reactor| ids::user(reactor.id) == user) {
                return Ok(true);
            }
            match page.last() {
                Some(last) if page.len() == usize::from(REACTION_PAGE) => after = Some(last.id),
                _ => return Ok(false),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_for_unicode_emoji() {
        assert_eq!(reaction_for("✅"), ReactionType::Unicode("✅".to_string()));
    }

    #[test]
    fn test_reaction_for_custom_emoji() {
        match reaction_for("<:flex:123456789012345678>") {
            ReactionType::Custom { id, name, .. } => {
                assert_eq!(id.get(), 123_456_789_012_345_678);
                assert_eq!(name.as_deref(), Some("flex"));
            }
            other => panic!("expected a custom emoji, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unset_ids_fail_without_a_request() {
        let notifier = DiscordNotifier::new(Arc::new(Http::new("token")));

        assert!(notifier.post(ChannelId(0), "hi").await.is_err());
        assert!(notifier.direct_message(UserId(0), "hi").await.is_err());
    }
}
