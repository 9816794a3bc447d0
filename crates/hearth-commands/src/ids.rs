//! Conversions between Hearth ids and serenity ids.
//!
//! Serenity ids are non-zero; an unset id in the configuration is `0` and
//! converts to `None`.

use hearth_common::{ChannelId, MessageId, UserId};
use poise::serenity_prelude as serenity;
use std::num::NonZeroU64;

/// Hearth id of a Discord user.
pub fn user(id: serenity::UserId) -> UserId {
    UserId(id.get())
}

/// Hearth id of a Discord channel.
pub fn channel(id: serenity::ChannelId) -> ChannelId {
    ChannelId(id.get())
}

/// Hearth id of a Discord message.
pub fn message(id: serenity::MessageId) -> MessageId {
    MessageId(id.get())
}

/// Serenity id of a user, if non-zero.
pub fn to_user(id: UserId) -> Option<serenity::UserId> {
    NonZeroU64::new(id.0).map(serenity::UserId::from)
}

/// Serenity id of a channel, if non-zero.
pub fn to_channel(id: ChannelId) -> Option<serenity::ChannelId> {
    NonZeroU64::new(id.0).map(serenity::ChannelId::from)
}

/// Serenity id of a message, if non-zero.
pub fn to_message(id: MessageId) -> Option<serenity::MessageId> {
    NonZeroU64::new(id.0).map(serenity::MessageId::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_common::test_utils::discord_fixtures::{test_message_id, test_user_id};

    #[test]
    fn test_round_trip_non_zero_ids() {
        let original = test_user_id();
        assert_eq!(user(to_user(original).unwrap()), original);
        assert_eq!(message(to_message(test_message_id()).unwrap()), test_message_id());

        let channel_id = to_channel(ChannelId(5)).unwrap();
        assert_eq!(channel(channel_id), ChannelId(5));
    }

    #[test]
    fn test_zero_ids_are_unset() {
        assert!(to_user(UserId(0)).is_none());
        assert!(to_channel(ChannelId(0)).is_none());
        assert!(to_message(MessageId(0)).is_none());
    }
}
