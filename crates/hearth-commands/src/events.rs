//! Typed gateway event dispatch.
//!
//! Raw serenity events are narrowed to the [`BotEvent`]s the bot reacts to,
//! then routed to a handler.

use hearth_common::ChannelId;
use poise::serenity_prelude as serenity;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::confirmation::WorkoutConfirmation;
use crate::framework::{Data, Error};
use crate::ids;

/// Gateway events handled by the bot.
#[derive(Debug, Clone, Copy)]
pub enum BotEvent<'a> {
    /// The shard is connected.
    Ready {
        /// Bot account name.
        user_name: &'a str,
        /// Guilds the bot is in.
        guilds: usize,
    },
    /// A message was created.
    MessageCreate(&'a serenity::Message),
}

impl<'a> BotEvent<'a> {
    /// Narrow a raw event; `None` for events the bot ignores.
    pub fn from_full_event(event: &'a serenity::FullEvent) -> Option<Self> {
        match event {
            serenity::FullEvent::Ready { data_about_bot } => Some(Self::Ready {
                user_name: &data_about_bot.user.name,
                guilds: data_about_bot.guilds.len(),
            }),
            serenity::FullEvent::Message { new_message } => Some(Self::MessageCreate(new_message)),
            _ => None,
        }
    }
}

/// The parts of a message that decide whether it may be a workout post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostFacts {
    /// Author is a bot account.
    pub author_is_bot: bool,
    /// Channel or thread the message was posted in.
    pub channel: ChannelId,
    /// Number of attachments.
    pub attachments: usize,
}

impl From<&serenity::Message> for PostFacts {
    fn from(message: &serenity::Message) -> Self {
        Self {
            author_is_bot: message.author.bot,
            channel: ids::channel(message.channel_id),
            attachments: message.attachments.len(),
        }
    }
}

/// Whether a post starts a confirmation dialogue, before the tracked check.
pub fn is_workout_candidate(post: &PostFacts, workout_thread: ChannelId) -> bool {
    workout_thread.0 != 0 && !post.author_is_bot && post.attachments > 0 && post.channel == workout_thread
}

/// Poise event handler entry point.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match BotEvent::from_full_event(event) {
        Some(BotEvent::Ready { user_name, guilds }) => {
            info!(guilds, "Bot connected as: {}", user_name);
            Ok(())
        }
        Some(BotEvent::MessageCreate(message)) => on_message(ctx, message, data).await,
        None => Ok(()),
    }
}

async fn on_message(ctx: &serenity::Context, message: &serenity::Message, data: &Data) -> Result<(), Error> {
    let config = data.config.get();
    if !is_workout_candidate(&PostFacts::from(message), config.workouts.thread_id) {
        return Ok(());
    }

    let user = ids::user(message.author.id);
    if !data.tracker.is_tracked(user).await {
        debug!(user = %user, "Ignoring picture from a user who is not tracked");
        return Ok(());
    }

    let confirmation = WorkoutConfirmation::new(
        data.tracker.clone(),
        Duration::from_secs(config.workouts.confirmation_timeout_seconds),
    );
    let ctx = ctx.clone();
    let message = message.clone();
    tokio::spawn(async move {
        if let Err(e) = confirmation.run(&ctx, &message).await {
            warn!(user = %user, error = %e, "Workout confirmation failed");
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREAD: ChannelId = ChannelId(1_111);

    fn post(author_is_bot: bool, channel: ChannelId, attachments: usize) -> PostFacts {
        PostFacts {
            author_is_bot,
            channel,
            attachments,
        }
    }

    #[test]
    fn test_picture_in_thread_is_a_candidate() {
        assert!(is_workout_candidate(&post(false, THREAD, 1), THREAD));
        assert!(is_workout_candidate(&post(false, THREAD, 3), THREAD));
    }

    #[test]
    fn test_non_candidates() {
        assert!(!is_workout_candidate(&post(true, THREAD, 1), THREAD));
        assert!(!is_workout_candidate(&post(false, THREAD, 0), THREAD));
        assert!(!is_workout_candidate(&post(false, ChannelId(2_222), 1), THREAD));
    }

    #[test]
    fn test_unset_thread_matches_nothing() {
        assert!(!is_workout_candidate(&post(false, ChannelId(0), 1), ChannelId(0)));
    }
}
