//! The yes/no dialogue that turns a workout picture into a logged workout.
//!
//! The prompt waits for the author's answer in the same channel. Nothing is
//! locked while waiting; the tracker is only touched once `yes` arrives.

use chrono::Utc;
use hearth_common::UserId;
use hearth_workouts::{TrackerError, WorkoutTracker};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::framework::Error;
use crate::ids;

/// An accepted answer to the confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationAnswer {
    /// Log the workout.
    Yes,
    /// Discard the picture.
    No,
}

impl ConfirmationAnswer {
    /// Parse a reply; anything but a trimmed, case-insensitive `yes` or `no`
    /// is not an answer.
    pub fn parse(content: &str) -> Option<Self> {
        let content = content.trim();
        if content.eq_ignore_ascii_case("yes") {
            Some(Self::Yes)
        } else if content.eq_ignore_ascii_case("no") {
            Some(Self::No)
        } else {
            None
        }
    }
}

/// The question posted after a workout picture.
pub fn prompt(user: UserId) -> String {
    format!(
        "{}, did you just post a workout image? Reply with 'yes' or 'no'.",
        user.mention()
    )
}

/// Posted after a confirmed workout.
pub fn logged(user: UserId, total: usize) -> String {
    format!("Workout logged for {}! Total workouts: {total}.", user.mention())
}

/// Runs one confirmation dialogue per workout picture.
#[derive(Clone)]
pub struct WorkoutConfirmation {
    tracker: Arc<WorkoutTracker>,
    timeout: Duration,
}

impl WorkoutConfirmation {
    /// Create a dialogue runner that waits up to `timeout` for an answer.
    pub fn new(tracker: Arc<WorkoutTracker>, timeout: Duration) -> Self {
        Self { tracker, timeout }
    }

    /// Ask about `post` and log a workout on `yes`.
    ///
    /// Returns the new all-time total when a workout was logged.
    pub async fn run(&self, ctx: &serenity::Context, post: &serenity::Message) -> Result<Option<usize>, Error> {
        let user = ids::user(post.author.id);
        let prompt_message = post.channel_id.say(ctx, prompt(user)).await?;

        let reply = serenity::MessageCollector::new(ctx)
            .author_id(post.author.id)
            .channel_id(post.channel_id)
            .timeout(self.timeout)
            .filter(|message| ConfirmationAnswer::parse(&message.content).is_some())
            .await;

        let outcome = match &reply {
            Some(reply) if ConfirmationAnswer::parse(&reply.content) == Some(ConfirmationAnswer::Yes) => {
                self.log(ctx, post.channel_id, user).await
            }
            Some(_) => {
                debug!(user = %user, "Workout picture declined");
                Ok(None)
            }
            None => {
                debug!(user = %user, "Workout confirmation timed out");
                Ok(None)
            }
        };

        delete_best_effort(ctx, &prompt_message).await;
        if let Some(reply) = &reply {
            delete_best_effort(ctx, reply).await;
        }
        outcome
    }

    async fn log(
        &self,
        ctx: &serenity::Context,
        channel: serenity::ChannelId,
        user: UserId,
    ) -> Result<Option<usize>, Error> {
        let total = match self.tracker.log_workout(user, Utc::now()).await {
            Ok(total) => total,
            Err(TrackerError::NotTracked(_)) => {
                debug!(user = %user, "User opted out before confirming, workout not logged");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        info!(user = %user, total, "Workout confirmed");
        if let Err(e) = channel.say(ctx, logged(user, total)).await {
            warn!(user = %user, error = %e, "Could not post workout total");
        }
        Ok(Some(total))
    }
}

async fn delete_best_effort(ctx: &serenity::Context, message: &serenity::Message) {
    if let Err(e) = message.delete(ctx).await {
        debug!(message = %message.id, error = %e, "Could not delete confirmation message");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_answers_are_trimmed_and_case_insensitive() {
        assert_eq!(ConfirmationAnswer::parse("yes"), Some(ConfirmationAnswer::Yes));
        assert_eq!(ConfirmationAnswer::parse("  YeS \n"), Some(ConfirmationAnswer::Yes));
        assert_eq!(ConfirmationAnswer::parse("No"), Some(ConfirmationAnswer::No));
    }

    #[test]
    fn test_other_replies_are_not_answers() {
        for content in ["y", "yes!", "nope", "", "yes please", "n o"] {
            assert_eq!(ConfirmationAnswer::parse(content), None, "{content:?}");
        }
    }

    #[test]
    fn test_dialogue_text() {
        assert_eq!(
            prompt(UserId(7)),
            "<@7>, did you just post a workout image? Reply with 'yes' or 'no'."
        );
        assert_eq!(logged(UserId(7), 12), "Workout logged for <@7>! Total workouts: 12.");
    }

    proptest! {
        #[test]
        fn prop_answer_only_for_yes_or_no(content in "\\PC{0,12}") {
            if let Some(answer) = ConfirmationAnswer::parse(&content) {
                let expected = match answer {
                    ConfirmationAnswer::Yes => "yes",
                    ConfirmationAnswer::No => "no",
                };
                prop_assert_eq!(content.trim().to_ascii_lowercase(), expected);
            }
        }
    }
}
