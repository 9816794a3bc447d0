//! Workout tracker commands: opting in and out, the leaderboard and personal
//! standing.

use chrono::Utc;
use hearth_common::{pluralize, UserId};
use hearth_workouts::{LeaderboardEntry, TrackerError, WorkoutStatus};
use tracing::{debug, warn};

use crate::framework::{reply_ephemeral, Context, Error};
use crate::ids;

/// Shown in the leaderboard when a user lookup fails.
pub const UNKNOWN_USER: &str = "Unknown user";

const NOT_TRACKED: &str = "You're not currently participating in the tracker. Use `/set_goal` to join!";

/// Leaderboard text for entries already in rank order, with resolved names.
pub fn leaderboard_message(entries: &[(LeaderboardEntry, String)]) -> Option<String> {
    if entries.is_empty() {
        return None;
    }
    let mut message = String::from("**🏋️ Workout Leaderboard 🏋️**\n\n");
    for (rank, (entry, name)) in entries.iter().enumerate() {
        message.push_str(&format!(
            "**{}. {name}: {}**\n",
            rank + 1,
            pluralize(entry.total, "workout", "workouts")
        ));
    }
    Some(message)
}

/// Personal standing as shown by `/my_workouts`.
pub fn status_message(status: &WorkoutStatus) -> String {
    format!(
        "🏋️ **Your workouts**\n\
         This week: {}/{}\n\
         All-time: {}\n\
         Streak: {}",
        status.this_week,
        status.goal,
        pluralize(status.total, "workout", "workouts"),
        pluralize(status.streak as usize, "week", "weeks"),
    )
}

async fn announce(ctx: Context<'_>, content: String) {
    if let Err(e) = ctx.channel_id().say(ctx.serenity_context(), content).await {
        warn!(channel = %ctx.channel_id(), error = %e, "Could not post tracker announcement");
    }
}

async fn resolve_name(ctx: Context<'_>, user: UserId) -> String {
    let Some(id) = ids::to_user(user) else {
        return UNKNOWN_USER.to_string();
    };
    match id.to_user(ctx.serenity_context()).await {
        Ok(found) => {
            if let Some(guild_id) = ctx.guild_id() {
                if let Some(nick) = found.nick_in(ctx.serenity_context(), guild_id).await {
                    return nick;
                }
            }
            found.global_name.clone().unwrap_or_else(|| found.name.clone())
        }
        Err(e) => {
            debug!(user = %user, error = %e, "Could not resolve leaderboard name");
            UNKNOWN_USER.to_string()
        }
    }
}

/// Set your weekly workout goal and opt in to tracking.
#[poise::command(slash_command, guild_only)]
pub async fn set_goal(
    ctx: Context<'_>,
    #[description = "Workouts per week (at least 1)"] goal_per_week: i64,
) -> Result<(), Error> {
    let user = ids::user(ctx.author().id);

    match ctx.data().tracker.set_goal(user, goal_per_week, Utc::now()).await {
        Ok(_) => {}
        Err(TrackerError::InvalidGoal(_)) => {
            return reply_ephemeral(ctx, "Your goal must be at least 1 workout per week.").await;
        }
        Err(e) => return Err(e.into()),
    }

    reply_ephemeral(
        ctx,
        format!("Your weekly workout goal is set to {goal_per_week} workouts! Let's get moving!"),
    )
    .await?;
    announce(
        ctx,
        format!(
            "📢 {} has joined the workout tracker with a goal of {goal_per_week} workouts per week!",
            user.mention()
        ),
    )
    .await;
    Ok(())
}

/// Opt out of the workout tracker.
#[poise::command(slash_command, guild_only)]
pub async fn opt_out(ctx: Context<'_>) -> Result<(), Error> {
    let user = ids::user(ctx.author().id);

    match ctx.data().tracker.opt_out(user).await {
        Ok(()) => {}
        Err(TrackerError::NotTracked(_)) => return reply_ephemeral(ctx, NOT_TRACKED).await,
        Err(e) => return Err(e.into()),
    }

    ctx.say("You have opted out of the workout tracker. But remember, quitting is for the weak! 😠")
        .await?;
    announce(
        ctx,
        format!("📢 {} has quit the workout tracker. Shame! 😡", user.mention()),
    )
    .await;
    Ok(())
}

/// View the all-time workout leaderboard.
#[poise::command(slash_command, guild_only)]
pub async fn leaderboard(ctx: Context<'_>) -> Result<(), Error> {
    // Name lookups can outlast the interaction deadline.
    ctx.defer().await?;

    let ranking = ctx.data().tracker.leaderboard().await;
    let mut named = Vec::with_capacity(ranking.len());
    for entry in ranking {
        let name = resolve_name(ctx, entry.user).await;
        named.push((entry, name));
    }

    match leaderboard_message(&named) {
        Some(message) => {
            ctx.say(message).await?;
        }
        None => {
            ctx.say("No one has joined the tracker yet! Be the first to start with `/set_goal`!")
                .await?;
        }
    }
    Ok(())
}

/// Show your workouts this week, all-time, your goal and your streak.
#[poise::command(slash_command)]
pub async fn my_workouts(ctx: Context<'_>) -> Result<(), Error> {
    let user = ids::user(ctx.author().id);

    match ctx.data().tracker.status(user, Utc::now()).await {
        Some(status) => reply_ephemeral(ctx, status_message(&status)).await,
        None => reply_ephemeral(ctx, NOT_TRACKED).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaderboard_message_ranks_and_names() {
        let entries = vec![
            (
                LeaderboardEntry {
                    user: UserId(2),
                    total: 12,
                },
                "Ada".to_string(),
            ),
            (
                LeaderboardEntry {
                    user: UserId(1),
                    total: 1,
                },
                UNKNOWN_USER.to_string(),
            ),
        ];

        let message = leaderboard_message(&entries).unwrap();
        assert!(message.contains("**1. Ada: 12 workouts**"));
        assert!(message.contains("**2. Unknown user: 1 workout**"));
    }

    #[test]
    fn test_empty_leaderboard() {
        assert!(leaderboard_message(&[]).is_none());
    }

    #[test]
    fn test_status_message() {
        let message = status_message(&WorkoutStatus {
            goal: 3,
            this_week: 2,
            total: 40,
            streak: 1,
        });
        assert!(message.contains("This week: 2/3"));
        assert!(message.contains("All-time: 40 workouts"));
        assert!(message.contains("Streak: 1 week"));
    }
}
