//! Text posted by the rollover loop.

use hearth_common::{pluralize, UserId};

/// DM sent during the warning phase.
pub fn reminder(goal: u32, logged: usize) -> String {
    format!(
        "⚠️ Reminder: you've logged {logged} of {goal} workouts this week. \
         Log the rest before the week resets!"
    )
}

/// The batched announcement of everyone who met their goal, with streaks.
pub fn met_announcement(met: &[(UserId, u32)]) -> String {
    if met.is_empty() {
        return "🗓️ Weekly reset! Nobody hit their goal last week. Fresh start, let's go! 💪".to_string();
    }
    let mut message = String::from("🎉 **Weekly reset! These legends met their goal:** 🎉\n");
    for (user, streak) in met {
        message.push_str(&format!("• {}: {streak}-week streak 🔥\n", user.mention()));
    }
    message
}

/// A missed week below the escalation threshold.
pub fn missed(user: UserId, goal: u32, logged: usize, roast: &str) -> String {
    format!(
        "👎 {} logged {logged}/{goal} workouts last week. {roast}",
        user.mention()
    )
}

/// The escalation that asks for an acknowledgment reaction.
pub fn escalation(user: UserId, misses: u32, emoji: &str, window_days: u32) -> String {
    format!(
        "🚨 {} has missed their goal {} in a row. React with {emoji} within {} \
         to stay in the workout tracker, or you'll be removed.",
        user.mention(),
        pluralize(misses as usize, "week", "weeks"),
        pluralize(window_days as usize, "day", "days"),
    )
}

/// Posted when an escalation was acknowledged.
pub fn acknowledged(user: UserId) -> String {
    format!(
        "✅ {} acknowledged and is staying in the tracker. Don't make us ask again!",
        user.mention()
    )
}

/// Posted when an escalation expired without a reaction.
pub fn removed(user: UserId) -> String {
    format!(
        "🚪 {} didn't respond in time and has been removed from the workout tracker.",
        user.mention()
    )
}
