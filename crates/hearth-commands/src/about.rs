//! About command implementation using Poise's command macro.

use chrono::{DateTime, Utc};

use crate::framework::{Context, Error};

/// Human-readable uptime, e.g. `2d 3h 4m`.
pub fn format_uptime(started_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - started_at).num_minutes().max(0);
    let (days, hours, minutes) = (elapsed / 1440, elapsed / 60 % 24, elapsed % 60);
    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Shows information about the bot.
#[poise::command(slash_command)]
pub async fn about(ctx: Context<'_>) -> Result<(), Error> {
    let uptime = format_uptime(ctx.data().started_at, Utc::now());
    let response = format!(
        "**Hearth Bot**\n\
         Weekly workout goals with streaks, birthday reminders, flight schedules,\n\
         connection charts, a yearly server wrapped and voice channel audio.\n\
         Built with Rust and the Poise framework.\n\
         Uptime: {uptime}"
    );

    ctx.say(response).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use hearth_common::test_utils::monday_anchor;

    #[test]
    fn test_format_uptime() {
        let start = monday_anchor();
        assert_eq!(format_uptime(start, start + Duration::seconds(59)), "0m");
        assert_eq!(format_uptime(start, start + Duration::minutes(125)), "2h 5m");
        assert_eq!(
            format_uptime(start, start + Duration::days(2) + Duration::minutes(61)),
            "2d 1h 1m"
        );
        // A clock step backwards never renders a negative uptime.
        assert_eq!(format_uptime(start, start - Duration::hours(1)), "0m");
    }
}
