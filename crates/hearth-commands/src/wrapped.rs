//! The yearly server wrapped.

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use futures::future::join_all;
use hearth_graphs::message_counts::AVATAR_SIZE;
use hearth_graphs::{
    fetch_avatar, render_activity_chart, render_message_counts, render_word_cloud, snowflake_at, year_start,
    ActivityStats, MessageSample, UserBar, WrappedCache,
};
use poise::serenity_prelude as serenity;
use tracing::{debug, info, warn};

use crate::framework::{CommandError, Context, Error};
use crate::ids;

const PAGE_SIZE: u8 = 100;

fn cache<'a>(ctx: &Context<'a>) -> Result<&'a WrappedCache, Error> {
    ctx.data()
        .wrapped
        .as_ref()
        .ok_or_else(|| CommandError::CogDisabled("server wrapped").into())
}

/// Text sent with the three images.
pub fn wrapped_reply(most_reacted: &str) -> String {
    format!("🎉 Here's your Server Wrapped!\n\n**Most Reacted Messages:**\n{most_reacted}")
}

/// Timezone abbreviation at `now`, e.g. `EST`.
pub fn timezone_label(tz: Tz, now: DateTime<Utc>) -> String {
    now.with_timezone(&tz).format("%Z").to_string()
}

fn sample(message: &serenity::Message) -> MessageSample {
    MessageSample {
        channel_id: ids::channel(message.channel_id),
        message_id: ids::message(message.id),
        author_id: ids::user(message.author.id),
        author_name: message.author.display_name().to_string(),
        author_avatar: Some(message.author.face()),
        author_is_bot: message.author.bot,
        content: message.content.clone(),
        sent_at: Utc
            .timestamp_opt(message.timestamp.unix_timestamp(), 0)
            .single()
            .unwrap_or_default(),
        reactions: message.reactions.iter().map(|r| r.count).sum(),
    }
}

/// Read every text channel from `since` onward. Channels the bot cannot read are skipped.
async fn collect(ctx: Context<'_>, guild_id: serenity::GuildId, tz: Tz, since: DateTime<Utc>) -> Result<ActivityStats, Error> {
    let mut stats = ActivityStats::default();
    let channels = guild_id.channels(ctx).await?;
    let first_id = serenity::MessageId::new(snowflake_at(since).max(1));

    for channel in channels.values().filter(|c| c.kind == serenity::ChannelType::Text) {
        let mut after = first_id;
        let mut read = 0usize;
        loop {
            let page = match channel
                .id
                .messages(ctx, serenity::GetMessages::new().after(after).limit(PAGE_SIZE))
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    warn!(channel = %channel.name, error = %e, "Cannot read channel history, skipping");
                    break;
                }
            };
            let Some(newest) = page.iter().map(|m| m.id).max() else {
                break;
            };
            for message in &page {
                stats.record(&sample(message), tz);
            }
            read += page.len();
            after = newest;
            if page.len() < usize::from(PAGE_SIZE) {
                break;
            }
        }
        debug!(channel = %channel.name, messages = read, "Read channel history");
    }
    Ok(stats)
}

/// Bars for every author, with avatars where they download.
async fn user_bars(http: &reqwest::Client, stats: &ActivityStats) -> Vec<UserBar> {
    join_all(stats.message_counts.iter().map(|(id, &count)| async move {
        let author = stats.authors.get(id);
        let avatar = match author.and_then(|a| a.avatar_url.as_deref()) {
            Some(url) => fetch_avatar(http, url, AVATAR_SIZE)
                .await
                .map_err(|e| warn!(error = %e, "Could not fetch avatar for message counts"))
                .ok(),
            None => None,
        };
        UserBar {
            name: author.map_or_else(|| format!("User({id})"), |a| a.name.clone()),
            count,
            avatar,
        }
    }))
    .await
}

/// Generate a detailed server activity report for this year.
#[poise::command(slash_command, guild_only)]
pub async fn server_wrapped(ctx: Context<'_>) -> Result<(), Error> {
    let cache = cache(&ctx)?;
    let guild_id = ctx.guild_id().ok_or(CommandError::NotInGuild)?;
    ctx.defer().await?;

    let tz = ctx.data().config.get().wrapped.timezone()?;
    let now = Utc::now();
    let stats = match cache.get_fresh(guild_id.get(), now).await {
        Some(stats) => stats,
        None => {
            let stats = collect(ctx, guild_id, tz, year_start(now, tz)).await?;
            if let Err(e) = cache.put(guild_id.get(), now, &stats).await {
                warn!(error = %e, "Could not cache wrapped stats");
            }
            stats
        }
    };

    let bars = user_bars(&ctx.data().http, &stats).await;
    let label = timezone_label(tz, now);
    let text = wrapped_reply(&stats.most_reacted_text(guild_id.get()));
    let (cloud, activity, counts) = tokio::task::spawn_blocking(move || {
        Ok::<_, hearth_common::HearthError>((
            render_word_cloud(&stats.words)?,
            render_activity_chart(&stats.active_hours, &label)?,
            render_message_counts(&bars)?,
        ))
    })
    .await??;

    ctx.send(
        poise::CreateReply::default()
            .content(text)
            .attachment(serenity::CreateAttachment::bytes(cloud, "wordcloud.png"))
            .attachment(serenity::CreateAttachment::bytes(activity, "activity_heatmap.png"))
            .attachment(serenity::CreateAttachment::bytes(counts, "message_count_graph.png")),
    )
    .await?;
    info!(guild = %guild_id, "Sent server wrapped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    #[test]
    fn test_wrapped_reply() {
        assert_eq!(
            wrapped_reply("none"),
            "🎉 Here's your Server Wrapped!\n\n**Most Reacted Messages:**\nnone"
        );
    }

    #[test]
    fn test_timezone_label_follows_daylight_saving() {
        let winter = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let summer = Utc.with_ymd_and_hms(2026, 7, 15, 12, 0, 0).unwrap();
        assert_eq!(timezone_label(New_York, winter), "EST");
        assert_eq!(timezone_label(New_York, summer), "EDT");
    }
}
