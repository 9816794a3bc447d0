//! Music queue commands.

use hearth_voice::queue::{NOTHING_PLAYING, NOT_CONNECTED, NOT_IN_VOICE, SKIPPED, STOPPED};
use hearth_voice::{joined, queue_listing, PlayerError, VoicePlayer};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::warn;

use crate::framework::{reply_ephemeral, CommandError, Context, Error};

pub(crate) fn player<'a>(ctx: &Context<'a>) -> Result<&'a VoicePlayer, Error> {
    ctx.data()
        .voice
        .as_ref()
        .ok_or_else(|| CommandError::CogDisabled("voice").into())
}

/// Voice channel the invoking member is sitting in, from the cache.
pub(crate) fn author_voice_channel(ctx: Context<'_>) -> Option<serenity::ChannelId> {
    let guild = ctx.guild()?;
    guild
        .voice_states
        .get(&ctx.author().id)
        .and_then(|state| state.channel_id)
}

/// Join the member's channel unless already connected. `None` means the member is not in voice.
pub(crate) async fn ensure_voice(ctx: Context<'_>, player: &VoicePlayer) -> Result<Option<serenity::GuildId>, Error> {
    let guild_id = ctx.guild_id().ok_or(CommandError::NotInGuild)?;
    if player.is_connected(guild_id) {
        return Ok(Some(guild_id));
    }
    let Some(channel) = author_voice_channel(ctx) else {
        return Ok(None);
    };
    player.join(guild_id, channel).await?;
    Ok(Some(guild_id))
}

/// Joins your current voice channel.
#[poise::command(slash_command, guild_only)]
pub async fn join(ctx: Context<'_>) -> Result<(), Error> {
    let player = player(&ctx)?;
    let guild_id = ctx.guild_id().ok_or(CommandError::NotInGuild)?;
    let Some(channel) = author_voice_channel(ctx) else {
        return reply_ephemeral(ctx, NOT_IN_VOICE).await;
    };
    player.join(guild_id, channel).await?;
    reply_ephemeral(ctx, joined(&format!("<#{channel}>"))).await
}

/// Plays audio from a YouTube URL or search query. Adds to queue if something is already playing.
#[poise::command(slash_command, guild_only)]
pub async fn play(
    ctx: Context<'_>,
    #[description = "YouTube URL or search terms"] query: String,
) -> Result<(), Error> {
    let player = player(&ctx)?;
    let Some(guild_id) = ensure_voice(ctx, player).await? else {
        return reply_ephemeral(ctx, NOT_IN_VOICE).await;
    };
    ctx.defer().await?;

    let announce = (Arc::clone(&ctx.serenity_context().http), ctx.channel_id());
    let response = match player.play(guild_id, &query, announce).await {
        Ok((song, outcome)) => outcome.reply(&song.title),
        Err(e) => {
            warn!(error = %e, query = %query, "Could not play query");
            format!("An error occurred while processing the query: {e}")
        }
    };
    ctx.say(response).await?;
    Ok(())
}

/// Skips the current song.
#[poise::command(slash_command, guild_only)]
pub async fn skip(ctx: Context<'_>) -> Result<(), Error> {
    let player = player(&ctx)?;
    let guild_id = ctx.guild_id().ok_or(CommandError::NotInGuild)?;
    let response = match player.skip(guild_id).await {
        Ok(true) => SKIPPED,
        Ok(false) | Err(PlayerError::NotConnected) => NOTHING_PLAYING,
        Err(e) => return Err(e.into()),
    };
    reply_ephemeral(ctx, response).await
}

/// Displays the current song queue.
#[poise::command(slash_command, guild_only)]
pub async fn queue(ctx: Context<'_>) -> Result<(), Error> {
    let player = player(&ctx)?;
    let guild_id = ctx.guild_id().ok_or(CommandError::NotInGuild)?;
    let waiting = player.waiting(guild_id).await;
    if waiting.is_empty() {
        return reply_ephemeral(ctx, queue_listing(&waiting)).await;
    }
    ctx.say(queue_listing(&waiting)).await?;
    Ok(())
}

/// Stops playback and clears the queue.
#[poise::command(slash_command, guild_only)]
pub async fn stop(ctx: Context<'_>) -> Result<(), Error> {
    let player = player(&ctx)?;
    let guild_id = ctx.guild_id().ok_or(CommandError::NotInGuild)?;
    let response = match player.stop(guild_id).await {
        Ok(()) => STOPPED,
        Err(PlayerError::NotConnected) => NOT_CONNECTED,
        Err(e) => return Err(e.into()),
    };
    reply_ephemeral(ctx, response).await
}
