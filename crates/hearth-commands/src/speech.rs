//! Text-to-speech commands.

use hearth_voice::queue::{ALREADY_PLAYING, DISCONNECTED, NOT_IN_CHANNEL};
use hearth_voice::{FishSpeechClient, PlayerError};
use tracing::warn;

use crate::framework::{reply_ephemeral, CommandError, Context, Error};
use crate::music::{ensure_voice, player};

const MUST_BE_IN_VOICE: &str = "You must be in a voice channel to use this command!";

fn speech<'a>(ctx: &Context<'a>) -> Result<&'a FishSpeechClient, Error> {
    ctx.data()
        .speech
        .as_ref()
        .ok_or_else(|| CommandError::CogDisabled("speech").into())
}

/// Generate TTS from text and play it in the voice channel.
#[poise::command(slash_command, guild_only)]
pub async fn say(
    ctx: Context<'_>,
    #[description = "What to say"] text: String,
) -> Result<(), Error> {
    let speech = speech(&ctx)?;
    let player = player(&ctx)?;
    let Some(guild_id) = ensure_voice(ctx, player).await? else {
        return reply_ephemeral(ctx, MUST_BE_IN_VOICE).await;
    };
    ctx.defer_ephemeral().await?;

    let audio = match speech.synthesize(&text).await {
        Ok(audio) => audio,
        Err(e) => {
            warn!(error = %e, "Speech synthesis failed");
            ctx.say(format!("Failed to generate TTS: {e}")).await?;
            return Ok(());
        }
    };

    let response = match player.say(guild_id, audio, &text).await {
        Ok(()) => format!("🎙️ Playing: {text}"),
        Err(PlayerError::Busy) => ALREADY_PLAYING.to_string(),
        Err(e) => format!("Failed to play TTS: {e}"),
    };
    ctx.say(response).await?;
    Ok(())
}

/// Make the bot leave the voice channel.
#[poise::command(slash_command, guild_only)]
pub async fn leave(ctx: Context<'_>) -> Result<(), Error> {
    let player = player(&ctx)?;
    let guild_id = ctx.guild_id().ok_or(CommandError::NotInGuild)?;
    let response = if player.leave(guild_id).await? {
        DISCONNECTED
    } else {
        NOT_IN_CHANNEL
    };
    reply_ephemeral(ctx, response).await
}
