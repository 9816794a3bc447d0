//! Songbird playback: one call and one track queue per guild.

use async_trait::async_trait;
use serenity::all::{ChannelId, GuildId, Http};
use songbird::error::{ControlError, JoinError};
use songbird::input::{AudioStreamError, Compose, Input, YoutubeDl};
use songbird::tracks::Track;
use songbird::{Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::queue::{now_playing, PlayOutcome, QueuedSong};

/// Errors from voice playback.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The bot has no call in the guild.
    #[error("Not connected to a voice channel")]
    NotConnected,

    /// Something is already playing.
    #[error("Already playing audio")]
    Busy,

    /// Joining or leaving the channel failed.
    #[error("Voice connection failed: {0}")]
    Join(#[from] JoinError),

    /// The search or download found nothing playable.
    #[error("Could not load audio: {0}")]
    Source(#[from] AudioStreamError),

    /// The track could not be controlled.
    #[error("Track control failed: {0}")]
    Control(#[from] ControlError),
}

/// Posts "Now playing" when a queued track starts.
struct AnnounceOnPlay {
    http: Arc<Http>,
    channel: ChannelId,
    title: String,
}

#[async_trait]
impl VoiceEventHandler for AnnounceOnPlay {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        if let Err(e) = self.channel.say(&*self.http, now_playing(&self.title)).await {
            warn!(error = %e, channel = %self.channel, "Failed to announce next song");
        }
        None
    }
}

/// Music and speech playback over songbird.
#[derive(Clone)]
pub struct VoicePlayer {
    manager: Arc<Songbird>,
    http: reqwest::Client,
}

impl VoicePlayer {
    /// Player using the client's songbird manager.
    pub fn new(manager: Arc<Songbird>, http: reqwest::Client) -> Self {
        Self { manager, http }
    }

    /// Join `channel`, or move there if already in another channel of the guild.
    pub async fn join(&self, guild: GuildId, channel: ChannelId) -> Result<(), PlayerError> {
        self.manager.join(guild, channel).await?;
        info!(guild = %guild, channel = %channel, "Joined voice channel");
        Ok(())
    }

    /// Whether the bot has a call in `guild`.
    pub fn is_connected(&self, guild: GuildId) -> bool {
        self.manager.get(guild).is_some()
    }

    /// Search YouTube for `query` (or load it, when it is a URL) and queue the
    /// first hit. Queued tracks announce themselves in `announce` when they start.
    pub async fn play(
        &self,
        guild: GuildId,
        query: &str,
        announce: (Arc<Http>, ChannelId),
    ) -> Result<(QueuedSong, PlayOutcome), PlayerError> {
        let call = self.manager.get(guild).ok_or(PlayerError::NotConnected)?;

        let target = if query.starts_with("http://") || query.starts_with("https://") {
            query.to_string()
        } else {
            format!("ytsearch1:{query}")
        };
        let mut source = YoutubeDl::new(self.http.clone(), target);
        let metadata = source.aux_metadata().await?;
        let song = QueuedSong::new(
            metadata.title.unwrap_or_else(|| query.to_string()),
            metadata.source_url,
        );

        let mut handler = call.lock().await;
        let outcome = PlayOutcome::after_enqueue(handler.queue().len());
        let track = Track::new_with_data(Input::from(source), Arc::new(song.clone()));
        let handle = handler.enqueue(track).await;

        if outcome == PlayOutcome::Queued {
            let (http, channel) = announce;
            handle.add_event(
                Event::Track(TrackEvent::Play),
                AnnounceOnPlay {
                    http,
                    channel,
                    title: song.title.clone(),
                },
            )?;
        }

        info!(guild = %guild, title = %song.title, ?outcome, "Queued song");
        Ok((song, outcome))
    }

    /// Play an MP3 clip unless something is already playing.
    pub async fn say(&self, guild: GuildId, audio: Vec<u8>, text: &str) -> Result<(), PlayerError> {
        let call = self.manager.get(guild).ok_or(PlayerError::NotConnected)?;
        let mut handler = call.lock().await;
        if !handler.queue().is_empty() {
            return Err(PlayerError::Busy);
        }
        let track = Track::new_with_data(Input::from(audio), Arc::new(QueuedSong::speech(text)));
        handler.enqueue(track).await;
        info!(guild = %guild, "Playing speech");
        Ok(())
    }

    /// Skip the current track. Returns `false` when nothing was playing.
    pub async fn skip(&self, guild: GuildId) -> Result<bool, PlayerError> {
        let call = self.manager.get(guild).ok_or(PlayerError::NotConnected)?;
        let handler = call.lock().await;
        if handler.queue().is_empty() {
            return Ok(false);
        }
        handler.queue().skip()?;
        Ok(true)
    }

    /// Stop playback and drop every queued track.
    pub async fn stop(&self, guild: GuildId) -> Result<(), PlayerError> {
        let call = self.manager.get(guild).ok_or(PlayerError::NotConnected)?;
        call.lock().await.queue().stop();
        info!(guild = %guild, "Stopped playback");
        Ok(())
    }

    /// Songs waiting behind the current track.
    pub async fn waiting(&self, guild: GuildId) -> Vec<QueuedSong> {
        let Some(call) = self.manager.get(guild) else {
            return Vec::new();
        };
        let handler = call.lock().await;
        handler
            .queue()
            .current_queue()
            .iter()
            .skip(1)
            .map(|track| track.data::<QueuedSong>().as_ref().clone())
            .collect()
    }

    /// Leave the guild's voice channel. Returns `false` when not connected.
    pub async fn leave(&self, guild: GuildId) -> Result<bool, PlayerError> {
        if !self.is_connected(guild) {
            return Ok(false);
        }
        self.manager.remove(guild).await?;
        info!(guild = %guild, "Left voice channel");
        Ok(true)
    }
}
