//! Queue entries and the replies the music commands send.

use serde::{Deserialize, Serialize};

/// Reply when the member running a command is not in a voice channel.
pub const NOT_IN_VOICE: &str = "You are not in a voice channel!";
/// Reply when the bot has no voice connection in the guild.
pub const NOT_CONNECTED: &str = "Not connected to a voice channel.";
/// Reply to `/skip` with nothing playing.
pub const NOTHING_PLAYING: &str = "Nothing is playing right now.";
/// Reply to a successful `/skip`.
pub const SKIPPED: &str = "Skipped current song.";
/// Reply to `/stop`.
pub const STOPPED: &str = "Playback stopped and queue cleared.";
/// Reply to `/queue` with nothing waiting.
pub const QUEUE_EMPTY: &str = "Queue is empty.";
/// Reply to `/leave` after disconnecting.
pub const DISCONNECTED: &str = "Disconnected from the voice channel.";
/// Reply to `/leave` with no connection.
pub const NOT_IN_CHANNEL: &str = "I'm not in a voice channel.";
/// Reply to `/say` while audio is already playing.
pub const ALREADY_PLAYING: &str = "Already playing audio! Please wait.";

/// What a queue entry plays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedSong {
    /// Title shown in replies.
    pub title: String,
    /// Source page, when known.
    pub url: Option<String>,
}

impl QueuedSong {
    /// Entry for a song.
    pub fn new(title: impl Into<String>, url: Option<String>) -> Self {
        Self {
            title: title.into(),
            url,
        }
    }

    /// Entry for a synthesized speech clip.
    pub fn speech(text: &str) -> Self {
        Self::new(format!("TTS: {text}"), None)
    }
}

/// Whether a new track starts at once or waits its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Nothing was playing; the track started.
    Started,
    /// The track was appended behind others.
    Queued,
}

impl PlayOutcome {
    /// Outcome of enqueuing onto a queue that held `tracks_before` tracks.
    pub fn after_enqueue(tracks_before: usize) -> Self {
        if tracks_before == 0 {
            Self::Started
        } else {
            Self::Queued
        }
    }

    /// Reply for `/play`.
    pub fn reply(self, title: &str) -> String {
        match self {
            Self::Started => now_playing(title),
            Self::Queued => added_to_queue(title),
        }
    }
}

/// `Now playing: **title**`.
pub fn now_playing(title: &str) -> String {
    format!("Now playing: **{title}**")
}

/// `Added to queue: **title**`.
pub fn added_to_queue(title: &str) -> String {
    format!("Added to queue: **{title}**")
}

/// Reply to `/join`.
pub fn joined(channel_mention: &str) -> String {
    format!("Joined {channel_mention}")
}

/// Numbered list of the songs waiting behind the current one.
pub fn queue_listing(waiting: &[QueuedSong]) -> String {
    if waiting.is_empty() {
        return QUEUE_EMPTY.to_string();
    }
    let lines: Vec<String> = waiting
        .iter()
        .enumerate()
        .map(|(i, song)| format!("{}. {}", i + 1, song.title))
        .collect();
    format!("**Queue:**\n{}", lines.join("\n"))
}
