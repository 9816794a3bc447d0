//! # Hearth Voice
//!
//! Voice channel features for Hearth Bot: a per-guild music queue fed from
//! YouTube searches and text-to-speech through the Fish Audio API.
//!
//! Message formatting and the speech client are always built. Actual
//! playback goes through songbird and needs the `voice` feature, which in
//! turn needs libopus to be available when building.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod queue;
pub mod speech;

#[cfg(feature = "voice")]
pub mod player;

pub use queue::{added_to_queue, joined, now_playing, queue_listing, PlayOutcome, QueuedSong};
pub use speech::{FishSpeechClient, SpeechError, SpeechRequest};

#[cfg(feature = "voice")]
pub use player::{PlayerError, VoicePlayer};
