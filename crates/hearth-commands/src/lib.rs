//! # Hearth Commands
//!
//! Discord command implementations using the Poise framework for Hearth Bot.
//!
//! This crate provides the slash commands of every cog, the shared [`Data`]
//! handed to each command, the typed gateway event dispatch and the yes/no
//! workout confirmation dialogue. Music and speech commands are compiled
//! with the `voice` feature.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod about;
pub mod birthdays;
pub mod config;
pub mod confirmation;
pub mod connections;
pub mod events;
pub mod flights;
pub mod framework;
pub mod ids;
#[cfg(feature = "voice")]
pub mod music;
#[cfg(feature = "voice")]
pub mod speech;
pub mod workouts;
pub mod wrapped;

pub use events::*;
pub use framework::*;
