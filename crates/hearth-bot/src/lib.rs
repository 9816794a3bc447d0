//! # Hearth Bot
//!
//! Discord bot for weekly workout goals, birthday reminders, flight
//! schedules, server charts and voice.
//!
//! This is the main binary crate that orchestrates the application lifecycle:
//! it opens every enabled cog's store, wires them into the Poise framework,
//! adapts the Discord HTTP client to the notifier port, and runs the weekly
//! rollover, daily birthday and flight schedule tasks until shutdown.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bot;
pub mod discord;
pub mod error;
pub mod scheduler;
pub mod task_manager;

pub use bot::*;
pub use error::*;
