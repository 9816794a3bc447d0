//! # Hearth Birthdays
//!
//! Birthday storage and daily reminders for Hearth Bot.
//!
//! Birthdays are kept in a small SQLite table as `MM-DD` strings. Once a day
//! the bot asks [`due_reminders`] which messages to post: a greeting for
//! birthdays falling today and a heads-up for those exactly a week away.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod date;
pub mod error;
pub mod reminder;
pub mod store;

pub use date::BirthdayDate;
pub use error::{BirthdayError, Result};
pub use reminder::{due_reminders, Reminder, ReminderKind};
pub use store::{BirthdayRecord, BirthdayStore};
