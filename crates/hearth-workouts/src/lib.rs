//! # Hearth Workouts
//!
//! Weekly workout goal tracking for Hearth Bot.
//!
//! Users opt in with a weekly goal, confirm workouts by posting pictures, and
//! are evaluated once a week at the Monday 00:00 boundary. This crate owns the
//! tracker state, the week calendar, the streak/miss calculator, the JSON
//! store and the rollover state machine. Discord is reached only through the
//! [`Notifier`] port so everything here can be exercised without a gateway.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod calendar;
pub mod messages;
pub mod notifier;
pub mod roast;
pub mod rollover;
pub mod state;
pub mod store;
pub mod streak;
pub mod tracker;

pub use calendar::*;
pub use notifier::*;
pub use roast::*;
pub use rollover::*;
pub use state::*;
pub use store::*;
pub use streak::*;
pub use tracker::*;
