//! # Hearth Flights
//!
//! Watches a passenger terminal's 72-hour flight schedule for Hearth Bot.
//!
//! The terminal page links the schedule as a PDF. [`FlightFetcher`] finds the
//! link, downloads the PDF and turns its text into [`Flight`] rows;
//! [`FlightWatcher`] compares each fetch with the last stored schedule and
//! reports the flights that were not there before.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod fetcher;
pub mod schedule;
pub mod store;
pub mod watcher;

pub use error::{FlightError, Result};
pub use fetcher::{find_schedule_link, FlightFetcher, ScheduleSource};
pub use schedule::{new_flight_message, new_flights, parse_flights, summary_message, Flight};
pub use store::FlightStore;
pub use watcher::FlightWatcher;
