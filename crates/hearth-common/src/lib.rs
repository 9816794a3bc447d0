//! # Hearth Common
//!
//! Shared types, utilities, and common functionality for Hearth Bot.
//!
//! This crate provides the foundational id types, the workspace-wide error
//! type, logging bootstrap and small helpers used by every other crate.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::*;
pub use types::*;
pub use utils::*;
