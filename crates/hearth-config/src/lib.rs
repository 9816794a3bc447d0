//! # Hearth Config
//!
//! Type-safe configuration management for Hearth Bot.
//!
//! This crate provides the YAML schema, defaults, environment variable
//! overrides, validation and a lock-free cache for the live configuration.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validator;

pub use cache::*;
pub use loader::*;
pub use schema::*;
pub use validator::*;
