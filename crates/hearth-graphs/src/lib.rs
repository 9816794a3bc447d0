//! # Hearth Graphs
//!
//! Chart rendering for Hearth Bot.
//!
//! Two cogs draw pictures: the relationship chart, built from connections
//! members declare between each other, and the yearly server wrapped with its
//! word cloud, activity-by-hour line and message-count bars. Everything is
//! drawn with plotters into an in-memory bitmap, avatars are composited on
//! top, and the result is returned as PNG bytes ready to attach.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod activity;
pub mod avatar;
pub mod canvas;
pub mod connection_chart;
pub mod connections;
pub mod layout;
pub mod message_counts;
pub mod word_cloud;
pub mod wrapped;

pub use activity::render_activity_chart;
pub use avatar::{fetch_avatar, Avatar};
pub use connection_chart::{render_connection_chart, ChartNode, ConnectionChart};
pub use connections::{
    added_message, removed_message, Connection, ConnectionError, ConnectionKind, ConnectionStore, NO_MATCH,
};
pub use message_counts::{render_message_counts, UserBar};
pub use word_cloud::render_word_cloud;
pub use wrapped::{
    filter_words, snowflake_at, year_start, ActivityStats, AuthorInfo, MessageSample, ReactedMessage,
    WrappedCache,
};
