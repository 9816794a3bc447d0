//! Integration tests for hearth-graphs crate.
//!
//! Rendering with text needs a system sans-serif font, so those tests are
//! ignored by default.

use chrono::{TimeZone, Utc};
use chrono_tz::America::New_York;
use hearth_common::test_utils::create_temp_dir;
use hearth_common::{ChannelId, MessageId, UserId};
use hearth_graphs::{
    render_activity_chart, render_connection_chart, render_message_counts, render_word_cloud,
    ActivityStats, Avatar, ConnectionChart, ConnectionKind, ConnectionStore, MessageSample, UserBar,
};
use image::{Rgba, RgbaImage};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

fn message(author: u64, content: &str, hour: u32) -> MessageSample {
    MessageSample {
        channel_id: ChannelId(1),
        message_id: MessageId(u64::from(hour) + 1),
        author_id: UserId(author),
        author_name: format!("member{author}"),
        author_avatar: None,
        author_is_bot: false,
        content: content.to_string(),
        sent_at: Utc.with_ymd_and_hms(2026, 7, 4, hour, 0, 0).unwrap(),
        reactions: u64::from(hour % 3),
    }
}

fn year_of_stats() -> ActivityStats {
    let mut stats = ActivityStats::default();
    for hour in 0..24 {
        stats.record(&message(hour as u64 % 4, "pizza night with friends pizza", hour), New_York);
    }
    stats
}

#[tokio::test]
async fn test_connections_survive_reopen_and_feed_the_chart() {
    let dir = create_temp_dir();
    let path = dir.path().join("connection_chart.json");

    let store = ConnectionStore::open(&path).await.unwrap();
    store.add(UserId(1), UserId(2), ConnectionKind::Sibling).await.unwrap();
    store.add(UserId(2), UserId(3), ConnectionKind::Roommate).await.unwrap();
    store.add(UserId(3), UserId(1), ConnectionKind::Partner).await.unwrap();
    assert_eq!(store.remove(UserId(3), UserId(2), ConnectionKind::Roommate).await.unwrap(), 1);

    let reopened = ConnectionStore::open(&path).await.unwrap();
    let connections = reopened.all().await;
    assert_eq!(connections.len(), 2);

    let chart = ConnectionChart::from_connections("Hearth", &connections);
    assert_eq!(chart.nodes.len(), 3);
    assert_eq!(chart.edges.len(), 2);
}

#[test]
fn test_stats_drive_the_chart_inputs() {
    let stats = year_of_stats();
    assert_eq!(stats.total_messages(), 24);
    assert_eq!(stats.message_counts.len(), 4);
    assert_eq!(stats.words.get("pizza"), Some(&48));
    assert!(!stats.words.contains_key("with"));
    assert_eq!(stats.active_hours.iter().sum::<u64>(), 24);
}

#[test]
#[ignore = "requires system fonts"]
fn test_render_connection_chart() {
    let mut chart = ConnectionChart::from_connections(
        "Hearth",
        &[
            hearth_graphs::Connection {
                user1: UserId(1),
                user2: UserId(2),
                connection: ConnectionKind::Friend,
            },
            hearth_graphs::Connection {
                user1: UserId(2),
                user2: UserId(1),
                connection: ConnectionKind::Cousin,
            },
        ],
    );
    let face = RgbaImage::from_pixel(64, 64, Rgba([200, 40, 40, 255]));
    chart.nodes[0].avatar = Some(Avatar::from_image(&face, 64));

    let png = render_connection_chart(&chart).unwrap();
    assert!(png.starts_with(PNG_MAGIC));
}

#[test]
#[ignore = "requires system fonts"]
fn test_render_wrapped_images() {
    let stats = year_of_stats();

    let activity = render_activity_chart(&stats.active_hours, "EST").unwrap();
    assert!(activity.starts_with(PNG_MAGIC));

    let cloud = render_word_cloud(&stats.words).unwrap();
    assert!(cloud.starts_with(PNG_MAGIC));

    let bars: Vec<UserBar> = stats
        .message_counts
        .iter()
        .map(|(id, &count)| UserBar {
            name: stats.authors[id].name.clone(),
            count,
            avatar: None,
        })
        .collect();
    let counts = render_message_counts(&bars).unwrap();
    let decoded = image::load_from_memory(&counts).unwrap();
    assert_eq!(decoded.width(), 1200);
}
