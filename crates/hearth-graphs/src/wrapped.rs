//! Yearly server activity statistics and their on-disk cache.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use hearth_common::{ChannelId, HearthError, MessageId, Result, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// How many messages the most-reacted list shows.
pub const MOST_REACTED_LIMIT: usize = 5;

/// Shown when nothing this year got a reaction.
pub const NO_REACTIONS: &str = "No reacted messages found in this server for the current year.";

const STOPWORDS: [&str; 35] = [
    "the", "and", "a", "to", "of", "in", "is", "you", "that", "it", "for", "on", "with", "as", "was",
    "this", "have", "just", "if", "one", "we", "or", "my", "like", "so", "at", "be", "by", "not",
    "what", "about", "which", "but", "im", "ive",
];

fn stopwords() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.into_iter().collect())
}

/// Start of a URL inside `token`: `http` or `www` followed by at least one character.
fn url_start(token: &str) -> Option<usize> {
    token.char_indices().map(|(i, _)| i).find(|&i| {
        let rest = &token[i..];
        (rest.starts_with("http") && rest.len() > 4) || (rest.starts_with("www") && rest.len() > 3)
    })
}

/// Words worth showing in the cloud: URLs cut, only ASCII letters kept,
/// lowercased, common filler words dropped.
pub fn filter_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|token| {
            let token = match url_start(token) {
                Some(at) => &token[..at],
                None => token,
            };
            let word: String = token
                .chars()
                .filter(char::is_ascii_alphabetic)
                .map(|c| c.to_ascii_lowercase())
                .collect();
            (!word.is_empty() && !stopwords().contains(word.as_str())).then_some(word)
        })
        .collect()
}

/// The parts of a Discord message the wrapped needs.
#[derive(Debug, Clone)]
pub struct MessageSample {
    /// Channel the message was posted in.
    pub channel_id: ChannelId,
    /// Message id.
    pub message_id: MessageId,
    /// Author id.
    pub author_id: UserId,
    /// Author display name at collection time.
    pub author_name: String,
    /// Author avatar URL.
    pub author_avatar: Option<String>,
    /// Bot messages are ignored.
    pub author_is_bot: bool,
    /// Message text.
    pub content: String,
    /// When the message was sent.
    pub sent_at: DateTime<Utc>,
    /// Sum of every reaction's count.
    pub reactions: u64,
}

/// A message that received reactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactedMessage {
    /// Channel of the message.
    pub channel_id: u64,
    /// Message id.
    pub message_id: u64,
    /// Author id.
    pub author_id: u64,
    /// Total reactions.
    pub reactions: u64,
}

/// How a member is labelled on the charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorInfo {
    /// Display name.
    pub name: String,
    /// Avatar URL.
    pub avatar_url: Option<String>,
}

/// Everything the wrapped draws, accumulated over a year of messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityStats {
    /// Messages per author id.
    pub message_counts: BTreeMap<u64, u64>,
    /// Word frequencies for the cloud.
    pub words: BTreeMap<String, u64>,
    /// Messages with at least one reaction.
    pub reactions: Vec<ReactedMessage>,
    /// Messages per local hour of day.
    pub active_hours: [u64; 24],
    /// Names and avatars of every counted author.
    pub authors: BTreeMap<u64, AuthorInfo>,
}

impl ActivityStats {
    /// Fold one message in. Bot messages are skipped.
    pub fn record(&mut self, message: &MessageSample, tz: Tz) {
        if message.author_is_bot {
            return;
        }

        let author = message.author_id.0;
        *self.message_counts.entry(author).or_insert(0) += 1;
        self.authors.insert(
            author,
            AuthorInfo {
                name: message.author_name.clone(),
                avatar_url: message.author_avatar.clone(),
            },
        );

        for word in filter_words(&message.content) {
            *self.words.entry(word).or_insert(0) += 1;
        }

        let hour = message.sent_at.with_timezone(&tz).hour() as usize;
        self.active_hours[hour] += 1;

        if message.reactions > 0 {
            self.reactions.push(ReactedMessage {
                channel_id: message.channel_id.0,
                message_id: message.message_id.0,
                author_id: author,
                reactions: message.reactions,
            });
        }
    }

    /// Total counted messages.
    pub fn total_messages(&self) -> u64 {
        self.message_counts.values().sum()
    }

    /// The `limit` messages with the most reactions, most first.
    pub fn most_reacted(&self, limit: usize) -> Vec<&ReactedMessage> {
        let mut sorted: Vec<&ReactedMessage> = self.reactions.iter().collect();
        sorted.sort_by(|a, b| b.reactions.cmp(&a.reactions).then(a.message_id.cmp(&b.message_id)));
        sorted.truncate(limit);
        sorted
    }

    /// Markdown list of the most reacted messages with jump links.
    pub fn most_reacted_text(&self, guild_id: u64) -> String {
        let top = self.most_reacted(MOST_REACTED_LIMIT);
        if top.is_empty() {
            return NO_REACTIONS.to_string();
        }
        top.iter()
            .map(|m| {
                let name = self
                    .authors
                    .get(&m.author_id)
                    .map_or_else(|| format!("User({})", m.author_id), |a| a.name.clone());
                format!(
                    "**[{name}](<https://discord.com/channels/{guild_id}/{}/{}>)**: {} reactions",
                    m.channel_id, m.message_id, m.reactions
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Discord epoch in milliseconds.
const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

/// First instant of `now`'s year in `tz`.
pub fn year_start(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let year = now.with_timezone(&tz).year();
    tz.with_ymd_and_hms(year, 1, 1, 0, 0, 0)
        .earliest()
        .map_or(now, |start| start.with_timezone(&Utc))
}

/// Smallest message id that can have been created at or after `at`.
pub fn snowflake_at(at: DateTime<Utc>) -> u64 {
    let ms = (at.timestamp_millis() - DISCORD_EPOCH_MS).max(1);
    ((ms - 1) as u64) << 22
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedStats {
    last_scraped: DateTime<Utc>,
    stats: ActivityStats,
}

/// Per-guild JSON cache of collected stats.
#[derive(Debug, Clone)]
pub struct WrappedCache {
    path: PathBuf,
    ttl: Duration,
}

impl WrappedCache {
    /// Cache in `path` whose entries stay fresh for `ttl`.
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> BTreeMap<u64, CachedStats> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read wrapped cache");
                return BTreeMap::new();
            }
        };
        serde_json::from_slice(&content).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Wrapped cache is not valid, ignoring it");
            BTreeMap::new()
        })
    }

    /// Stats for `guild` if they were collected less than the TTL before `now`.
    pub async fn get_fresh(&self, guild: u64, now: DateTime<Utc>) -> Option<ActivityStats> {
        let entry = self.load().await.remove(&guild)?;
        if now - entry.last_scraped < self.ttl {
            debug!(guild, "Using cached wrapped stats");
            Some(entry.stats)
        } else {
            None
        }
    }

    /// Store `stats` for `guild` as collected at `now`.
    pub async fn put(&self, guild: u64, now: DateTime<Utc>, stats: &ActivityStats) -> Result<()> {
        let mut entries = self.load().await;
        entries.insert(
            guild,
            CachedStats {
                last_scraped: now,
                stats: stats.clone(),
            },
        );

        let bytes = serde_json::to_vec(&entries)
            .map_err(|e| HearthError::database_with_source("Failed to serialize wrapped cache", e))?;
        let write_err = |e| HearthError::database_with_source("Failed to write wrapped cache", e);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        tokio::fs::write(&tmp, bytes).await.map_err(write_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(write_err)?;

        info!(guild, messages = stats.total_messages(), "Cached wrapped stats");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;
    use hearth_common::test_utils::create_temp_dir;

    fn sample(author: u64, content: &str, hour_utc: u32, reactions: u64) -> MessageSample {
        MessageSample {
            channel_id: ChannelId(10),
            message_id: MessageId(1000 + u64::from(hour_utc)),
            author_id: UserId(author),
            author_name: format!("member{author}"),
            author_avatar: None,
            author_is_bot: false,
            content: content.to_string(),
            sent_at: Utc.with_ymd_and_hms(2026, 3, 2, hour_utc, 15, 0).unwrap(),
            reactions,
        }
    }

    #[test]
    fn test_filter_words() {
        assert_eq!(
            filter_words("The cat's hat, see https://x.io and www.y.com OK"),
            vec!["cats", "hat", "see", "ok"]
        );
        assert_eq!(filter_words("http alone"), vec!["http", "alone"]);
        assert_eq!(filter_words("link:https://a.b"), vec!["link"]);
        assert!(filter_words("123 !!! I'm").is_empty());
    }

    #[test]
    fn test_record_counts_in_local_hours() {
        let mut stats = ActivityStats::default();
        stats.record(&sample(1, "pizza pizza", 14, 0), New_York);
        stats.record(&sample(2, "tacos", 3, 4), New_York);
        let mut bot = sample(3, "beep", 14, 9);
        bot.author_is_bot = true;
        stats.record(&bot, New_York);

        assert_eq!(stats.total_messages(), 2);
        assert_eq!(stats.words.get("pizza"), Some(&2));
        // EST is UTC-5 in early March.
        assert_eq!(stats.active_hours[9], 1);
        assert_eq!(stats.active_hours[22], 1);
        assert_eq!(stats.reactions.len(), 1);
        assert!(!stats.authors.contains_key(&3));
    }

    #[test]
    fn test_most_reacted_text() {
        let mut stats = ActivityStats::default();
        assert_eq!(stats.most_reacted_text(7), NO_REACTIONS);

        for (hour, reactions) in [(1, 3), (2, 9), (3, 1), (4, 5), (5, 2), (6, 8)] {
            stats.record(&sample(1, "hi", hour, reactions), New_York);
        }
        let text = stats.most_reacted_text(7);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), MOST_REACTED_LIMIT);
        assert_eq!(
            lines[0],
            "**[member1](<https://discord.com/channels/7/10/1002>)**: 9 reactions"
        );
        assert!(lines.iter().all(|l| !l.contains(": 1 reactions")));
    }

    #[test]
    fn test_year_start_and_snowflake() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 2, 0, 0).unwrap();
        // Still 2025 in New York.
        assert_eq!(
            year_start(now, New_York),
            Utc.with_ymd_and_hms(2025, 1, 1, 5, 0, 0).unwrap()
        );

        let at = Utc.timestamp_millis_opt(DISCORD_EPOCH_MS + 1001).unwrap();
        assert_eq!(snowflake_at(at), 1000 << 22);
    }

    #[tokio::test]
    async fn test_cache_respects_ttl() {
        let dir = create_temp_dir();
        let cache = WrappedCache::new(dir.path().join("server_wrapped_cache.json"), Duration::hours(24));
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        assert!(cache.get_fresh(42, now).await.is_none());

        let mut stats = ActivityStats::default();
        stats.record(&sample(1, "hello there", 14, 2), New_York);
        cache.put(42, now, &stats).await.unwrap();

        assert_eq!(cache.get_fresh(42, now + Duration::hours(23)).await, Some(stats));
        assert!(cache.get_fresh(42, now + Duration::hours(24)).await.is_none());
        assert!(cache.get_fresh(43, now).await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_ignored() {
        let dir = create_temp_dir();
        let cache = WrappedCache::new(dir.path().join("cache.json"), Duration::hours(24));
        tokio::fs::write(cache.path(), b"[1, 2").await.unwrap();
        assert!(cache.get_fresh(42, Utc::now()).await.is_none());
    }
}
