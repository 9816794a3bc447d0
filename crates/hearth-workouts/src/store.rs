//! JSON file persistence for the tracker state.
//!
//! The whole state is read once at startup and rewritten on every mutation.
//! Reading is tolerant: older files store goals as `[goal, total]` pairs,
//! timestamps without an offset, and message ids as strings. Entries that
//! cannot be understood are skipped with a warning instead of failing the
//! load.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use hearth_common::{MessageId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::state::{PendingAcknowledgment, WorkoutState};

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The data file exists but could not be read.
    #[error("Failed to read workout data from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The data file could not be written.
    #[error("Failed to write workout data to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The data file is not a JSON document of the expected shape.
    #[error("Workout data in {path} is not valid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The state could not be serialized.
    #[error("Failed to serialize workout data: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Document as written to disk.
#[derive(Debug, Serialize)]
struct StoredState {
    user_goals: BTreeMap<String, u32>,
    user_workouts: BTreeMap<String, Vec<String>>,
    pending_reactions: BTreeMap<String, StoredPending>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    tracked_since: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredPending {
    message_id: Snowflake,
    timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Snowflake {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredGoal {
    Count(i64),
    Legacy(i64, i64),
}

/// Document as read from disk; values are decoded one entry at a time.
#[derive(Debug, Default, Deserialize)]
struct RawState {
    #[serde(default)]
    user_goals: BTreeMap<String, Value>,
    #[serde(default)]
    user_workouts: BTreeMap<String, Value>,
    #[serde(default)]
    pending_reactions: BTreeMap<String, Value>,
    #[serde(default)]
    tracked_since: BTreeMap<String, Value>,
}

/// Reads and writes the tracker state as a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
    tz: Tz,
}

impl JsonStore {
    /// Create a store for `path`. Timestamps without an offset are read in `tz`.
    pub fn new(path: impl Into<PathBuf>, tz: Tz) -> Self {
        Self { path: path.into(), tz }
    }

    /// Location of the data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state. A missing or empty file yields an empty state.
    pub async fn load(&self) -> Result<WorkoutState, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No workout data file yet, starting empty");
                return Ok(WorkoutState::default());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            warn!(path = %self.path.display(), "Workout data file is empty, starting empty");
            return Ok(WorkoutState::default());
        }

        let raw: RawState = serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        let state = self.decode(raw);
        info!(
            path = %self.path.display(),
            tracked = state.goals.len(),
            pending = state.pending.len(),
            "Loaded workout data"
        );
        Ok(state)
    }

    /// Rewrite the whole file with `state`.
    ///
    /// The document goes to a sibling temporary file first and is renamed over
    /// the data file, so readers never see a half-written document.
    pub async fn save(&self, state: &WorkoutState) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&encode(state))?;
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, bytes).await.map_err(write_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(write_err)?;

        debug!(path = %self.path.display(), "Saved workout data");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "workout_data.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn decode(&self, raw: RawState) -> WorkoutState {
        let mut state = WorkoutState::default();

        for (key, value) in raw.user_goals {
            let Some(user) = parse_user(&key, "user_goals") else {
                continue;
            };
            let goal = match serde_json::from_value::<StoredGoal>(value) {
                Ok(StoredGoal::Count(goal) | StoredGoal::Legacy(goal, _)) => u32::try_from(goal).ok().filter(|g| *g > 0),
                Err(_) => None,
            };
            match goal {
                Some(goal) => {
                    state.goals.insert(user, goal);
                }
                None => warn!(user = %user, "Skipping unreadable or non-positive goal"),
            }
        }

        for (key, value) in raw.user_workouts {
            let Some(user) = parse_user(&key, "user_workouts") else {
                continue;
            };
            let Ok(entries) = serde_json::from_value::<Vec<String>>(value) else {
                warn!(user = %user, "Skipping workout log that is not a list of timestamps");
                continue;
            };
            let log = entries
                .iter()
                .filter_map(|raw| {
                    let parsed = parse_timestamp(raw, self.tz);
                    if parsed.is_none() {
                        warn!(user = %user, timestamp = %raw, "Skipping unreadable workout timestamp");
                    }
                    parsed
                })
                .collect();
            state.workouts.insert(user, log);
        }

        for (key, value) in raw.pending_reactions {
            let Some(user) = parse_user(&key, "pending_reactions") else {
                continue;
            };
            match self.decode_pending(value) {
                Some(pending) => {
                    state.pending.insert(user, pending);
                }
                None => warn!(user = %user, "Skipping unreadable pending acknowledgment"),
            }
        }

        for (key, value) in raw.tracked_since {
            let Some(user) = parse_user(&key, "tracked_since") else {
                continue;
            };
            match value.as_str().and_then(|raw| parse_timestamp(raw, self.tz)) {
                Some(since) => {
                    state.tracked_since.insert(user, since);
                }
                None => warn!(user = %user, "Skipping unreadable opt-in timestamp"),
            }
        }

        state.normalize();
        state
    }

    fn decode_pending(&self, value: Value) -> Option<PendingAcknowledgment> {
        let stored: StoredPending = serde_json::from_value(value).ok()?;
        let message_id = match stored.message_id {
            Snowflake::Number(id) => MessageId(id),
            Snowflake::Text(text) => text.parse().ok()?,
        };
        Some(PendingAcknowledgment {
            message_id,
            created_at: parse_timestamp(&stored.timestamp, self.tz)?,
        })
    }
}

fn encode(state: &WorkoutState) -> StoredState {
    StoredState {
        user_goals: state
            .goals
            .iter()
            .map(|(user, goal)| (user.to_string(), *goal))
            .collect(),
        user_workouts: state
            .workouts
            .iter()
            .map(|(user, log)| (user.to_string(), log.iter().map(DateTime::to_rfc3339).collect()))
            .collect(),
        pending_reactions: state
            .pending
            .iter()
            .map(|(user, pending)| {
                (
                    user.to_string(),
                    StoredPending {
                        message_id: Snowflake::Number(pending.message_id.0),
                        timestamp: pending.created_at.to_rfc3339(),
                    },
                )
            })
            .collect(),
        tracked_since: state
            .tracked_since
            .iter()
            .map(|(user, since)| (user.to_string(), since.to_rfc3339()))
            .collect(),
    }
}

fn parse_user(key: &str, section: &str) -> Option<UserId> {
    let parsed = key.parse().ok();
    if parsed.is_none() {
        warn!(key = %key, section, "Skipping entry with a non-numeric user id");
    }
    parsed
}

/// Parses an ISO-8601 timestamp. Values without an offset are local to `tz`.
pub fn parse_timestamp(raw: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_common::test_utils::{create_temp_dir, mock_timestamp};

    fn store_in(dir: &tempfile::TempDir) -> JsonStore {
        JsonStore::new(dir.path().join("workout_data.json"), chrono_tz::UTC)
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty_state() {
        let dir = create_temp_dir();
        let state = store_in(&dir).load().await.unwrap();
        assert_eq!(state, WorkoutState::default());
    }

    #[tokio::test]
    async fn test_empty_file_loads_empty_state() {
        let dir = create_temp_dir();
        let store = store_in(&dir);
        tokio::fs::write(store.path(), "  \n").await.unwrap();
        assert_eq!(store.load().await.unwrap(), WorkoutState::default());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = create_temp_dir();
        let store = store_in(&dir);
        tokio::fs::write(store.path(), "{not json").await.unwrap();
        assert!(matches!(store.load().await, Err(StoreError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_save_then_load_preserves_state() {
        let dir = create_temp_dir();
        let store = store_in(&dir);
        let now = mock_timestamp(2024, 4, 2, 18, 30, 0);

        let mut state = WorkoutState::default();
        state.set_goal(UserId(11), 3, now);
        state.record_workout(UserId(11), now);
        state.record_workout(UserId(12), now);
        state.set_pending(
            UserId(11),
            PendingAcknowledgment {
                message_id: MessageId(1_234_567_890_123_456_789),
                created_at: now,
            },
        );

        store.save(&state).await.unwrap();
        assert!(!store.temp_path().exists());
        assert_eq!(store.load().await.unwrap(), state);
    }

    #[tokio::test]
    async fn test_save_creates_parent_directories() {
        let dir = create_temp_dir();
        let store = JsonStore::new(dir.path().join("nested/data/workouts.json"), chrono_tz::UTC);
        store.save(&WorkoutState::default()).await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_legacy_document_is_normalized() {
        let dir = create_temp_dir();
        let store = JsonStore::new(dir.path().join("legacy.json"), chrono_tz::America::Chicago);
        let legacy = r#"{
            "user_goals": {"100": [4, 17], "200": 2, "300": 0, "abc": 3},
            "user_workouts": {
                "100": ["2024-01-10T07:15:00", "2024-01-09T07:15:00.123456", "garbage"],
                "400": ["2024-01-10T07:15:00+00:00"]
            },
            "pending_reactions": {
                "100": {"message_id": "1187000000000000001", "timestamp": "2024-01-08T00:00:05"},
                "200": {"message_id": 1187000000000000002}
            }
        }"#;
        tokio::fs::write(store.path(), legacy).await.unwrap();

        let state = store.load().await.unwrap();

        assert_eq!(state.goal(UserId(100)), Some(4));
        assert_eq!(state.goal(UserId(200)), Some(2));
        assert!(!state.is_tracked(UserId(300)));
        assert_eq!(state.goals().count(), 2);

        // Naive timestamps are Chicago wall-clock time (UTC-6 in January).
        assert_eq!(
            state.history(UserId(100)),
            &[
                mock_timestamp(2024, 1, 9, 13, 15, 0) + chrono::Duration::microseconds(123_456),
                mock_timestamp(2024, 1, 10, 13, 15, 0),
            ]
        );
        // Every tracked user has a log, even if the file lacked one.
        assert!(state.history(UserId(200)).is_empty());
        assert_eq!(state.history(UserId(400)).len(), 1);

        let pending = state.pending(UserId(100)).unwrap();
        assert_eq!(pending.message_id, MessageId(1_187_000_000_000_000_001));
        assert_eq!(pending.created_at, mock_timestamp(2024, 1, 8, 6, 0, 5));
        assert!(state.pending(UserId(200)).is_none());
    }

    #[tokio::test]
    async fn test_saved_document_uses_bare_goals() {
        let dir = create_temp_dir();
        let store = store_in(&dir);
        let mut state = WorkoutState::default();
        state.set_goal(UserId(5), 2, mock_timestamp(2024, 4, 2, 18, 30, 0));
        store.save(&state).await.unwrap();

        let text = tokio::fs::read_to_string(store.path()).await.unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["user_goals"]["5"], 2);
        assert_eq!(value["user_workouts"]["5"], serde_json::json!([]));
        assert!(value["pending_reactions"].as_object().unwrap().is_empty());
        assert_eq!(value["tracked_since"]["5"], "2024-04-02T18:30:00+00:00");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let tz = chrono_tz::UTC;
        let expected = mock_timestamp(2024, 1, 1, 12, 0, 0);
        assert_eq!(parse_timestamp("2024-01-01T12:00:00Z", tz), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T13:00:00+01:00", tz), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01 12:00:00", tz), Some(expected));
        assert_eq!(parse_timestamp("yesterday", tz), None);
    }
}
