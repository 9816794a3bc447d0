//! Declared relationships between members, kept in a JSON file.

use hearth_common::UserId;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Connection store errors.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Both ends are the same member.
    #[error("You cannot create a connection with yourself.")]
    SelfConnection,

    /// The data file exists but could not be read.
    #[error("Failed to read connections from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The data file is not a list of connections.
    #[error("Connections in {path} are not valid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The data file could not be written.
    #[error("Failed to write connections to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The connections could not be serialized.
    #[error("Failed to serialize connections: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Kind of relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// Siblings.
    Sibling,
    /// Friends.
    Friend,
    /// Roommates.
    Roommate,
    /// Partners.
    Partner,
    /// Acquaintances.
    Acquaintance,
    /// Cousins.
    Cousin,
}

impl ConnectionKind {
    /// Every kind, in legend order.
    pub const ALL: [Self; 6] = [
        Self::Sibling,
        Self::Friend,
        Self::Roommate,
        Self::Partner,
        Self::Acquaintance,
        Self::Cousin,
    ];

    /// Stored and displayed name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sibling => "sibling",
            Self::Friend => "friend",
            Self::Roommate => "roommate",
            Self::Partner => "partner",
            Self::Acquaintance => "acquaintance",
            Self::Cousin => "cousin",
        }
    }

    /// Legend label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Sibling => "Sibling",
            Self::Friend => "Friend",
            Self::Roommate => "Roommate",
            Self::Partner => "Partner",
            Self::Acquaintance => "Acquaintance",
            Self::Cousin => "Cousin",
        }
    }

    /// Edge colour on the chart.
    pub fn color(self) -> RGBColor {
        match self {
            Self::Sibling => RGBColor(0, 0, 255),
            Self::Friend => RGBColor(0, 128, 0),
            Self::Roommate => RGBColor(255, 165, 0),
            Self::Partner => RGBColor(255, 0, 0),
            Self::Acquaintance => RGBColor(128, 128, 128),
            Self::Cousin => RGBColor(0, 128, 128),
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Member who declared it.
    pub user1: UserId,
    /// The other member.
    pub user2: UserId,
    /// Relationship kind.
    pub connection: ConnectionKind,
}

impl Connection {
    /// Whether this joins `a` and `b` (either way round) as `kind`.
    pub fn joins(&self, a: UserId, b: UserId, kind: ConnectionKind) -> bool {
        self.connection == kind && ((self.user1 == a && self.user2 == b) || (self.user1 == b && self.user2 == a))
    }
}

/// The connection list plus its file.
pub struct ConnectionStore {
    path: PathBuf,
    connections: RwLock<Vec<Connection>>,
}

impl ConnectionStore {
    /// Load `path`; a missing file is an empty list.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, ConnectionError> {
        let path = path.into();
        let connections = match tokio::fs::read(&path).await {
            Ok(content) => serde_json::from_slice(&content).map_err(|source| ConnectionError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(ConnectionError::Read { path, source }),
        };
        info!(path = %path.display(), count = connections.len(), "Connections loaded");
        Ok(Self {
            path,
            connections: RwLock::new(connections),
        })
    }

    /// Record that `from` declared `kind` with `to`.
    pub async fn add(&self, from: UserId, to: UserId, kind: ConnectionKind) -> Result<(), ConnectionError> {
        if from == to {
            return Err(ConnectionError::SelfConnection);
        }
        let mut connections = self.connections.write().await;
        connections.push(Connection {
            user1: from,
            user2: to,
            connection: kind,
        });
        self.save(&connections).await?;
        info!(from = %from, to = %to, kind = %kind, "Connection added");
        Ok(())
    }

    /// Remove every `kind` connection between `a` and `b`. Returns how many went.
    pub async fn remove(&self, a: UserId, b: UserId, kind: ConnectionKind) -> Result<usize, ConnectionError> {
        let mut connections = self.connections.write().await;
        let before = connections.len();
        connections.retain(|c| !c.joins(a, b, kind));
        let removed = before - connections.len();
        if removed > 0 {
            self.save(&connections).await?;
            info!(a = %a, b = %b, kind = %kind, removed, "Connection removed");
        }
        Ok(removed)
    }

    /// A copy of every connection.
    pub async fn all(&self) -> Vec<Connection> {
        self.connections.read().await.clone()
    }

    async fn save(&self, connections: &[Connection]) -> Result<(), ConnectionError> {
        let bytes = serde_json::to_vec(connections)?;
        let write_err = |source| ConnectionError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        tokio::fs::write(&tmp, bytes).await.map_err(write_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(write_err)?;
        debug!(path = %self.path.display(), "Saved connections");
        Ok(())
    }
}

/// Reply after `/addconnection`.
pub fn added_message(from: &str, kind: ConnectionKind, to: &str) -> String {
    format!("Added connection: {from} — {kind} — {to}")
}

/// Reply after `/removeconnection`.
pub fn removed_message(from: &str, kind: ConnectionKind, to: &str) -> String {
    format!("Removed connection: {from} — {kind} — {to}")
}

/// Reply when `/removeconnection` matched nothing.
pub const NO_MATCH: &str = "No matching connection found.";

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_common::test_utils::create_temp_dir;

    #[test]
    fn test_stored_shape() {
        let connection = Connection {
            user1: UserId(1),
            user2: UserId(2),
            connection: ConnectionKind::Roommate,
        };
        let json = serde_json::to_string(&connection).unwrap();
        assert_eq!(json, r#"{"user1":1,"user2":2,"connection":"roommate"}"#);
    }

    #[tokio::test]
    async fn test_self_connection_is_rejected() {
        let dir = create_temp_dir();
        let store = ConnectionStore::open(dir.path().join("connection_chart.json")).await.unwrap();

        let err = store.add(UserId(3), UserId(3), ConnectionKind::Friend).await.unwrap_err();
        assert_eq!(err.to_string(), "You cannot create a connection with yourself.");
        assert!(store.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_matches_either_direction_and_kind_only() {
        let dir = create_temp_dir();
        let path = dir.path().join("connection_chart.json");
        let store = ConnectionStore::open(&path).await.unwrap();
        store.add(UserId(1), UserId(2), ConnectionKind::Friend).await.unwrap();
        store.add(UserId(1), UserId(2), ConnectionKind::Cousin).await.unwrap();

        assert_eq!(store.remove(UserId(2), UserId(1), ConnectionKind::Friend).await.unwrap(), 1);
        assert_eq!(store.remove(UserId(2), UserId(1), ConnectionKind::Friend).await.unwrap(), 0);

        let reopened = ConnectionStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.all().await,
            vec![Connection {
                user1: UserId(1),
                user2: UserId(2),
                connection: ConnectionKind::Cousin,
            }]
        );
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = create_temp_dir();
        let path = dir.path().join("connection_chart.json");
        tokio::fs::write(&path, br#"[{"user1":1,"user2":2,"connection":"nemesis"}]"#)
            .await
            .unwrap();

        assert!(matches!(
            ConnectionStore::open(&path).await,
            Err(ConnectionError::Parse { .. })
        ));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            added_message("Ada", ConnectionKind::Partner, "Grace"),
            "Added connection: Ada — partner — Grace"
        );
        assert_eq!(
            removed_message("Ada", ConnectionKind::Sibling, "Grace"),
            "Removed connection: Ada — sibling — Grace"
        );
    }
}
