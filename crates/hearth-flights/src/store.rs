//! The last seen schedule as a JSON file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{FlightError, Result};
use crate::schedule::Flight;

/// JSON list of [`Flight`] rows.
#[derive(Debug, Clone)]
pub struct FlightStore {
    path: PathBuf,
}

impl FlightStore {
    /// Store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored schedule. A missing, unreadable or malformed file reads as empty.
    pub async fn load(&self) -> Vec<Flight> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read flight schedule, starting empty");
                return Vec::new();
            }
        };
        match serde_json::from_slice(&content) {
            Ok(flights) => flights,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Flight schedule file is not valid, starting empty");
                Vec::new()
            }
        }
    }

    /// Replace the stored schedule.
    pub async fn save(&self, flights: &[Flight]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(flights)?;
        let write_err = |source| FlightError::Write {
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

        debug!(path = %self.path.display(), count = flights.len(), "Saved flight schedule");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_common::test_utils::create_temp_dir;

    #[tokio::test]
    async fn test_missing_and_corrupt_files_read_empty() {
        let dir = create_temp_dir();
        let store = FlightStore::new(dir.path().join("flight_schedule.json"));
        assert!(store.load().await.is_empty());

        tokio::fs::write(store.path(), b"{ not json").await.unwrap();
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = create_temp_dir();
        let store = FlightStore::new(dir.path().join("nested").join("flight_schedule.json"));
        let flights = vec![Flight {
            flight: "1115".to_string(),
            destination: "Dover AFB, DE".to_string(),
            seats: "44F".to_string(),
        }];

        store.save(&flights).await.unwrap();
        assert_eq!(store.load().await, flights);
    }
}
