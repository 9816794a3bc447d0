//! New-flight detection over a [`ScheduleSource`].

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::Result;
use crate::fetcher::ScheduleSource;
use crate::schedule::{new_flights, Flight};
use crate::store::FlightStore;

/// Remembers the last schedule and reports what changed.
pub struct FlightWatcher {
    source: Arc<dyn ScheduleSource>,
    store: FlightStore,
    known: Mutex<Vec<Flight>>,
}

impl FlightWatcher {
    /// Load the stored schedule and watch `source`.
    pub async fn open(source: Arc<dyn ScheduleSource>, store: FlightStore) -> Self {
        let known = store.load().await;
        info!(path = %store.path().display(), known = known.len(), "Flight schedule loaded");
        Self {
            source,
            store,
            known: Mutex::new(known),
        }
    }

    /// The schedule as published right now, without touching the stored one.
    pub async fn current(&self) -> Result<Vec<Flight>> {
        self.source.latest().await
    }

    /// Fetch the schedule and return the rows not seen before.
    ///
    /// When anything is new the stored schedule is replaced by the fetched one.
    pub async fn check(&self) -> Result<Vec<Flight>> {
        let latest = self.source.latest().await?;
        let mut known = self.known.lock().await;
        let fresh = new_flights(&known, &latest);
        if !fresh.is_empty() {
            self.store.save(&latest).await?;
            *known = latest;
        }
        info!(new = fresh.len(), "Flight schedule checked");
        Ok(fresh)
    }
}
