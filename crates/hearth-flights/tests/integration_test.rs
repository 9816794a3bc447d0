//! Integration tests for hearth-flights crate.

use async_trait::async_trait;
use hearth_common::test_utils::create_temp_dir;
use hearth_flights::{Flight, FlightError, FlightStore, FlightWatcher, Result, ScheduleSource};
use std::sync::{Arc, Mutex};

/// Serves prepared schedules in order; errors once they run out.
#[derive(Default)]
struct ScriptedSource {
    schedules: Mutex<Vec<Vec<Flight>>>,
}

impl ScriptedSource {
    fn new(mut schedules: Vec<Vec<Flight>>) -> Arc<Self> {
        schedules.reverse();
        Arc::new(Self {
            schedules: Mutex::new(schedules),
        })
    }
}

#[async_trait]
impl ScheduleSource for ScriptedSource {
    async fn latest(&self) -> Result<Vec<Flight>> {
        self.schedules
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| FlightError::LinkNotFound("72-Hour-Schedule".to_string()))
    }
}

fn flight(flight: &str, destination: &str) -> Flight {
    Flight {
        flight: flight.to_string(),
        destination: destination.to_string(),
        seats: "TBD".to_string(),
    }
}

#[tokio::test]
async fn test_only_unseen_flights_are_reported_and_stored() {
    let dir = create_temp_dir();
    let path = dir.path().join("flight_schedule.json");
    let dover = flight("1115", "Dover AFB, DE");
    let rota = flight("0730", "Rota, Spain");
    let source = ScriptedSource::new(vec![
        vec![dover.clone()],
        vec![dover.clone()],
        vec![rota.clone(), dover.clone()],
    ]);

    let watcher = FlightWatcher::open(source, FlightStore::new(&path)).await;

    assert_eq!(watcher.check().await.unwrap(), vec![dover.clone()]);
    assert!(watcher.check().await.unwrap().is_empty());
    assert_eq!(watcher.check().await.unwrap(), vec![rota.clone()]);

    let stored = FlightStore::new(&path).load().await;
    assert_eq!(stored, vec![rota, dover]);
}

#[tokio::test]
async fn test_failed_fetch_keeps_stored_schedule() {
    let dir = create_temp_dir();
    let path = dir.path().join("flight_schedule.json");
    let store = FlightStore::new(&path);
    store.save(&[flight("1115", "Dover AFB, DE")]).await.unwrap();

    let watcher = FlightWatcher::open(ScriptedSource::new(Vec::new()), store).await;

    assert!(matches!(watcher.check().await, Err(FlightError::LinkNotFound(_))));
    assert_eq!(FlightStore::new(&path).load().await.len(), 1);
}

#[tokio::test]
async fn test_manual_listing_does_not_update_store() {
    let dir = create_temp_dir();
    let path = dir.path().join("flight_schedule.json");
    let source = ScriptedSource::new(vec![vec![flight("0900", "Travis AFB, CA")]]);

    let watcher = FlightWatcher::open(source, FlightStore::new(&path)).await;

    assert_eq!(watcher.current().await.unwrap().len(), 1);
    assert!(!path.exists());
}
