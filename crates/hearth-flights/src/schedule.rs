//! Schedule rows and the text that announces them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Rows listed by `/check_flights`.
pub const SUMMARY_LIMIT: usize = 5;

/// One row of the 72-hour schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    /// Roll call time, e.g. `1115`.
    #[serde(rename = "Flight")]
    pub flight: String,
    /// Destination as printed, e.g. `Dover AFB, DE`.
    #[serde(rename = "Destination")]
    pub destination: String,
    /// Seat release, e.g. `44F` or `TBD`.
    #[serde(rename = "Seats")]
    pub seats: String,
}

impl Flight {
    /// Identity of a row across fetches.
    pub fn key(&self) -> String {
        format!("{}|{}|{}", self.flight, self.destination, self.seats)
    }
}

/// Pull flight rows out of extracted PDF text.
///
/// A row is a line of at least three words whose first word is all digits:
/// the first word is the flight, the last the seats, everything between the
/// destination.
pub fn parse_flights(text: &str) -> Vec<Flight> {
    text.lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let (first, rest) = parts.split_first()?;
            let (seats, destination) = rest.split_last()?;
            if destination.is_empty() || !first.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            Some(Flight {
                flight: (*first).to_string(),
                destination: destination.join(" "),
                seats: (*seats).to_string(),
            })
        })
        .collect()
}

/// Rows of `latest` that were not in `previous`.
pub fn new_flights(previous: &[Flight], latest: &[Flight]) -> Vec<Flight> {
    let known: HashSet<String> = previous.iter().map(Flight::key).collect();
    latest
        .iter()
        .filter(|flight| !known.contains(&flight.key()))
        .cloned()
        .collect()
}

/// Channel notice for a newly listed flight.
pub fn new_flight_message(flight: &Flight) -> String {
    format!(
        "✈️ **New Flight**: {}\n• To: {}\n• Seats: {}",
        flight.flight, flight.destination, flight.seats
    )
}

/// Reply to `/check_flights`.
pub fn summary_message(flights: &[Flight]) -> String {
    if flights.is_empty() {
        return "No flights found in the schedule.".to_string();
    }
    let lines: Vec<String> = flights
        .iter()
        .take(SUMMARY_LIMIT)
        .enumerate()
        .map(|(i, f)| format!("{}. {} to {} ({})", i + 1, f.flight, f.destination, f.seats))
        .collect();
    format!("**Upcoming Flights (first {SUMMARY_LIMIT}):**\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight(flight: &str, destination: &str, seats: &str) -> Flight {
        Flight {
            flight: flight.to_string(),
            destination: destination.to_string(),
            seats: seats.to_string(),
        }
    }

    #[test]
    fn test_parse_keeps_only_numbered_rows() {
        let text = "JB ANDREWS 72 HOUR SLIDE\n\
                    ROLL CALL DESTINATION SEATS\n\
                    1115 Dover AFB, DE 44F\n\
                    \n\
                      0730   Ramstein AB, Germany   TBD  \n\
                    0900 Rota\n\
                    12a5 Nowhere 1F\n";

        assert_eq!(
            parse_flights(text),
            vec![
                flight("1115", "Dover AFB, DE", "44F"),
                flight("0730", "Ramstein AB, Germany", "TBD"),
            ]
        );
    }

    #[test]
    fn test_new_flights_compares_whole_rows() {
        let previous = vec![flight("1115", "Dover AFB, DE", "44F")];
        let latest = vec![
            flight("1115", "Dover AFB, DE", "44F"),
            flight("1115", "Dover AFB, DE", "20F"),
            flight("0730", "Rota, Spain", "TBD"),
        ];

        let fresh = new_flights(&previous, &latest);
        assert_eq!(fresh, latest[1..].to_vec());
        assert!(new_flights(&latest, &latest).is_empty());
    }

    #[test]
    fn test_messages() {
        let rows: Vec<Flight> = (1..=7).map(|i| flight(&format!("0{i}00"), "Travis AFB, CA", "10F")).collect();

        assert_eq!(
            new_flight_message(&rows[0]),
            "✈️ **New Flight**: 0100\n• To: Travis AFB, CA\n• Seats: 10F"
        );
        let summary = summary_message(&rows);
        assert!(summary.starts_with("**Upcoming Flights (first 5):**\n1. 0100 to Travis AFB, CA (10F)"));
        assert_eq!(summary.lines().count(), 6);
        assert_eq!(summary_message(&[]), "No flights found in the schedule.");
    }

    #[test]
    fn test_stored_field_names() {
        let json = serde_json::to_string(&flight("1115", "Dover AFB, DE", "44F")).unwrap();
        assert_eq!(json, r#"{"Flight":"1115","Destination":"Dover AFB, DE","Seats":"44F"}"#);
    }
}
