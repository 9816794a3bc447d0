//! Flight schedule command.

use hearth_flights::{summary_message, FlightWatcher};
use std::sync::Arc;
use tracing::warn;

use crate::framework::{CommandError, Context, Error};

fn watcher(ctx: &Context<'_>) -> Result<Arc<FlightWatcher>, Error> {
    ctx.data()
        .flights
        .clone()
        .ok_or_else(|| CommandError::CogDisabled("flight schedule").into())
}

/// Reply to a manual check: the first flights, or why the fetch failed.
pub fn manual_check_reply<E: std::fmt::Display>(result: Result<Vec<hearth_flights::Flight>, E>) -> String {
    match result {
        Ok(flights) => summary_message(&flights),
        Err(e) => format!("Error during manual check: {e}"),
    }
}

/// Manually check the 72-hour flight schedule.
#[poise::command(slash_command)]
pub async fn check_flights(ctx: Context<'_>) -> Result<(), Error> {
    let watcher = watcher(&ctx)?;
    ctx.defer().await?;

    let result = watcher.current().await;
    if let Err(e) = &result {
        warn!(error = %e, "Manual flight check failed");
    }
    ctx.say(manual_check_reply(result)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_flights::{Flight, FlightError};

    #[test]
    fn test_manual_check_reply() {
        let flights = vec![Flight {
            flight: "0930".to_string(),
            destination: "RAMSTEIN".to_string(),
            seats: "40".to_string(),
        }];
        assert!(manual_check_reply::<FlightError>(Ok(flights)).contains("1. 0930 to RAMSTEIN (40)"));
        assert_eq!(manual_check_reply::<FlightError>(Ok(Vec::new())), "No flights found in the schedule.");

        let failed = manual_check_reply(Err(FlightError::LinkNotFound("72-Hour-Schedule".to_string())));
        assert!(failed.starts_with("Error during manual check: "));
    }
}
