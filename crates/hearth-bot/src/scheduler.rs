//! Scheduler - wall-clock driven background loops
//!
//! Each loop computes its next fire time from the current wall clock, sleeps
//! until then (waking early only on cancellation) and runs one iteration.
//! An iteration that fails is logged and retried after a fixed delay; the
//! loops end only when their cancellation token fires.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use hearth_birthdays::{due_reminders, BirthdayError, BirthdayStore};
use hearth_common::{format_timestamp, ChannelId};
use hearth_flights::{new_flight_message, FlightError, FlightWatcher};
use hearth_workouts::{Notifier, RolloverPhase, TrackerError, WeekCalendar, WeeklyRollover};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Longest single nap; long waits are re-measured against the wall clock.
const MAX_NAP: Duration = Duration::from_secs(15 * 60);

/// Attempts at one week's rollover before it is given up.
pub const ROLLOVER_ATTEMPTS: u32 = 3;

/// Wall-clock source for the loops.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Sleep until `deadline` on `clock`. Returns `false` if cancelled first.
pub async fn sleep_until(clock: &dyn Clock, deadline: DateTime<Utc>, cancel: &CancellationToken) -> bool {
    loop {
        let Ok(remaining) = (deadline - clock.now()).to_std() else {
            return !cancel.is_cancelled();
        };
        if remaining.is_zero() {
            return !cancel.is_cancelled();
        }
        if !sleep_for(remaining.min(MAX_NAP), cancel).await {
            return false;
        }
    }
}

/// Sleep for `duration`. Returns `false` if cancelled first.
pub async fn sleep_for(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(duration) => true,
    }
}

/// Where the rollover loop stands across iterations.
#[derive(Debug, Default)]
struct CycleProgress {
    /// Boundary whose reminders already went out, so a retry does not repeat them.
    reminded_for: Option<DateTime<Utc>>,
    /// Boundary whose rollover failed, with the attempts made so far.
    unfinished: Option<(DateTime<Utc>, u32)>,
}

/// The weekly workout cycle as a long-running task.
pub struct RolloverTask {
    rollover: WeeklyRollover,
    retry_delay: Duration,
    clock: Arc<dyn Clock>,
}

impl RolloverTask {
    /// Create the task on the system clock.
    pub fn new(rollover: WeeklyRollover, retry_delay: Duration) -> Self {
        Self {
            rollover,
            retry_delay,
            clock: Arc::new(SystemClock),
        }
    }

    /// Drive the task from another clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run cycles until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        info!("Weekly rollover task started");
        let mut progress = CycleProgress::default();

        loop {
            match self.cycle(&cancel, &mut progress).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    error!(error = %e, retry_in = ?self.retry_delay, "Weekly rollover iteration failed");
                    if !sleep_for(self.retry_delay, &cancel).await {
                        break;
                    }
                }
            }
        }

        info!("Weekly rollover task stopped");
    }

    /// One pass through the phases. `Ok(false)` means cancelled.
    async fn cycle(&self, cancel: &CancellationToken, progress: &mut CycleProgress) -> Result<bool, TrackerError> {
        if let Some((boundary, attempts)) = progress.unfinished {
            self.roll_over(boundary, attempts, progress).await?;
            return Ok(true);
        }

        let now = self.clock.now();
        let plan = self.rollover.plan(now);
        let mut phase = plan.phase_at(now);
        debug!(warning_at = %plan.warning_at, boundary = %plan.boundary, ?phase, "Planned weekly cycle");

        loop {
            phase = match phase {
                RolloverPhase::Idle => {
                    if !sleep_until(&*self.clock, plan.warning_at, cancel).await {
                        return Ok(false);
                    }
                    RolloverPhase::Warning
                }
                RolloverPhase::Warning => {
                    if progress.reminded_for != Some(plan.boundary) {
                        self.rollover.send_reminders(self.clock.now()).await;
                        progress.reminded_for = Some(plan.boundary);
                    }
                    RolloverPhase::Settling
                }
                RolloverPhase::Settling => {
                    if !sleep_until(&*self.clock, plan.boundary, cancel).await {
                        return Ok(false);
                    }
                    RolloverPhase::Rollover
                }
                RolloverPhase::Rollover => {
                    self.roll_over(plan.boundary, 0, progress).await?;
                    return Ok(true);
                }
            };
        }
    }

    /// Evaluate the week ending at `boundary`, remembering a failure for the retry.
    async fn roll_over(
        &self,
        boundary: DateTime<Utc>,
        attempts: u32,
        progress: &mut CycleProgress,
    ) -> Result<(), TrackerError> {
        let attempt = attempts + 1;
        match self.rollover.run(boundary, self.clock.now()).await {
            Ok(_) => {
                progress.unfinished = None;
                Ok(())
            }
            Err(e) if attempt >= ROLLOVER_ATTEMPTS => {
                progress.unfinished = None;
                error!(boundary = %boundary, attempts = attempt, error = %e, "Giving up on weekly rollover");
                Ok(())
            }
            Err(e) => {
                progress.unfinished = Some((boundary, attempt));
                Err(e)
            }
        }
    }
}

/// The daily birthday check as a long-running task.
pub struct BirthdayTask {
    store: BirthdayStore,
    notifier: Arc<dyn Notifier>,
    channel: ChannelId,
    calendar: WeekCalendar,
    check_time: NaiveTime,
    retry_delay: Duration,
    clock: Arc<dyn Clock>,
}

impl BirthdayTask {
    /// Create the task.
    pub fn new(
        store: BirthdayStore,
        notifier: Arc<dyn Notifier>,
        channel: ChannelId,
        calendar: WeekCalendar,
        check_time: NaiveTime,
        retry_delay: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            channel,
            calendar,
            check_time,
            retry_delay,
            clock: Arc::new(SystemClock),
        }
    }

    /// Run daily checks until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        info!(check_time = %self.check_time, "Birthday reminder task started");

        loop {
            let next = self.calendar.next_daily(self.clock.now(), self.check_time);
            let local = next.with_timezone(&self.calendar.timezone());
            debug!(next = %format_timestamp(local), "Next birthday check scheduled");
            if !sleep_until(&*self.clock, next, &cancel).await {
                break;
            }
            if !self.check_with_retry(self.calendar.local_date(next), &cancel).await {
                break;
            }
        }

        info!("Birthday reminder task stopped");
    }

    /// Post the reminders due on `today`. Returns how many were posted.
    pub async fn check(&self, today: NaiveDate) -> Result<usize, BirthdayError> {
        let records = self.store.list().await?;
        let mut posted = 0;
        for reminder in due_reminders(&records, today) {
            match self.notifier.post(self.channel, &reminder.message()).await {
                Ok(_) => posted += 1,
                Err(e) => warn!(user = %reminder.user, error = %e, "Could not post birthday reminder"),
            }
        }
        info!(date = %today, posted, "Birthday check complete");
        Ok(posted)
    }

    /// Retry a failed check for as long as it is still `today`. `false` means cancelled.
    async fn check_with_retry(&self, today: NaiveDate, cancel: &CancellationToken) -> bool {
        loop {
            match self.check(today).await {
                Ok(_) => return true,
                Err(e) => {
                    error!(error = %e, retry_in = ?self.retry_delay, "Birthday check failed");
                    if !sleep_for(self.retry_delay, cancel).await {
                        return false;
                    }
                    if self.calendar.local_date(self.clock.now()) != today {
                        warn!(date = %today, "Giving up on a missed birthday check");
                        return true;
                    }
                }
            }
        }
    }
}

/// The periodic flight schedule check as a long-running task.
///
/// Checks once at start, then every `interval`. Each flight not seen before
/// is posted on its own.
pub struct FlightTask {
    watcher: Arc<FlightWatcher>,
    notifier: Arc<dyn Notifier>,
    channel: ChannelId,
    interval: Duration,
}

impl FlightTask {
    /// Create the task.
    pub fn new(watcher: Arc<FlightWatcher>, notifier: Arc<dyn Notifier>, channel: ChannelId, interval: Duration) -> Self {
        Self {
            watcher,
            notifier,
            channel,
            interval,
        }
    }

    /// Run checks until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        info!(interval = ?self.interval, "Flight schedule task started");

        loop {
            if cancel.is_cancelled() {
                break;
            }
            if let Err(e) = self.check().await {
                error!(error = %e, "Flight schedule check failed");
            }
            if !sleep_for(self.interval, &cancel).await {
                break;
            }
        }

        info!("Flight schedule task stopped");
    }

    /// Fetch the schedule and post every new flight. Returns how many were posted.
    pub async fn check(&self) -> Result<usize, FlightError> {
        let fresh = self.watcher.check().await?;
        let mut posted = 0;
        for flight in &fresh {
            match self.notifier.post(self.channel, &new_flight_message(flight)).await {
                Ok(_) => posted += 1,
                Err(e) => warn!(flight = %flight.flight, error = %e, "Could not post new flight"),
            }
        }
        Ok(posted)
    }
}
