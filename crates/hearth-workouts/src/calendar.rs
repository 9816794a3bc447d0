//! Week boundaries (Monday 00:00) in the configured timezone.
//!
//! All arithmetic happens on local calendar dates and is converted back to
//! UTC instants afterwards, so weeks that contain a DST change are 167 or 169
//! hours long instead of drifting by an hour.

use chrono::{DateTime, Datelike, Days, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// A calendar week as the half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Week {
    /// Monday 00:00 local time.
    pub start: DateTime<Utc>,
    /// The following Monday 00:00 local time.
    pub end: DateTime<Utc>,
}

impl Week {
    /// Whether `at` falls inside this week.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    /// Number of timestamps inside this week.
    ///
    /// `history` must be sorted ascending.
    pub fn count(&self, history: &[DateTime<Utc>]) -> usize {
        let first = history.partition_point(|t| *t < self.start);
        let last = history.partition_point(|t| *t < self.end);
        last.saturating_sub(first)
    }
}

/// Computes weeks in a fixed timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekCalendar {
    tz: Tz,
}

impl WeekCalendar {
    /// Create a calendar for the given timezone.
    pub const fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// The timezone weeks are computed in.
    pub const fn timezone(&self) -> Tz {
        self.tz
    }

    /// The week containing `at`.
    pub fn week_containing(&self, at: DateTime<Utc>) -> Week {
        let local = at.with_timezone(&self.tz).date_naive();
        let monday = local - Days::new(u64::from(local.weekday().num_days_from_monday()));
        self.week_starting(monday)
    }

    /// The week immediately before `week`.
    pub fn previous(&self, week: Week) -> Week {
        let monday = week.start.with_timezone(&self.tz).date_naive() - Days::new(7);
        self.week_starting(monday)
    }

    /// The first boundary strictly after `now`.
    pub fn next_boundary(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.week_containing(now).end
    }

    /// Adds whole local days to an instant, keeping the local wall-clock time.
    pub fn add_local_days(&self, at: DateTime<Utc>, days: u32) -> DateTime<Utc> {
        let local = at.with_timezone(&self.tz).naive_local();
        self.localize(local + Days::new(u64::from(days)))
    }

    /// The next occurrence of a local wall-clock time strictly after `now`.
    pub fn next_daily(&self, now: DateTime<Utc>, time: NaiveTime) -> DateTime<Utc> {
        let today = now.with_timezone(&self.tz).date_naive();
        let candidate = self.localize(today.and_time(time));
        if candidate > now {
            candidate
        } else {
            self.localize((today + Days::new(1)).and_time(time))
        }
    }

    /// The local calendar date of an instant.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.tz).date_naive()
    }

    fn week_starting(&self, monday: NaiveDate) -> Week {
        Week {
            start: self.localize(monday.and_time(NaiveTime::default())),
            end: self.localize((monday + Days::new(7)).and_time(NaiveTime::default())),
        }
    }

    fn localize(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(t) => t.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
            // Inside a DST gap: take the first valid local hour after it.
            LocalResult::None => (1..=3)
                .find_map(|hours| {
                    self.tz
                        .from_local_datetime(&(naive + Duration::hours(hours)))
                        .earliest()
                })
                .map_or_else(|| Utc.from_utc_datetime(&naive), |t| t.with_timezone(&Utc)),
        }
    }
}
