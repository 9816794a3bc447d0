//! Daily birthday reminder matching.

use chrono::{Days, NaiveDate};
use hearth_common::UserId;

use crate::store::BirthdayRecord;

/// Why a reminder is posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    /// The birthday is today.
    Today,
    /// The birthday is exactly seven days away.
    NextWeek,
}

/// A reminder due on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reminder {
    /// Whose birthday it is.
    pub user: UserId,
    /// Greeting or heads-up.
    pub kind: ReminderKind,
}

impl Reminder {
    /// Channel message for this reminder.
    pub fn message(&self) -> String {
        match self.kind {
            ReminderKind::Today => format!("🎂 Happy Birthday, {}! 🎉", self.user.mention()),
            ReminderKind::NextWeek => format!(
                "🎉 Heads up! {}'s birthday is coming up in a week!",
                self.user.mention()
            ),
        }
    }
}

/// Reminders due on `today` (a local calendar date).
pub fn due_reminders(records: &[BirthdayRecord], today: NaiveDate) -> Vec<Reminder> {
    let next_week = today + Days::new(7);
    records
        .iter()
        .filter_map(|record| {
            let kind = if record.date.falls_on(today) {
                ReminderKind::Today
            } else if record.date.falls_on(next_week) {
                ReminderKind::NextWeek
            } else {
                return None;
            };
            Some(Reminder {
                user: record.user,
                kind,
            })
        })
        .collect()
}
