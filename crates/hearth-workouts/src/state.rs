//! In-memory tracker state: goals, workout logs, pending acknowledgments.

use chrono::{DateTime, Utc};
use hearth_common::{MessageId, UserId};
use std::collections::BTreeMap;
use tracing::warn;

/// An escalation message the user has to react to before the window closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAcknowledgment {
    /// The escalation message in the announcement channel.
    pub message_id: MessageId,
    /// When the record was created; the acknowledgment window starts here.
    pub created_at: DateTime<Utc>,
}

/// One row of the all-time leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// Tracked user.
    pub user: UserId,
    /// All-time confirmed workouts.
    pub total: usize,
}

/// The tracker's system of record.
///
/// Every user with a goal also has a (possibly empty) workout log, and every
/// log is sorted ascending. Opting out keeps the log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkoutState {
    pub(crate) goals: BTreeMap<UserId, u32>,
    pub(crate) workouts: BTreeMap<UserId, Vec<DateTime<Utc>>>,
    pub(crate) pending: BTreeMap<UserId, PendingAcknowledgment>,
    pub(crate) tracked_since: BTreeMap<UserId, DateTime<Utc>>,
}

impl WorkoutState {
    /// Weekly goal of a tracked user.
    pub fn goal(&self, user: UserId) -> Option<u32> {
        self.goals.get(&user).copied()
    }

    /// Whether the user currently has a goal.
    pub fn is_tracked(&self, user: UserId) -> bool {
        self.goals.contains_key(&user)
    }

    /// All tracked users with their goals, ordered by user id.
    pub fn goals(&self) -> impl Iterator<Item = (UserId, u32)> + '_ {
        self.goals.iter().map(|(user, goal)| (*user, *goal))
    }

    /// Sorted workout timestamps of a user; empty when none were logged.
    pub fn history(&self, user: UserId) -> &[DateTime<Utc>] {
        self.workouts.get(&user).map(Vec::as_slice).unwrap_or_default()
    }

    /// Outstanding acknowledgment of a user.
    pub fn pending(&self, user: UserId) -> Option<PendingAcknowledgment> {
        self.pending.get(&user).copied()
    }

    /// All outstanding acknowledgments, ordered by user id.
    pub fn pending_acknowledgments(&self) -> impl Iterator<Item = (UserId, PendingAcknowledgment)> + '_ {
        self.pending.iter().map(|(user, pending)| (*user, *pending))
    }

    /// When the user last opted in, if known.
    pub fn tracked_since(&self, user: UserId) -> Option<DateTime<Utc>> {
        self.tracked_since.get(&user).copied()
    }

    /// Upserts a goal and returns the previous one.
    ///
    /// The opt-in instant is recorded only when the user was not tracked, so
    /// repeating the call leaves the state unchanged.
    pub fn set_goal(&mut self, user: UserId, goal: u32, now: DateTime<Utc>) -> Option<u32> {
        let previous = self.goals.insert(user, goal);
        self.workouts.entry(user).or_default();
        self.tracked_since.entry(user).or_insert(now);
        previous
    }

    /// Stops tracking a user, keeping their workout log.
    ///
    /// Returns `false` when the user was not tracked.
    pub fn opt_out(&mut self, user: UserId) -> bool {
        let was_tracked = self.goals.remove(&user).is_some();
        self.pending.remove(&user);
        self.tracked_since.remove(&user);
        was_tracked
    }

    /// Appends a workout and returns the user's all-time total.
    pub fn record_workout(&mut self, user: UserId, at: DateTime<Utc>) -> usize {
        let log = self.workouts.entry(user).or_default();
        let index = log.partition_point(|t| *t <= at);
        log.insert(index, at);
        log.len()
    }

    /// Stores an outstanding acknowledgment.
    pub fn set_pending(&mut self, user: UserId, pending: PendingAcknowledgment) {
        self.pending.insert(user, pending);
    }

    /// Clears an outstanding acknowledgment.
    pub fn clear_pending(&mut self, user: UserId) -> Option<PendingAcknowledgment> {
        self.pending.remove(&user)
    }

    /// Tracked users by all-time workouts, descending; ties by user id.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<_> = self
            .goals
            .keys()
            .map(|user| LeaderboardEntry {
                user: *user,
                total: self.history(*user).len(),
            })
            .collect();
        entries.sort_by(|a, b| b.total.cmp(&a.total).then(a.user.cmp(&b.user)));
        entries
    }

    /// Records `at` as the opt-in instant of tracked users that have none.
    ///
    /// Returns how many users were given one.
    pub fn backfill_tracked_since(&mut self, at: DateTime<Utc>) -> usize {
        let mut backfilled = 0;
        for user in self.goals.keys() {
            if !self.tracked_since.contains_key(user) {
                self.tracked_since.insert(*user, at);
                backfilled += 1;
            }
        }
        backfilled
    }

    /// Restores the invariants after loading data from disk.
    pub(crate) fn normalize(&mut self) {
        for user in self.goals.keys() {
            self.workouts.entry(*user).or_default();
        }
        for log in self.workouts.values_mut() {
            log.sort();
        }

        let goals = &self.goals;
        self.pending.retain(|user, _| {
            let keep = goals.contains_key(user);
            if !keep {
                warn!(user = %user, "Dropping pending acknowledgment of an untracked user");
            }
            keep
        });
        self.tracked_since.retain(|user, _| goals.contains_key(user));
    }
}
