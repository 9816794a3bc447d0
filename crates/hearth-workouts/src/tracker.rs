//! The workout tracker service.
//!
//! One [`WorkoutTracker`] is constructed at startup and shared by `Arc`
//! between the slash commands, the confirmation dialogue and the rollover
//! loop. Every mutation takes the write lock, applies the change and rewrites
//! the data file before releasing it, so saves always see a consistent
//! snapshot.

use chrono::{DateTime, Utc};
use hearth_common::UserId;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::state::{LeaderboardEntry, WorkoutState};
use crate::store::{JsonStore, StoreError};
use crate::streak::StreakCalculator;

/// Tracker operation errors.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Goals must be at least one workout per week.
    #[error("Your goal must be at least 1 workout per week (got {0}).")]
    InvalidGoal(i64),

    /// The user has no goal.
    #[error("User {0} is not participating in the workout tracker")]
    NotTracked(UserId),

    /// The data file could not be written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A user's standing, as reported by `my_workouts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkoutStatus {
    /// Weekly goal.
    pub goal: u32,
    /// Workouts in the current week.
    pub this_week: usize,
    /// All-time workouts.
    pub total: usize,
    /// Current streak in weeks.
    pub streak: u32,
}

/// Shared tracker state plus its persistence.
pub struct WorkoutTracker {
    state: RwLock<WorkoutState>,
    store: JsonStore,
    calculator: StreakCalculator,
}

impl WorkoutTracker {
    /// Wrap an already loaded state.
    pub fn new(state: WorkoutState, store: JsonStore, calculator: StreakCalculator) -> Self {
        Self {
            state: RwLock::new(state),
            store,
            calculator,
        }
    }

    /// Load the state from `store`.
    pub async fn open(store: JsonStore, calculator: StreakCalculator) -> Result<Self, TrackerError> {
        Self::open_at(store, calculator, Utc::now()).await
    }

    /// Load the state from `store` as of `now`.
    ///
    /// Tracked users read from older files have no opt-in instant. They are
    /// treated as opting in at `now`, and the file is rewritten with it, so
    /// weeks before the load are never counted as misses.
    pub async fn open_at(
        store: JsonStore,
        calculator: StreakCalculator,
        now: DateTime<Utc>,
    ) -> Result<Self, TrackerError> {
        let mut state = store.load().await?;
        let backfilled = state.backfill_tracked_since(now);
        if backfilled > 0 {
            info!(backfilled, "Recorded opt-in time for users loaded without one");
            store.save(&state).await?;
        }
        Ok(Self::new(state, store, calculator))
    }

    /// The calculator used for streaks and misses.
    pub const fn calculator(&self) -> &StreakCalculator {
        &self.calculator
    }

    /// Opt in or change the weekly goal. Returns the previous goal.
    ///
    /// A non-positive goal is rejected before anything is touched.
    pub async fn set_goal(&self, user: UserId, goal: i64, now: DateTime<Utc>) -> Result<Option<u32>, TrackerError> {
        let goal = u32::try_from(goal)
            .ok()
            .filter(|g| *g > 0)
            .ok_or(TrackerError::InvalidGoal(goal))?;

        let mut state = self.state.write().await;
        let previous = state.set_goal(user, goal, now);
        self.store.save(&state).await?;

        info!(user = %user, goal, ?previous, "Weekly goal set");
        Ok(previous)
    }

    /// Stop tracking a user. The workout log is kept.
    pub async fn opt_out(&self, user: UserId) -> Result<(), TrackerError> {
        let mut state = self.state.write().await;
        if !state.opt_out(user) {
            return Err(TrackerError::NotTracked(user));
        }
        self.store.save(&state).await?;

        info!(user = %user, "User opted out");
        Ok(())
    }

    /// Whether the user has a goal.
    pub async fn is_tracked(&self, user: UserId) -> bool {
        self.state.read().await.is_tracked(user)
    }

    /// Append a confirmed workout and return the all-time total.
    ///
    /// Fails with [`TrackerError::NotTracked`] if the user opted out since the
    /// picture was posted.
    pub async fn log_workout(&self, user: UserId, at: DateTime<Utc>) -> Result<usize, TrackerError> {
        let mut state = self.state.write().await;
        if !state.is_tracked(user) {
            return Err(TrackerError::NotTracked(user));
        }
        let total = state.record_workout(user, at);
        self.store.save(&state).await?;

        info!(user = %user, total, "Workout logged");
        Ok(total)
    }

    /// Standing of a tracked user, or `None` when untracked.
    pub async fn status(&self, user: UserId, now: DateTime<Utc>) -> Option<WorkoutStatus> {
        let state = self.state.read().await;
        let goal = state.goal(user)?;
        let history = state.history(user);
        Some(WorkoutStatus {
            goal,
            this_week: self.calculator.current_week_count(history, now),
            total: history.len(),
            streak: self.calculator.compute_streak(history, goal, now),
        })
    }

    /// All-time leaderboard of tracked users.
    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.state.read().await.leaderboard()
    }

    /// A copy of the current state.
    pub async fn snapshot(&self) -> WorkoutState {
        self.state.read().await.clone()
    }

    /// Apply `change` under the write lock and persist the result.
    pub async fn update<T, F>(&self, change: F) -> Result<T, TrackerError>
    where
        F: FnOnce(&mut WorkoutState) -> T + Send,
    {
        let mut state = self.state.write().await;
        let result = change(&mut state);
        self.store.save(&state).await?;
        Ok(result)
    }
}
