//! Streak and consecutive-miss calculation.
//!
//! Both walks start at the week immediately before the week containing `now`
//! and move backward one calendar week at a time. They are pure functions of
//! the history, the goal and `now`.

use chrono::{DateTime, Utc};

use crate::calendar::WeekCalendar;

/// Tunables for the streak and miss walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakRules {
    /// Whether a met in-progress week adds one to the streak.
    pub include_current_week: bool,
    /// Upper bound on the weeks scanned by the miss walk.
    pub max_lookback_weeks: u32,
}

impl Default for StreakRules {
    fn default() -> Self {
        Self {
            include_current_week: true,
            max_lookback_weeks: 52,
        }
    }
}

/// Computes streaks and misses over a sorted workout history.
#[derive(Debug, Clone, Copy)]
pub struct StreakCalculator {
    calendar: WeekCalendar,
    rules: StreakRules,
}

impl StreakCalculator {
    /// Create a calculator.
    pub const fn new(calendar: WeekCalendar, rules: StreakRules) -> Self {
        Self { calendar, rules }
    }

    /// The calendar weeks are computed with.
    pub const fn calendar(&self) -> &WeekCalendar {
        &self.calendar
    }

    /// Workouts logged in the week containing `now`.
    pub fn current_week_count(&self, history: &[DateTime<Utc>], now: DateTime<Utc>) -> usize {
        self.calendar.week_containing(now).count(history)
    }

    /// Consecutive weeks, counting backward, in which the goal was met.
    ///
    /// The in-progress week never breaks the streak. It adds one only when it
    /// is already met, the completed week before it was met too, and
    /// [`StreakRules::include_current_week`] is set.
    pub fn compute_streak(&self, history: &[DateTime<Utc>], goal: u32, now: DateTime<Utc>) -> u32 {
        if goal == 0 {
            return 0;
        }
        let goal = goal as usize;
        let current = self.calendar.week_containing(now);

        let mut completed = 0;
        let mut week = self.calendar.previous(current);
        while week.count(history) >= goal {
            completed += 1;
            week = self.calendar.previous(week);
        }

        let current_met = self.rules.include_current_week && current.count(history) >= goal;
        if completed > 0 && current_met {
            completed + 1
        } else {
            completed
        }
    }

    /// Consecutive completed weeks, counting backward, in which the goal was
    /// missed.
    ///
    /// Weeks that ended at or before `tracked_since` are not counted, and the
    /// walk never looks further back than [`StreakRules::max_lookback_weeks`].
    pub fn compute_consecutive_misses(
        &self,
        history: &[DateTime<Utc>],
        goal: u32,
        tracked_since: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> u32 {
        if goal == 0 {
            return 0;
        }
        let goal = goal as usize;

        let mut misses = 0;
        let mut week = self.calendar.previous(self.calendar.week_containing(now));
        while misses < self.rules.max_lookback_weeks {
            if tracked_since.is_some_and(|since| week.end <= since) || week.count(history) >= goal {
                break;
            }
            misses += 1;
            week = self.calendar.previous(week);
        }
        misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use hearth_common::test_utils::mock_timestamp;
    use proptest::prelude::*;

    fn calculator(include_current_week: bool) -> StreakCalculator {
        StreakCalculator::new(
            WeekCalendar::new(chrono_tz::UTC),
            StreakRules {
                include_current_week,
                max_lookback_weeks: 52,
            },
        )
    }

    // Thursday; the current week started Monday 2024-03-11.
    fn now() -> DateTime<Utc> {
        mock_timestamp(2024, 3, 14, 12, 0, 0)
    }

    fn week_start(weeks_back: i64) -> DateTime<Utc> {
        mock_timestamp(2024, 3, 11, 0, 0, 0) - Duration::weeks(weeks_back)
    }

    fn workouts_in_week(weeks_back: i64, count: usize) -> Vec<DateTime<Utc>> {
        (0..count)
            .map(|i| week_start(weeks_back) + Duration::hours(10 + i as i64))
            .collect()
    }

    #[test]
    fn test_zero_goal_is_zero() {
        let history = workouts_in_week(1, 3);
        let calc = calculator(true);
        assert_eq!(calc.compute_streak(&history, 0, now()), 0);
        assert_eq!(calc.compute_consecutive_misses(&history, 0, None, now()), 0);
    }

    #[test]
    fn test_streak_counts_completed_weeks() {
        let mut history = workouts_in_week(3, 2);
        history.extend(workouts_in_week(2, 2));
        history.extend(workouts_in_week(1, 2));

        assert_eq!(calculator(false).compute_streak(&history, 2, now()), 3);
        assert_eq!(calculator(false).compute_streak(&history, 3, now()), 0);
    }

    #[test]
    fn test_streak_stops_at_first_gap() {
        let mut history = workouts_in_week(4, 2);
        history.extend(workouts_in_week(2, 2));
        history.extend(workouts_in_week(1, 2));
        assert_eq!(calculator(false).compute_streak(&history, 2, now()), 2);
    }

    #[test]
    fn test_in_progress_week_never_breaks_streak() {
        let history = workouts_in_week(1, 3);
        assert_eq!(calculator(true).compute_streak(&history, 3, now()), 1);
        assert_eq!(calculator(false).compute_streak(&history, 3, now()), 1);
    }

    #[test]
    fn test_met_current_week_adds_one_when_included() {
        let mut history = workouts_in_week(1, 3);
        history.extend(workouts_in_week(0, 3));
        assert_eq!(calculator(true).compute_streak(&history, 3, now()), 2);
        assert_eq!(calculator(false).compute_streak(&history, 3, now()), 1);
    }

    #[test]
    fn test_current_week_alone_is_no_streak() {
        // Three workouts Monday to Wednesday of this week, nothing before.
        let history: Vec<_> = (0..3)
            .map(|day| week_start(0) + Duration::days(day) + Duration::hours(7))
            .collect();
        assert_eq!(calculator(true).compute_streak(&history, 3, now()), 0);
        assert_eq!(calculator(false).compute_streak(&history, 3, now()), 0);
    }

    #[test]
    fn test_current_week_after_a_missed_week_is_no_streak() {
        let mut history = workouts_in_week(2, 3);
        history.extend(workouts_in_week(0, 3));
        assert_eq!(calculator(true).compute_streak(&history, 3, now()), 0);
    }

    #[test]
    fn test_workout_at_week_start_counts_for_that_week() {
        let calc = calculator(false);
        let at_boundary = vec![week_start(1)];
        assert_eq!(calc.compute_streak(&at_boundary, 1, now()), 1);

        let just_before = vec![week_start(1) - Duration::nanoseconds(1)];
        assert_eq!(calc.compute_streak(&just_before, 1, now()), 0);
        assert_eq!(calc.compute_consecutive_misses(&just_before, 1, None, now()), 1);
    }

    #[test]
    fn test_misses_stop_at_met_week() {
        let history = workouts_in_week(3, 1);
        let calc = calculator(true);
        assert_eq!(calc.compute_consecutive_misses(&history, 1, None, now()), 2);
    }

    #[test]
    fn test_misses_ignore_in_progress_week() {
        let calc = calculator(true);
        let history = workouts_in_week(1, 1);
        assert_eq!(calc.compute_consecutive_misses(&history, 1, None, now()), 0);
        assert_eq!(calc.compute_consecutive_misses(&[], 1, None, week_start(0)), 52);
    }

    #[test]
    fn test_misses_respect_tracked_since() {
        let calc = calculator(true);
        // Opted in during the week that started two weeks ago.
        let since = week_start(2) + Duration::days(2);
        assert_eq!(calc.compute_consecutive_misses(&[], 3, Some(since), now()), 2);

        // Opted in exactly at the last boundary: no completed week yet.
        assert_eq!(calc.compute_consecutive_misses(&[], 3, Some(week_start(0)), now()), 0);
    }

    #[test]
    fn test_misses_bounded_by_lookback() {
        let calc = StreakCalculator::new(
            WeekCalendar::new(chrono_tz::UTC),
            StreakRules {
                include_current_week: true,
                max_lookback_weeks: 4,
            },
        );
        assert_eq!(calc.compute_consecutive_misses(&[], 1, None, now()), 4);
    }

    fn history_strategy() -> impl Strategy<Value = Vec<DateTime<Utc>>> {
        prop::collection::vec(0i64..(12 * 7 * 24 * 3600), 0..60).prop_map(|offsets| {
            let mut history: Vec<_> = offsets.into_iter().map(|s| now() - Duration::seconds(s)).collect();
            history.sort();
            history
        })
    }

    proptest! {
        #[test]
        fn prop_raising_a_week_to_goal_never_hurts(
            history in history_strategy(),
            goal in 1u32..5,
            weeks_back in 1i64..10,
        ) {
            let calc = calculator(true);
            let streak_before = calc.compute_streak(&history, goal, now());
            let misses_before = calc.compute_consecutive_misses(&history, goal, None, now());

            let mut raised = history.clone();
            raised.extend(workouts_in_week(weeks_back, goal as usize));
            raised.sort();

            prop_assert!(calc.compute_streak(&raised, goal, now()) >= streak_before);
            prop_assert!(calc.compute_consecutive_misses(&raised, goal, None, now()) <= misses_before);
        }

        #[test]
        fn prop_completed_streak_and_misses_are_exclusive(
            history in history_strategy(),
            goal in 1u32..5,
        ) {
            let calc = calculator(false);
            let streak = calc.compute_streak(&history, goal, now());
            let misses = calc.compute_consecutive_misses(&history, goal, None, now());
            prop_assert!(streak == 0 || misses == 0);
            prop_assert!(streak > 0 || misses > 0);
            prop_assert!(misses <= 52);
        }
    }
}
