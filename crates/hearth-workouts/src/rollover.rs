//! The weekly cycle: reminders before the boundary, evaluation at it.
//!
//! A cycle moves through [`RolloverPhase::Idle`], [`RolloverPhase::Warning`],
//! [`RolloverPhase::Settling`] and [`RolloverPhase::Rollover`]. The timing is
//! driven by the bot's scheduler; this module decides what each phase does.
//! Chat failures are logged and skipped; only a failed save is reported back
//! to the caller.

use chrono::{DateTime, Duration, Utc};
use hearth_common::{ChannelId, UserId};
use hearth_config::WorkoutsConfig;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::calendar::WeekCalendar;
use crate::messages;
use crate::notifier::Notifier;
use crate::roast::RoastWriter;
use crate::state::PendingAcknowledgment;
use crate::tracker::{TrackerError, WorkoutTracker};

/// Where a weekly cycle currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverPhase {
    /// Before the warning threshold.
    Idle,
    /// Reminders are due.
    Warning,
    /// Reminders are out; waiting for the boundary.
    Settling,
    /// The boundary has passed; the week is evaluated.
    Rollover,
}

/// The two instants of one weekly cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CyclePlan {
    /// When reminders go out.
    pub warning_at: DateTime<Utc>,
    /// The Monday 00:00 that ends the week.
    pub boundary: DateTime<Utc>,
}

impl CyclePlan {
    /// The cycle whose boundary is the first one after `now`.
    pub fn upcoming(calendar: &WeekCalendar, warning: Duration, now: DateTime<Utc>) -> Self {
        let boundary = calendar.next_boundary(now);
        Self {
            warning_at: boundary - warning,
            boundary,
        }
    }

    /// The phase a fresh cycle starts in at `now`.
    pub fn phase_at(&self, now: DateTime<Utc>) -> RolloverPhase {
        if now >= self.boundary {
            RolloverPhase::Rollover
        } else if now >= self.warning_at {
            RolloverPhase::Warning
        } else {
            RolloverPhase::Idle
        }
    }
}

/// Settings for the weekly cycle.
#[derive(Debug, Clone)]
pub struct RolloverSettings {
    /// Channel for announcements and escalations.
    pub announcement_channel: ChannelId,
    /// How long before the boundary reminders are sent.
    pub warning: Duration,
    /// Consecutive misses that trigger an escalation.
    pub miss_threshold: u32,
    /// Reaction that acknowledges an escalation.
    pub acknowledgment_emoji: String,
    /// Days an escalation may stay unanswered.
    pub acknowledgment_window_days: u32,
}

impl RolloverSettings {
    /// Settings from the `workouts` config section.
    pub fn from_config(config: &WorkoutsConfig) -> Self {
        Self {
            announcement_channel: config.announcement_channel_id,
            warning: Duration::hours(i64::from(config.warning_hours)),
            miss_threshold: config.miss_threshold,
            acknowledgment_emoji: config.acknowledgment_emoji.clone(),
            acknowledgment_window_days: config.acknowledgment_window_days,
        }
    }
}

/// What a rollover did, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolloverReport {
    /// Users who met their goal, with their streak.
    pub met: Vec<(UserId, u32)>,
    /// Users who missed their goal.
    pub missed: Vec<UserId>,
    /// Pending acknowledgments that were answered.
    pub acknowledged: Vec<UserId>,
    /// Users removed because their acknowledgment expired.
    pub removed: Vec<UserId>,
    /// Users who got a regular admonishment.
    pub admonished: Vec<UserId>,
    /// Users who got an escalation with a new pending acknowledgment.
    pub escalated: Vec<UserId>,
}

enum Resolution {
    Acknowledged(UserId),
    Expired(UserId),
    Escalated(UserId, PendingAcknowledgment),
}

/// Runs the phases of the weekly cycle against the tracker.
pub struct WeeklyRollover {
    tracker: Arc<WorkoutTracker>,
    notifier: Arc<dyn Notifier>,
    roaster: Arc<dyn RoastWriter>,
    settings: RolloverSettings,
}

impl WeeklyRollover {
    /// Create the rollover runner.
    pub fn new(
        tracker: Arc<WorkoutTracker>,
        notifier: Arc<dyn Notifier>,
        roaster: Arc<dyn RoastWriter>,
        settings: RolloverSettings,
    ) -> Self {
        Self {
            tracker,
            notifier,
            roaster,
            settings,
        }
    }

    /// The next cycle as seen from `now`.
    pub fn plan(&self, now: DateTime<Utc>) -> CyclePlan {
        CyclePlan::upcoming(self.tracker.calculator().calendar(), self.settings.warning, now)
    }

    /// Warning phase: DM every tracked user still below their goal this week.
    ///
    /// Returns the number of reminders delivered.
    pub async fn send_reminders(&self, now: DateTime<Utc>) -> usize {
        let state = self.tracker.snapshot().await;
        let calculator = self.tracker.calculator();

        let mut delivered = 0;
        for (user, goal) in state.goals() {
            let logged = calculator.current_week_count(state.history(user), now);
            if logged >= goal as usize {
                continue;
            }
            match self
                .notifier
                .direct_message(user, &messages::reminder(goal, logged))
                .await
            {
                Ok(()) => delivered += 1,
                Err(e) => warn!(user = %user, error = %e, "Could not deliver workout reminder"),
            }
        }

        info!(delivered, "Sent weekly workout reminders");
        delivered
    }

    /// Rollover phase for the week that ends at `boundary`.
    pub async fn run(&self, boundary: DateTime<Utc>, now: DateTime<Utc>) -> Result<RolloverReport, TrackerError> {
        let state = self.tracker.snapshot().await;
        let calculator = self.tracker.calculator();
        let calendar = calculator.calendar();
        let ended = calendar.previous(calendar.week_containing(boundary));
        let channel = self.settings.announcement_channel;
        let mut report = RolloverReport::default();

        info!(week_start = %ended.start, week_end = %ended.end, "Running weekly rollover");

        // 1. Partition on the week that just ended.
        let mut missed = Vec::new();
        for (user, goal) in state.goals() {
            if state.tracked_since(user).is_some_and(|since| since >= ended.end) {
                continue;
            }
            let history = state.history(user);
            let logged = ended.count(history);
            if logged >= goal as usize {
                report.met.push((user, calculator.compute_streak(history, goal, boundary)));
            } else {
                report.missed.push(user);
                missed.push((user, goal, logged));
            }
        }

        // 2. One batched announcement.
        if !report.met.is_empty() || !missed.is_empty() {
            if let Err(e) = self.notifier.post(channel, &messages::met_announcement(&report.met)).await {
                warn!(error = %e, "Could not post weekly announcement");
            }
        }

        // 3. Resolve outstanding acknowledgments.
        let mut resolutions = Vec::new();
        let mut still_pending = BTreeSet::new();
        for (user, pending) in state.pending_acknowledgments() {
            let reacted = self
                .notifier
                .has_reacted(channel, pending.message_id, user, &self.settings.acknowledgment_emoji)
                .await;
            match reacted {
                Ok(true) => {
                    self.post_best_effort(channel, &messages::acknowledged(user)).await;
                    report.acknowledged.push(user);
                    resolutions.push(Resolution::Acknowledged(user));
                }
                Ok(false) if now >= self.acknowledgment_deadline(calendar, pending) => {
                    self.post_best_effort(channel, &messages::removed(user)).await;
                    report.removed.push(user);
                    resolutions.push(Resolution::Expired(user));
                }
                Ok(false) => {
                    debug!(user = %user, "Acknowledgment still pending");
                    still_pending.insert(user);
                }
                Err(e) => {
                    warn!(user = %user, error = %e, "Could not check acknowledgment reaction");
                    still_pending.insert(user);
                }
            }
        }

        // 4. Admonish or escalate the users who missed.
        for (user, goal, logged) in missed {
            if still_pending.contains(&user) || report.removed.contains(&user) {
                continue;
            }
            let misses = calculator.compute_consecutive_misses(
                state.history(user),
                goal,
                state.tracked_since(user),
                boundary,
            );

            if misses < self.settings.miss_threshold {
                let roast = self.roaster.roast(misses).await;
                self.post_best_effort(channel, &messages::missed(user, goal, logged, &roast))
                    .await;
                report.admonished.push(user);
                continue;
            }

            let escalation = messages::escalation(
                user,
                misses,
                &self.settings.acknowledgment_emoji,
                self.settings.acknowledgment_window_days,
            );
            match self.notifier.post(channel, &escalation).await {
                Ok(message_id) => {
                    report.escalated.push(user);
                    resolutions.push(Resolution::Escalated(
                        user,
                        PendingAcknowledgment {
                            message_id,
                            created_at: boundary,
                        },
                    ));
                }
                Err(e) => warn!(user = %user, error = %e, "Could not post escalation"),
            }
        }

        // 5. Apply and persist.
        self.tracker
            .update(move |state| {
                for resolution in resolutions {
                    match resolution {
                        Resolution::Acknowledged(user) => {
                            state.clear_pending(user);
                        }
                        Resolution::Expired(user) => {
                            state.opt_out(user);
                        }
                        Resolution::Escalated(user, pending) => {
                            if state.is_tracked(user) {
                                state.set_pending(user, pending);
                            }
                        }
                    }
                }
            })
            .await?;

        info!(
            met = report.met.len(),
            missed = report.missed.len(),
            acknowledged = report.acknowledged.len(),
            removed = report.removed.len(),
            escalated = report.escalated.len(),
            "Weekly rollover complete"
        );
        Ok(report)
    }

    fn acknowledgment_deadline(&self, calendar: &WeekCalendar, pending: PendingAcknowledgment) -> DateTime<Utc> {
        calendar.add_local_days(pending.created_at, self.settings.acknowledgment_window_days)
    }

    async fn post_best_effort(&self, channel: ChannelId, content: &str) {
        if let Err(e) = self.notifier.post(channel, content).await {
            warn!(channel = %channel, error = %e, "Could not post rollover message");
        }
    }
}
