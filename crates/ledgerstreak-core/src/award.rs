//! Idempotent award recorder.
//!
//! [`Awarder`] turns a user-day into at most one [`DailyScoreRecord`]:
//! it reads the prior streak, checks for qualifying activity, runs the
//! calculator and upserts the result, all inside the store's award lock.
//! Re-awarding a day recomputes the same row; it never adds a second one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::activity::{has_qualifying_activity, ActivityEvent};
use crate::error::{CoreError, Result, ValidationError};
use crate::milestone::MilestoneCatalog;
use crate::record::DailyScoreRecord;
use crate::scoring::{self, DailyScore};
use crate::storage::ScoringConfig;
use crate::store::ScoreStore;

/// How a day without qualifying activity affects the next day's streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissedDayPolicy {
    /// The streak pauses; the next active day continues from the last one
    #[default]
    Freeze,
    /// Only yesterday's score carries a streak forward
    Reset,
}

/// Result of awarding one user-day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AwardOutcome {
    pub user_id: String,
    pub date: NaiveDate,
    pub prior_streak: u32,
    pub score: DailyScore,
    /// The row written; `None` when the day had no qualifying activity
    pub record: Option<DailyScoreRecord>,
}

impl AwardOutcome {
    pub fn total(&self) -> i64 {
        self.score.total()
    }
}

/// Computes and records daily scores against a [`ScoreStore`].
pub struct Awarder<'a, S: ScoreStore> {
    store: &'a S,
    catalog: &'a MilestoneCatalog,
    policy: MissedDayPolicy,
    max_attempts: u32,
}

impl<'a, S: ScoreStore> Awarder<'a, S> {
    pub fn new(store: &'a S, catalog: &'a MilestoneCatalog) -> Self {
        Self {
            store,
            catalog,
            policy: MissedDayPolicy::default(),
            max_attempts: 3,
        }
    }

    pub fn from_config(store: &'a S, catalog: &'a MilestoneCatalog, config: &ScoringConfig) -> Self {
        Self::new(store, catalog)
            .with_policy(config.missed_day_policy)
            .with_max_attempts(config.max_award_attempts)
    }

    pub fn with_policy(mut self, policy: MissedDayPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Attempts per award when the store reports a conflict; at least one.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn policy(&self) -> MissedDayPolicy {
        self.policy
    }

    /// Streak entering `date`, according to the missed-day policy.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn prior_streak(&self, user_id: &str, date: NaiveDate) -> Result<u32> {
        self.prior_streak_in(self.store, user_id, date)
    }

    fn prior_streak_in(&self, store: &S, user_id: &str, date: NaiveDate) -> Result<u32> {
        let previous = match self.policy {
            MissedDayPolicy::Freeze => store.latest_score_before(user_id, date)?,
            MissedDayPolicy::Reset => match date.pred_opt() {
                Some(yesterday) => store.score_on(user_id, yesterday)?,
                None => None,
            },
        };
        Ok(previous.map_or(0, |record| record.streak_length))
    }

    /// Award `date` for `user_id`.
    ///
    /// Conflicts with a concurrent writer are retried up to the configured
    /// attempt budget; each retry re-reads the settled prior streak.
    ///
    /// # Errors
    /// Returns [`ValidationError::OutOfOrderAward`] if a later day is already
    /// awarded, [`CoreError::Conflict`] once retries are exhausted, or any
    /// store error.
    pub fn award(&self, user_id: &str, date: NaiveDate) -> Result<AwardOutcome> {
        let mut attempt = 1;
        loop {
            match self.try_award(user_id, date) {
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    tracing::warn!(
                        user_id,
                        %date,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "award conflict, retrying"
                    );
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn try_award(&self, user_id: &str, date: NaiveDate) -> Result<AwardOutcome> {
        self.store.with_award_lock(user_id, date, |store| {
            if let Some(latest) = store.latest_score(user_id)? {
                if latest.date > date {
                    return Err(ValidationError::OutOfOrderAward {
                        user_id: user_id.to_string(),
                        date,
                        latest: latest.date,
                    }
                    .into());
                }
            }

            let prior_streak = self.prior_streak_in(store, user_id, date)?;
            let events = store.activities_on(user_id, date)?;
            let has_activity = has_qualifying_activity(&events, user_id, date);
            let score = scoring::calculate(i64::from(prior_streak), has_activity, self.catalog)?;

            let record = if score.is_scored() {
                let record = DailyScoreRecord::from_score(user_id, date, &score);
                store.upsert_score(&record)?;
                tracing::info!(
                    user_id,
                    %date,
                    streak = score.new_streak,
                    total = score.total(),
                    "awarded daily score"
                );
                for name in &score.achieved {
                    tracing::info!(user_id, %date, milestone = %name, "milestone reached");
                }
                Some(record)
            } else {
                tracing::debug!(user_id, %date, prior_streak, "no qualifying activity, nothing awarded");
                None
            };

            Ok(AwardOutcome {
                user_id: user_id.to_string(),
                date,
                prior_streak,
                score,
                record,
            })
        })
    }

    /// Store a new activity and award its day.
    ///
    /// Backfilled activity for a day older than the latest award is kept in
    /// the ledger but not scored; the result is then `None`.
    ///
    /// # Errors
    /// Returns an error if the activity is invalid or the store fails.
    pub fn record_and_award(&self, event: &ActivityEvent) -> Result<Option<AwardOutcome>> {
        self.store.record_activity(event)?;
        match self.award(&event.user_id, event.date) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(CoreError::Validation(ValidationError::OutOfOrderAward { latest, .. })) => {
                tracing::warn!(
                    user_id = %event.user_id,
                    date = %event.date,
                    %latest,
                    "activity recorded for an already-closed day, award skipped"
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
