//! Persisted per-user, per-day score rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::DailyScore;

/// The one-per-user-per-day outcome of an award.
///
/// Stores must key these on `(user_id, date)`; a second write for the same
/// pair replaces the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyScoreRecord {
    pub user_id: String,
    pub date: NaiveDate,
    pub base_score: i64,
    pub streak_score: i64,
    pub bonus_score: i64,
    /// Streak length as of `date`
    pub streak_length: u32,
    pub milestones: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl DailyScoreRecord {
    pub fn from_score(user_id: impl Into<String>, date: NaiveDate, score: &DailyScore) -> Self {
        Self {
            user_id: user_id.into(),
            date,
            base_score: score.base_score,
            streak_score: score.streak_score,
            bonus_score: score.bonus_score,
            streak_length: score.new_streak,
            milestones: score.achieved.clone(),
            updated_at: Utc::now(),
        }
    }

    pub fn total_score(&self) -> i64 {
        self.base_score + self.streak_score + self.bonus_score
    }

    /// Equal scoring content, ignoring the write timestamp.
    pub fn same_outcome(&self, other: &Self) -> bool {
        self.user_id == other.user_id
            && self.date == other.date
            && self.base_score == other.base_score
            && self.streak_score == other.streak_score
            && self.bonus_score == other.bonus_score
            && self.streak_length == other.streak_length
            && self.milestones == other.milestones
    }
}
