//! Leaderboards over stored daily scores.
//!
//! Totals come straight from [`DailyScoreRecord::total_score`]; nothing here
//! recomputes a score.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::record::DailyScoreRecord;
use crate::store::ScoreStore;

/// Group name for users without a membership.
pub const UNGROUPED: &str = "ungrouped";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStanding {
    pub rank: usize,
    pub user_id: String,
    pub group: Option<String>,
    pub total_score: i64,
    pub active_days: u32,
    pub best_streak: u32,
    pub milestones: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStanding {
    pub rank: usize,
    pub group: String,
    pub total_score: i64,
    pub members: u32,
}

#[derive(Debug, Default)]
struct UserTotals {
    total_score: i64,
    active_days: u32,
    best_streak: u32,
    milestones: Vec<String>,
}

/// Per-user and per-group totals for a set of score records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub users: Vec<UserStanding>,
    pub groups: Vec<GroupStanding>,
}

impl Leaderboard {
    /// Aggregate records. `memberships` maps user ids to group names.
    pub fn from_records(
        from: NaiveDate,
        to: NaiveDate,
        records: &[DailyScoreRecord],
        memberships: &HashMap<String, String>,
    ) -> Self {
        let mut per_user: BTreeMap<&str, UserTotals> = BTreeMap::new();
        for record in records {
            let totals = per_user.entry(record.user_id.as_str()).or_default();
            totals.total_score += record.total_score();
            totals.active_days += 1;
            totals.best_streak = totals.best_streak.max(record.streak_length);
            totals.milestones.extend(record.milestones.iter().cloned());
        }

        let mut users: Vec<UserStanding> = per_user
            .into_iter()
            .map(|(user_id, totals)| UserStanding {
                rank: 0,
                user_id: user_id.to_string(),
                group: memberships.get(user_id).cloned(),
                total_score: totals.total_score,
                active_days: totals.active_days,
                best_streak: totals.best_streak,
                milestones: totals.milestones,
            })
            .collect();
        users.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        assign_ranks(&mut users, |u| u.total_score, |u, rank| u.rank = rank);

        let mut per_group: BTreeMap<String, (i64, u32)> = BTreeMap::new();
        for user in &users {
            let group = user.group.clone().unwrap_or_else(|| UNGROUPED.to_string());
            let entry = per_group.entry(group).or_default();
            entry.0 += user.total_score;
            entry.1 += 1;
        }
        let mut groups: Vec<GroupStanding> = per_group
            .into_iter()
            .map(|(group, (total_score, members))| GroupStanding {
                rank: 0,
                group,
                total_score,
                members,
            })
            .collect();
        groups.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then_with(|| a.group.cmp(&b.group))
        });
        assign_ranks(&mut groups, |g| g.total_score, |g, rank| g.rank = rank);

        Self {
            from,
            to,
            users,
            groups,
        }
    }

    pub fn user_rankings(&self) -> &[UserStanding] {
        &self.users
    }

    pub fn group_rankings(&self) -> &[GroupStanding] {
        &self.groups
    }
}

/// Competition ranking: equal totals share a rank, the next rank skips.
fn assign_ranks<T>(items: &mut [T], total: impl Fn(&T) -> i64, mut set: impl FnMut(&mut T, usize)) {
    let mut previous: Option<i64> = None;
    let mut rank = 0;
    for (idx, item) in items.iter_mut().enumerate() {
        let value = total(item);
        if previous != Some(value) {
            rank = idx + 1;
            previous = Some(value);
        }
        set(item, rank);
    }
}

/// Build the leaderboard for `from..=to` from stored records.
///
/// # Errors
/// Returns [`ValidationError::InvalidDateRange`] if `from > to`, or any
/// store error.
pub fn leaderboard<S: ScoreStore>(store: &S, from: NaiveDate, to: NaiveDate) -> Result<Leaderboard> {
    if from > to {
        return Err(ValidationError::InvalidDateRange { from, to }.into());
    }
    let records = store.scores_between(from, to)?;
    let memberships = store.group_memberships()?;
    Ok(Leaderboard::from_records(from, to, &records, &memberships))
}
