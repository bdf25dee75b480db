//! Award recorder storage contract.
//!
//! [`ScoreStore`] is everything the award pathway needs from persistence:
//! the activity ledger, the per-day score table keyed on `(user, date)`,
//! group memberships for reports, and an exclusive per-key award scope.
//! [`crate::storage::SqliteScoreStore`] is the durable implementation;
//! [`MemoryScoreStore`] is the in-process one used by tests and dry runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;

use crate::activity::ActivityEvent;
use crate::error::Result;
use crate::record::DailyScoreRecord;

/// Persistence required by the award recorder and report generator.
pub trait ScoreStore {
    /// Append an activity to the ledger.
    fn record_activity(&self, event: &ActivityEvent) -> Result<()>;

    /// All of a user's activities on `date`, oldest first.
    fn activities_on(&self, user_id: &str, date: NaiveDate) -> Result<Vec<ActivityEvent>>;

    /// All of a user's activities, oldest first.
    fn activities_for_user(&self, user_id: &str) -> Result<Vec<ActivityEvent>>;

    fn score_on(&self, user_id: &str, date: NaiveDate) -> Result<Option<DailyScoreRecord>>;

    /// The most recent score strictly before `date`.
    fn latest_score_before(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyScoreRecord>>;

    /// The most recent score on any date.
    fn latest_score(&self, user_id: &str) -> Result<Option<DailyScoreRecord>>;

    /// Insert or replace the row for `(record.user_id, record.date)`.
    fn upsert_score(&self, record: &DailyScoreRecord) -> Result<()>;

    /// Scores with `from <= date <= to`, ordered by date then user.
    fn scores_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyScoreRecord>>;

    fn set_group(&self, user_id: &str, group: &str) -> Result<()>;

    /// `user_id -> group` for every user with a group.
    fn group_memberships(&self) -> Result<HashMap<String, String>>;

    /// Run `f` as the only writer for `(user_id, date)`.
    ///
    /// Everything `f` reads and writes through the store is committed
    /// together. A concurrent caller for the same key either waits or gets
    /// a retryable [`crate::CoreError::Conflict`].
    fn with_award_lock<T, F>(&self, user_id: &str, date: NaiveDate, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>;
}

#[derive(Debug, Default)]
struct MemoryState {
    activities: Vec<ActivityEvent>,
    scores: BTreeMap<(String, NaiveDate), DailyScoreRecord>,
    groups: HashMap<String, String>,
}

/// Thread-safe in-memory store.
///
/// Award locks are held per user, which also serializes adjacent days whose
/// prior streak depends on each other.
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    state: Mutex<MemoryState>,
    award_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn award_lock_for(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .award_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(user_id.to_string()).or_default())
    }

    fn release_award_lock(&self, user_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self
            .award_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Only the map and this caller hold it: nobody is waiting.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(user_id);
        }
    }
}

impl ScoreStore for MemoryScoreStore {
    fn record_activity(&self, event: &ActivityEvent) -> Result<()> {
        event.validate()?;
        self.state().activities.push(event.clone());
        Ok(())
    }

    fn activities_on(&self, user_id: &str, date: NaiveDate) -> Result<Vec<ActivityEvent>> {
        Ok(self
            .state()
            .activities
            .iter()
            .filter(|e| e.user_id == user_id && e.date == date)
            .cloned()
            .collect())
    }

    fn activities_for_user(&self, user_id: &str) -> Result<Vec<ActivityEvent>> {
        let mut events: Vec<_> = self
            .state()
            .activities
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.date, e.created_at));
        Ok(events)
    }

    fn score_on(&self, user_id: &str, date: NaiveDate) -> Result<Option<DailyScoreRecord>> {
        Ok(self
            .state()
            .scores
            .get(&(user_id.to_string(), date))
            .cloned())
    }

    fn latest_score_before(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyScoreRecord>> {
        let key = user_id.to_string();
        Ok(self
            .state()
            .scores
            .range((key.clone(), NaiveDate::MIN)..(key, date))
            .next_back()
            .map(|(_, record)| record.clone()))
    }

    fn latest_score(&self, user_id: &str) -> Result<Option<DailyScoreRecord>> {
        let key = user_id.to_string();
        Ok(self
            .state()
            .scores
            .range((key.clone(), NaiveDate::MIN)..=(key, NaiveDate::MAX))
            .next_back()
            .map(|(_, record)| record.clone()))
    }

    fn upsert_score(&self, record: &DailyScoreRecord) -> Result<()> {
        self.state()
            .scores
            .insert((record.user_id.clone(), record.date), record.clone());
        Ok(())
    }

    fn scores_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyScoreRecord>> {
        let mut records: Vec<_> = self
            .state()
            .scores
            .values()
            .filter(|r| r.date >= from && r.date <= to)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.user_id.cmp(&b.user_id)));
        Ok(records)
    }

    fn set_group(&self, user_id: &str, group: &str) -> Result<()> {
        self.state()
            .groups
            .insert(user_id.to_string(), group.to_string());
        Ok(())
    }

    fn group_memberships(&self) -> Result<HashMap<String, String>> {
        Ok(self.state().groups.clone())
    }

    fn with_award_lock<T, F>(&self, user_id: &str, _date: NaiveDate, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        let lock = self.award_lock_for(user_id);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f(self)
        };
        self.release_award_lock(user_id, lock);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityKind;
    use crate::scoring::DailyScore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    fn record(user: &str, date: NaiveDate, streak: u32) -> DailyScoreRecord {
        let score = DailyScore {
            base_score: 1,
            streak_score: 1,
            bonus_score: 0,
            new_streak: streak,
            achieved: Vec::new(),
        };
        DailyScoreRecord::from_score(user, date, &score)
    }

    #[test]
    fn upsert_replaces_existing_row() {
        let store = MemoryScoreStore::new();
        store.upsert_score(&record("dan", day(1), 1)).unwrap();
        store.upsert_score(&record("dan", day(1), 4)).unwrap();

        let rows = store.scores_between(day(1), day(1)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].streak_length, 4);
    }

    #[test]
    fn latest_score_before_is_strict_and_per_user() {
        let store = MemoryScoreStore::new();
        store.upsert_score(&record("dan", day(1), 1)).unwrap();
        store.upsert_score(&record("dan", day(3), 2)).unwrap();
        store.upsert_score(&record("eve", day(4), 9)).unwrap();

        assert_eq!(
            store.latest_score_before("dan", day(3)).unwrap().unwrap().date,
            day(1)
        );
        assert_eq!(
            store.latest_score_before("dan", day(5)).unwrap().unwrap().date,
            day(3)
        );
        assert!(store.latest_score_before("dan", day(1)).unwrap().is_none());
        assert_eq!(store.latest_score("dan").unwrap().unwrap().date, day(3));
    }

    #[test]
    fn activities_are_filtered_by_user_and_day() {
        let store = MemoryScoreStore::new();
        let a = ActivityEvent::transaction("dan", day(1), ActivityKind::Expense, 300, None).unwrap();
        let b = ActivityEvent::check_in("dan", day(2)).unwrap();
        store.record_activity(&a).unwrap();
        store.record_activity(&b).unwrap();

        assert_eq!(store.activities_on("dan", day(1)).unwrap(), vec![a]);
        assert_eq!(store.activities_for_user("dan").unwrap().len(), 2);
        assert!(store.activities_on("eve", day(1)).unwrap().is_empty());
    }

    #[test]
    fn award_lock_entries_are_released() {
        let store = MemoryScoreStore::new();
        let value = store
            .with_award_lock("dan", day(1), |s| {
                s.upsert_score(&record("dan", day(1), 1))?;
                Ok(42)
            })
            .unwrap();
        assert_eq!(value, 42);
        assert!(store.award_locks.lock().unwrap().is_empty());
    }
}
