//! SQLite-backed award recorder storage.
//!
//! Provides persistent storage for:
//! - The activity ledger
//! - Daily score rows, one per `(user_id, score_date)`
//! - Group memberships used by leaderboards
//!
//! Each [`SqliteScoreStore`] owns one connection. Open one store per thread;
//! writers on different connections are serialized by SQLite itself.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

use super::migrations;
use super::Config;
use crate::activity::{ActivityEvent, ActivityKind};
use crate::error::{CoreError, DatabaseError, Result};
use crate::record::DailyScoreRecord;
use crate::store::ScoreStore;

const DATE_FORMAT: &str = "%Y-%m-%d";

const SCORE_COLUMNS: &str = "user_id, score_date, base_score, streak_score, bonus_score,
     streak_length, milestones, updated_at";

const ACTIVITY_COLUMNS: &str =
    "id, user_id, activity_date, kind, amount_cents, category, created_at";

/// SQLite database for activities and daily scores.
pub struct SqliteScoreStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteScoreStore {
    /// File backing this store, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Open (and migrate) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(busy_timeout)?;
        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open the database named by the configuration.
    ///
    /// # Errors
    /// Returns an error if the path cannot be resolved or the database
    /// cannot be opened.
    pub fn open_with_config(config: &Config) -> Result<Self> {
        let path = config.database_path()?;
        Self::open(
            &path,
            Duration::from_millis(config.database.busy_timeout_ms),
        )
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn, path: None };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        migrations::migrate(&self.conn).map_err(|e| match DatabaseError::from(e) {
            DatabaseError::Locked => CoreError::from(DatabaseError::Locked),
            other => CoreError::from(DatabaseError::MigrationFailed(other.to_string())),
        })
    }

    fn lock_error(err: rusqlite::Error, user_id: &str, date: NaiveDate) -> CoreError {
        match DatabaseError::from(err) {
            DatabaseError::Locked => CoreError::Conflict {
                user_id: user_id.to_string(),
                date,
            },
            other => CoreError::Database(other),
        }
    }

    fn query_scores(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<DailyScoreRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, score_from_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn query_activities(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<ActivityEvent>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, activity_from_row)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }
}

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn date_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn score_from_row(row: &Row<'_>) -> rusqlite::Result<DailyScoreRecord> {
    let milestones: String = row.get(6)?;
    Ok(DailyScoreRecord {
        user_id: row.get(0)?,
        date: date_at(row, 1)?,
        base_score: row.get(2)?,
        streak_score: row.get(3)?,
        bonus_score: row.get(4)?,
        streak_length: row.get(5)?,
        milestones: serde_json::from_str(&milestones).map_err(|e| conversion_error(6, e))?,
        updated_at: timestamp_at(row, 7)?,
    })
}

fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<ActivityEvent> {
    let id: String = row.get(0)?;
    let kind: String = row.get(3)?;
    Ok(ActivityEvent {
        id: Uuid::parse_str(&id).map_err(|e| conversion_error(0, e))?,
        user_id: row.get(1)?,
        date: date_at(row, 2)?,
        kind: ActivityKind::parse(&kind).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(3, kind.clone(), rusqlite::types::Type::Text)
        })?,
        amount_cents: row.get(4)?,
        category: row.get(5)?,
        created_at: timestamp_at(row, 6)?,
    })
}

impl ScoreStore for SqliteScoreStore {
    fn record_activity(&self, event: &ActivityEvent) -> Result<()> {
        event.validate()?;
        self.conn.execute(
            "INSERT INTO activities (id, user_id, activity_date, kind, amount_cents, category, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.id.to_string(),
                event.user_id,
                event.date.format(DATE_FORMAT).to_string(),
                event.kind.as_str(),
                event.amount_cents,
                event.category,
                event.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn activities_on(&self, user_id: &str, date: NaiveDate) -> Result<Vec<ActivityEvent>> {
        self.query_activities(
            &format!(
                "SELECT {ACTIVITY_COLUMNS} FROM activities
                 WHERE user_id = ?1 AND activity_date = ?2
                 ORDER BY created_at"
            ),
            params![user_id, date.format(DATE_FORMAT).to_string()],
        )
    }

    fn activities_for_user(&self, user_id: &str) -> Result<Vec<ActivityEvent>> {
        self.query_activities(
            &format!(
                "SELECT {ACTIVITY_COLUMNS} FROM activities
                 WHERE user_id = ?1
                 ORDER BY activity_date, created_at"
            ),
            params![user_id],
        )
    }

    fn score_on(&self, user_id: &str, date: NaiveDate) -> Result<Option<DailyScoreRecord>> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT {SCORE_COLUMNS} FROM daily_scores
                     WHERE user_id = ?1 AND score_date = ?2"
                ),
                params![user_id, date.format(DATE_FORMAT).to_string()],
                score_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn latest_score_before(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyScoreRecord>> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT {SCORE_COLUMNS} FROM daily_scores
                     WHERE user_id = ?1 AND score_date < ?2
                     ORDER BY score_date DESC LIMIT 1"
                ),
                params![user_id, date.format(DATE_FORMAT).to_string()],
                score_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn latest_score(&self, user_id: &str) -> Result<Option<DailyScoreRecord>> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT {SCORE_COLUMNS} FROM daily_scores
                     WHERE user_id = ?1
                     ORDER BY score_date DESC LIMIT 1"
                ),
                params![user_id],
                score_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn upsert_score(&self, record: &DailyScoreRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO daily_scores
                (user_id, score_date, base_score, streak_score, bonus_score,
                 streak_length, milestones, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(user_id, score_date) DO UPDATE SET
                base_score = excluded.base_score,
                streak_score = excluded.streak_score,
                bonus_score = excluded.bonus_score,
                streak_length = excluded.streak_length,
                milestones = excluded.milestones,
                updated_at = excluded.updated_at",
            params![
                record.user_id,
                record.date.format(DATE_FORMAT).to_string(),
                record.base_score,
                record.streak_score,
                record.bonus_score,
                record.streak_length,
                serde_json::to_string(&record.milestones)?,
                record.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn scores_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyScoreRecord>> {
        self.query_scores(
            &format!(
                "SELECT {SCORE_COLUMNS} FROM daily_scores
                 WHERE score_date >= ?1 AND score_date <= ?2
                 ORDER BY score_date, user_id"
            ),
            params![
                from.format(DATE_FORMAT).to_string(),
                to.format(DATE_FORMAT).to_string()
            ],
        )
    }

    fn set_group(&self, user_id: &str, group: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO group_members (user_id, group_name) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET group_name = excluded.group_name",
            params![user_id, group],
        )?;
        Ok(())
    }

    fn group_memberships(&self) -> Result<HashMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id, group_name FROM group_members")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        let mut groups = HashMap::new();
        for row in rows {
            let (user, group) = row?;
            groups.insert(user, group);
        }
        Ok(groups)
    }

    /// Runs `f` inside a `BEGIN IMMEDIATE` transaction.
    ///
    /// The write lock is taken before `f` reads anything, so a second writer
    /// waits up to the busy timeout and then sees the committed row.
    fn with_award_lock<T, F>(&self, user_id: &str, date: NaiveDate, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(|e| Self::lock_error(e, user_id, date))?;
        // Dropping `tx` on error rolls back.
        let value = f(self)?;
        tx.commit()
            .map_err(|e| Self::lock_error(e, user_id, date))?;
        Ok(value)
    }
}
