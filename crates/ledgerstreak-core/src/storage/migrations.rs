//! Database schema migrations for ledgerstreak.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult, Transaction, TransactionBehavior};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 3;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// All steps run in one `IMMEDIATE` transaction, so connections opening the
/// same new file wait on the busy timeout and then see the settled version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    create_schema_version_table(&tx)?;

    let current_version = get_schema_version(&tx);

    if current_version < 1 {
        migrate_v1(&tx)?;
    }
    if current_version < 2 {
        migrate_v2(&tx)?;
    }
    if current_version < 3 {
        migrate_v3(&tx)?;
    }
    tx.commit()?;

    if current_version < SCHEMA_VERSION {
        tracing::debug!(
            from = current_version,
            to = SCHEMA_VERSION,
            "applied schema migrations"
        );
    }
    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: activity ledger and daily scores.
///
/// `daily_scores` is keyed on `(user_id, score_date)`; that key is what makes
/// the award upsert idempotent.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS activities (
            id            TEXT PRIMARY KEY,
            user_id       TEXT NOT NULL,
            activity_date TEXT NOT NULL,
            kind          TEXT NOT NULL,
            amount_cents  INTEGER,
            category      TEXT,
            created_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS daily_scores (
            user_id       TEXT NOT NULL,
            score_date    TEXT NOT NULL,
            base_score    INTEGER NOT NULL,
            streak_score  INTEGER NOT NULL,
            bonus_score   INTEGER NOT NULL,
            streak_length INTEGER NOT NULL,
            milestones    TEXT NOT NULL DEFAULT '[]',
            updated_at    TEXT NOT NULL,
            PRIMARY KEY (user_id, score_date)
        );",
    )?;

    set_schema_version(conn, 1)
}

/// Migration v2: group memberships for leaderboard aggregation.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS group_members (
            user_id    TEXT PRIMARY KEY,
            group_name TEXT NOT NULL
        );",
    )?;

    set_schema_version(conn, 2)
}

/// Migration v3: indexes for the award and report queries.
fn migrate_v3(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_activities_user_date ON activities(user_id, activity_date);
         CREATE INDEX IF NOT EXISTS idx_daily_scores_date ON daily_scores(score_date);
         CREATE INDEX IF NOT EXISTS idx_group_members_group ON group_members(group_name);",
    )?;

    set_schema_version(conn, 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn daily_scores_rejects_duplicate_key() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let insert = "INSERT INTO daily_scores
            (user_id, score_date, base_score, streak_score, bonus_score, streak_length, updated_at)
            VALUES ('u', '2025-01-01', 1, 1, 0, 1, '')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }
}
