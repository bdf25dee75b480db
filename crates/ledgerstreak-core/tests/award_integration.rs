//! Integration tests for the award pathway.
//!
//! Covers the full workflow from recording activity through awarding and
//! leaderboard generation, against a file-backed database and a catalog
//! loaded from disk.

use std::time::Duration;

use chrono::NaiveDate;
use ledgerstreak_core::{
    leaderboard, ActivityEvent, ActivityKind, Awarder, Config, MilestoneCatalog, MissedDayPolicy,
    ScoreStore, SqliteScoreStore,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
}

#[test]
fn test_week_of_activity_with_catalog_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("milestones.toml");
    std::fs::write(
        &catalog_path,
        r#"
        [[milestone]]
        name = "坚持三天"
        threshold_days = 3
        bonus = 2

        [[milestone]]
        name = "three day bonus"
        threshold_days = 3
        bonus = 1

        [[milestone]]
        name = "坚持一周"
        threshold_days = 7
        bonus = 5
        "#,
    )
    .unwrap();
    let catalog = MilestoneCatalog::load(&catalog_path).unwrap();

    let mut config = Config::default();
    config
        .apply(
            "database.path",
            dir.path().join("scores.db").to_str().unwrap(),
        )
        .unwrap();
    let store = SqliteScoreStore::open_with_config(&config).unwrap();
    let awarder = Awarder::from_config(&store, &catalog, &config.scoring);

    for d in 1..=7 {
        let event = if d % 2 == 0 {
            ActivityEvent::check_in("nina", day(d)).unwrap()
        } else {
            ActivityEvent::transaction("nina", day(d), ActivityKind::Expense, 880, None).unwrap()
        };
        awarder.record_and_award(&event).unwrap();
    }

    let day3 = store.score_on("nina", day(3)).unwrap().unwrap();
    assert_eq!(day3.bonus_score, 3);
    assert_eq!(
        day3.milestones,
        vec!["坚持三天".to_string(), "three day bonus".to_string()]
    );

    let day7 = store.score_on("nina", day(7)).unwrap().unwrap();
    assert_eq!(day7.streak_length, 7);
    assert_eq!(day7.total_score(), 7);

    // 7 days x 2, plus 3 on day three and 5 on day seven
    let board = leaderboard(&store, day(1), day(7)).unwrap();
    assert_eq!(board.user_rankings()[0].total_score, 22);
    assert_eq!(board.user_rankings()[0].best_streak, 7);
}

#[test]
fn test_missing_catalog_scores_without_bonus() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = MilestoneCatalog::load(&dir.path().join("absent.toml")).unwrap();
    let store = SqliteScoreStore::open_memory().unwrap();
    let awarder = Awarder::new(&store, &catalog);

    for d in 1..=3 {
        let event = ActivityEvent::check_in("omar", day(d)).unwrap();
        let outcome = awarder.record_and_award(&event).unwrap().unwrap();
        assert_eq!(outcome.total(), 2);
    }
}

#[test]
fn test_reset_policy_breaks_streak_after_gap() {
    let store = SqliteScoreStore::open_memory().unwrap();
    let catalog = MilestoneCatalog::builtin();
    let awarder = Awarder::new(&store, &catalog).with_policy(MissedDayPolicy::Reset);

    for d in [1, 2, 5, 6, 7] {
        let event = ActivityEvent::check_in("pia", day(d)).unwrap();
        awarder.record_and_award(&event).unwrap();
    }

    let record = store.score_on("pia", day(7)).unwrap().unwrap();
    assert_eq!(record.streak_length, 3);
    assert_eq!(record.milestones, vec!["坚持三天".to_string()]);
}

#[test]
fn test_concurrent_writers_on_shared_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.db");
    let catalog = MilestoneCatalog::empty();

    {
        let store = SqliteScoreStore::open(&path, Duration::from_secs(5)).unwrap();
        store
            .record_activity(&ActivityEvent::check_in("quin", day(1)).unwrap())
            .unwrap();
    }

    std::thread::scope(|scope| {
        for _ in 0..3 {
            scope.spawn(|| {
                let store = SqliteScoreStore::open(&path, Duration::from_secs(5)).unwrap();
                Awarder::new(&store, &catalog)
                    .award("quin", day(1))
                    .unwrap();
            });
        }
    });

    let store = SqliteScoreStore::open(&path, Duration::from_secs(5)).unwrap();
    let rows = store.scores_between(day(1), day(1)).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].streak_length, 1);
}
