//! # Ledgerstreak Core Library
//!
//! Daily gamified scoring for a personal finance tracker. Users record
//! expenses, income or plain check-ins; each day with qualifying activity
//! earns a base score, a streak score and any milestone bonus reached
//! exactly on that day.
//!
//! ## Architecture
//!
//! - **Calculator**: a pure function from (prior streak, active today,
//!   milestone catalog) to the day's score
//! - **Award recorder**: reads the prior streak, runs the calculator and
//!   upserts one row per user-day under an exclusive award lock
//! - **Storage**: SQLite ledger and score table plus TOML configuration
//! - **Leaderboard**: per-user and per-group totals over stored rows
//!
//! ## Key Components
//!
//! - [`calculate`]: the streak and score calculator
//! - [`Awarder`]: idempotent award pathway
//! - [`ScoreStore`]: storage contract, implemented by [`SqliteScoreStore`]
//!   and [`MemoryScoreStore`]
//! - [`MilestoneCatalog`]: threshold-indexed milestone rules
//! - [`Config`]: application configuration management

pub mod activity;
pub mod award;
pub mod error;
pub mod leaderboard;
pub mod milestone;
pub mod record;
pub mod scoring;
pub mod storage;
pub mod store;

pub use activity::{ActivityEvent, ActivityKind};
pub use award::{AwardOutcome, Awarder, MissedDayPolicy};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use leaderboard::{leaderboard, GroupStanding, Leaderboard, UserStanding};
pub use milestone::{MilestoneCatalog, MilestoneRule};
pub use record::DailyScoreRecord;
pub use scoring::{calculate, DailyScore, BASE_SCORE, STREAK_SCORE};
pub use storage::{Config, SqliteScoreStore};
pub use store::{MemoryScoreStore, ScoreStore};
