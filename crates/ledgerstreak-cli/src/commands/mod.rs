pub mod activity;
pub mod award;
pub mod config;
pub mod group;
pub mod leaderboard;
pub mod milestones;
pub mod score;

use chrono::NaiveDate;
use ledgerstreak_core::{Awarder, Config, MilestoneCatalog, SqliteScoreStore};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a command needs: config, an open store and the catalog.
pub struct Context {
    pub config: Config,
    pub store: SqliteScoreStore,
    pub catalog: MilestoneCatalog,
}

impl Context {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let store = SqliteScoreStore::open_with_config(&config)?;
        let catalog = MilestoneCatalog::load(&config.milestones_path()?)?;
        tracing::debug!(
            database = ?store.path(),
            milestones = catalog.len(),
            "opened command context"
        );
        Ok(Self {
            config,
            store,
            catalog,
        })
    }

    pub fn awarder(&self) -> Awarder<'_, SqliteScoreStore> {
        Awarder::from_config(&self.store, &self.catalog, &self.config.scoring)
    }
}

/// Local calendar date.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn print_json<T: Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
