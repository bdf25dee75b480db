use clap::Subcommand;
use ledgerstreak_core::{Config, MilestoneCatalog};

use super::CmdResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "scoring.missed_day_policy")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Write default config and milestone catalog if missing
    Init,
}

pub fn run(action: ConfigAction) -> CmdResult {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
        ConfigAction::Init => {
            let config = Config::load()?;
            let catalog_path = config.milestones_path()?;
            if catalog_path.exists() {
                println!("milestone catalog already exists: {}", catalog_path.display());
            } else {
                MilestoneCatalog::builtin().save(&catalog_path)?;
                println!("wrote milestone catalog: {}", catalog_path.display());
            }
        }
    }
    Ok(())
}
