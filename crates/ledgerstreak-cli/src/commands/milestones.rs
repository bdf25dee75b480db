use clap::Subcommand;
use ledgerstreak_core::{Config, MilestoneCatalog};

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum MilestonesAction {
    /// List the rules in the active catalog
    List,
    /// Validate the catalog file
    Check,
}

pub fn run(action: MilestonesAction) -> CmdResult {
    let config = Config::load()?;
    let path = config.milestones_path()?;

    match action {
        MilestonesAction::List => {
            let catalog = MilestoneCatalog::load(&path)?;
            let rules: Vec<_> = catalog.rules().collect();
            print_json(&rules)
        }
        MilestonesAction::Check => {
            if !path.exists() {
                return Err(format!("milestone catalog not found: {}", path.display()).into());
            }
            let catalog = MilestoneCatalog::load(&path)?;
            print_json(&serde_json::json!({
                "path": path,
                "rules": catalog.len(),
            }))
        }
    }
}
