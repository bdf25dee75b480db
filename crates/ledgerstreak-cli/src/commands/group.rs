use clap::Subcommand;
use ledgerstreak_core::ScoreStore;

use super::{print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum GroupAction {
    /// Put a user in a group (replaces any previous group)
    Set {
        #[arg(long)]
        user: String,
        group: String,
    },
    /// List memberships
    List,
}

pub fn run(action: GroupAction) -> CmdResult {
    let ctx = Context::open()?;

    match action {
        GroupAction::Set { user, group } => {
            if group.trim().is_empty() {
                return Err("group name must not be empty".into());
            }
            ctx.store.set_group(&user, &group)?;
            println!("ok");
            Ok(())
        }
        GroupAction::List => {
            let groups: std::collections::BTreeMap<_, _> =
                ctx.store.group_memberships()?.into_iter().collect();
            print_json(&groups)
        }
    }
}
