use chrono::NaiveDate;
use clap::Args;

use super::{print_json, today, CmdResult, Context};

#[derive(Args)]
pub struct AwardArgs {
    #[arg(long)]
    pub user: String,
    /// Calendar date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub fn run(args: AwardArgs) -> CmdResult {
    let ctx = Context::open()?;
    let outcome = ctx
        .awarder()
        .award(&args.user, args.date.unwrap_or_else(today))?;
    print_json(&outcome)
}
