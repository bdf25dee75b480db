use chrono::NaiveDate;
use clap::Subcommand;
use ledgerstreak_core::ScoreStore;

use super::{print_json, today, CmdResult, Context};

#[derive(Subcommand)]
pub enum ScoreAction {
    /// Score recorded for a day (null if none)
    Show {
        #[arg(long)]
        user: String,
        /// Calendar date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Streak entering a day under the configured missed-day policy
    Streak {
        #[arg(long)]
        user: String,
        /// Calendar date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub fn run(action: ScoreAction) -> CmdResult {
    let ctx = Context::open()?;

    match action {
        ScoreAction::Show { user, date } => {
            let record = ctx.store.score_on(&user, date.unwrap_or_else(today))?;
            print_json(&record)
        }
        ScoreAction::Streak { user, date } => {
            let date = date.unwrap_or_else(today);
            let awarder = ctx.awarder();
            let prior = awarder.prior_streak(&user, date)?;
            print_json(&serde_json::json!({
                "user_id": user,
                "date": date,
                "policy": awarder.policy(),
                "prior_streak": prior,
            }))
        }
    }
}
