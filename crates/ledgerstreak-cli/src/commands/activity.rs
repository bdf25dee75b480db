use chrono::NaiveDate;
use clap::Subcommand;
use ledgerstreak_core::{ActivityEvent, ActivityKind, ScoreStore};

use super::{print_json, today, CmdResult, Context};

#[derive(Subcommand)]
pub enum ActivityAction {
    /// Record an expense and award its day
    Expense {
        #[arg(long)]
        user: String,
        /// Amount in minor currency units (cents)
        #[arg(long, allow_hyphen_values = true)]
        amount: i64,
        /// Calendar date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Category group
        #[arg(long)]
        category: Option<String>,
    },
    /// Record income and award its day
    Income {
        #[arg(long)]
        user: String,
        /// Amount in minor currency units (cents)
        #[arg(long, allow_hyphen_values = true)]
        amount: i64,
        /// Calendar date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Category group
        #[arg(long)]
        category: Option<String>,
    },
    /// Check in without an amount
    Checkin {
        #[arg(long)]
        user: String,
        /// Calendar date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List a user's activities
    List {
        #[arg(long)]
        user: String,
    },
}

pub fn run(action: ActivityAction) -> CmdResult {
    let ctx = Context::open()?;

    let event = match action {
        ActivityAction::Expense {
            user,
            amount,
            date,
            category,
        } => ActivityEvent::transaction(
            user,
            date.unwrap_or_else(today),
            ActivityKind::Expense,
            amount,
            category,
        )?,
        ActivityAction::Income {
            user,
            amount,
            date,
            category,
        } => ActivityEvent::transaction(
            user,
            date.unwrap_or_else(today),
            ActivityKind::Income,
            amount,
            category,
        )?,
        ActivityAction::Checkin { user, date } => {
            ActivityEvent::check_in(user, date.unwrap_or_else(today))?
        }
        ActivityAction::List { user } => {
            let events = ctx.store.activities_for_user(&user)?;
            return print_json(&events);
        }
    };

    let award = ctx.awarder().record_and_award(&event)?;
    print_json(&serde_json::json!({
        "activity": event,
        "award": award,
    }))
}
