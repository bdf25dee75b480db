use chrono::{Duration, NaiveDate};
use ledgerstreak_core::ValidationError;
use clap::Args;
use ledgerstreak_core::leaderboard;

use super::{print_json, today, CmdResult, Context};

#[derive(Args)]
pub struct LeaderboardArgs {
    /// First day (YYYY-MM-DD), defaults to six days before `--to`
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Last day (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub to: Option<NaiveDate>,
    /// Print group rankings instead of users
    #[arg(long)]
    pub groups: bool,
}

pub fn run(args: LeaderboardArgs) -> CmdResult {
    let ctx = Context::open()?;
    let to = args.to.unwrap_or_else(today);
    let from = match args.from {
        Some(from) => from,
        None => week_before(to)?,
    };

    let board = leaderboard(&ctx.store, from, to)?;
    if args.groups {
        print_json(&board.group_rankings())
    } else {
        print_json(&board.user_rankings())
    }
}

/// First day of the seven-day window ending on `to`.
fn week_before(to: NaiveDate) -> Result<NaiveDate, ValidationError> {
    to.checked_sub_signed(Duration::days(6))
        .ok_or_else(|| ValidationError::InvalidValue {
            field: "to".into(),
            message: format!("no seven-day window ends on {to}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_seven_days() {
        let to = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(
            week_before(to).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
        );
    }

    #[test]
    fn window_before_earliest_date_is_an_error() {
        assert!(matches!(
            week_before(NaiveDate::MIN),
            Err(ValidationError::InvalidValue { .. })
        ));
    }
}
