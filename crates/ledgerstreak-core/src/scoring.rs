//! Daily score and streak calculator.
//!
//! Given the streak entering a day, whether the day has qualifying activity,
//! and the milestone catalog, decide the day's score:
//!
//! | Activity today | Base | Streak | Bonus                         | New streak |
//! |----------------|------|--------|-------------------------------|------------|
//! | no             | 0    | 0      | 0                             | prior      |
//! | yes            | 1    | 1      | sum of rules at `prior + 1`   | prior + 1  |
//!
//! Milestones match on exact equality only; a day that skips past a
//! threshold never earns it retroactively. The calculator has no side
//! effects and never looks at activity history itself.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::milestone::MilestoneCatalog;

/// Fixed score for any day with qualifying activity.
pub const BASE_SCORE: i64 = 1;

/// Score for extending (or starting) a streak.
pub const STREAK_SCORE: i64 = 1;

/// Outcome of scoring one user-day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyScore {
    pub base_score: i64,
    pub streak_score: i64,
    pub bonus_score: i64,
    pub new_streak: u32,
    /// Names of every milestone reached today, for display
    pub achieved: Vec<String>,
}

impl DailyScore {
    /// Authoritative value for ranking.
    pub fn total(&self) -> i64 {
        self.base_score + self.streak_score + self.bonus_score
    }

    pub fn is_scored(&self) -> bool {
        self.base_score > 0
    }
}

/// Score a day.
///
/// # Errors
/// Returns [`ValidationError::NegativeStreak`] if `prior_streak < 0`, and
/// [`ValidationError::InvalidValue`] if the streak cannot grow any further.
pub fn calculate(
    prior_streak: i64,
    has_activity_today: bool,
    catalog: &MilestoneCatalog,
) -> Result<DailyScore, ValidationError> {
    if prior_streak < 0 {
        return Err(ValidationError::NegativeStreak {
            value: prior_streak,
        });
    }
    let prior = u32::try_from(prior_streak).map_err(|_| ValidationError::InvalidValue {
        field: "prior_streak".into(),
        message: format!("{prior_streak} exceeds the maximum streak length"),
    })?;

    if !has_activity_today {
        return Ok(DailyScore {
            base_score: 0,
            streak_score: 0,
            bonus_score: 0,
            new_streak: prior,
            achieved: Vec::new(),
        });
    }

    let new_streak = prior
        .checked_add(1)
        .ok_or_else(|| ValidationError::InvalidValue {
            field: "prior_streak".into(),
            message: "streak length overflow".into(),
        })?;
    let streak_score = if new_streak > 0 { STREAK_SCORE } else { 0 };

    let matched = catalog.matching(new_streak);
    let bonus_score = matched.iter().map(|rule| rule.bonus).sum();
    let achieved = matched.iter().map(|rule| rule.name.clone()).collect();

    Ok(DailyScore {
        base_score: BASE_SCORE,
        streak_score,
        bonus_score,
        new_streak,
        achieved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milestone::MilestoneRule;
    use proptest::prelude::*;

    fn catalog(rules: Vec<MilestoneRule>) -> MilestoneCatalog {
        MilestoneCatalog::from_rules(rules).unwrap()
    }

    #[test]
    fn milestone_fires_on_exact_threshold() {
        let cat = catalog(vec![MilestoneRule::new("five days", 5, 3)]);

        let score = calculate(4, true, &cat).unwrap();
        assert_eq!(score.new_streak, 5);
        assert_eq!(score.bonus_score, 3);
        assert_eq!(score.achieved, vec!["five days".to_string()]);

        let past = calculate(5, true, &cat).unwrap();
        assert_eq!(past.new_streak, 6);
        assert_eq!(past.bonus_score, 0);
        assert!(past.achieved.is_empty());
    }

    #[test]
    fn duplicate_thresholds_are_summed() {
        let cat = catalog(vec![
            MilestoneRule::new("a", 5, 3),
            MilestoneRule::new("b", 5, 2),
        ]);
        let score = calculate(4, true, &cat).unwrap();
        assert_eq!(score.bonus_score, 5);
        assert_eq!(score.achieved.len(), 2);
    }

    #[test]
    fn three_day_scenario() {
        let cat = catalog(vec![MilestoneRule::new("坚持三天", 3, 2)]);
        let score = calculate(2, true, &cat).unwrap();
        assert_eq!(score.base_score, 1);
        assert_eq!(score.streak_score, 1);
        assert_eq!(score.bonus_score, 2);
        assert_eq!(score.new_streak, 3);
        assert_eq!(score.achieved, vec!["坚持三天".to_string()]);
        assert_eq!(score.total(), 4);
    }

    #[test]
    fn first_day_milestone_fires() {
        let cat = catalog(vec![MilestoneRule::new("welcome", 1, 1)]);
        let score = calculate(0, true, &cat).unwrap();
        assert_eq!(score.new_streak, 1);
        assert_eq!(score.bonus_score, 1);
    }

    #[test]
    fn empty_catalog_scores_without_bonus() {
        let score = calculate(9, true, &MilestoneCatalog::empty()).unwrap();
        assert_eq!(score.total(), 2);
    }

    #[test]
    fn negative_prior_streak_fails_fast() {
        let err = calculate(-1, true, &MilestoneCatalog::empty()).unwrap_err();
        assert_eq!(err, ValidationError::NegativeStreak { value: -1 });
    }

    #[test]
    fn streak_overflow_is_rejected() {
        let result = calculate(i64::from(u32::MAX), true, &MilestoneCatalog::empty());
        assert!(matches!(result, Err(ValidationError::InvalidValue { .. })));
    }

    proptest! {
        #[test]
        fn inactive_day_freezes_streak(prior in 0i64..100_000) {
            let score = calculate(prior, false, &MilestoneCatalog::builtin()).unwrap();
            prop_assert_eq!(i64::from(score.new_streak), prior);
            prop_assert_eq!(score.total(), 0);
            prop_assert!(score.achieved.is_empty());
        }

        #[test]
        fn active_day_extends_streak(prior in 0i64..100_000) {
            let score = calculate(prior, true, &MilestoneCatalog::builtin()).unwrap();
            prop_assert_eq!(i64::from(score.new_streak), prior + 1);
            prop_assert_eq!(score.base_score, 1);
            prop_assert_eq!(score.streak_score, 1);
        }

        #[test]
        fn bonus_only_on_exact_threshold(threshold in 1i64..500, bonus in 0i64..50, prior in 0i64..1_000) {
            let cat = catalog(vec![MilestoneRule::new("m", threshold, bonus)]);
            let score = calculate(prior, true, &cat).unwrap();
            let expected = if prior + 1 == threshold { bonus } else { 0 };
            prop_assert_eq!(score.bonus_score, expected);
        }
    }
}
