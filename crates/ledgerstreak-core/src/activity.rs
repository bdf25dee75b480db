//! User activity ledger entries.
//!
//! An [`ActivityEvent`] is one interaction on a calendar day: an expense or
//! income record, or an explicit check-in with no amount. Events are
//! immutable once written; only their existence on a date feeds scoring.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Kind of activity recorded by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Expense,
    Income,
    /// No monetary amount; only keeps the streak alive
    CheckIn,
}

impl ActivityKind {
    pub fn is_transaction(&self) -> bool {
        matches!(self, ActivityKind::Expense | ActivityKind::Income)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Expense => "expense",
            ActivityKind::Income => "income",
            ActivityKind::CheckIn => "check_in",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "expense" => Some(ActivityKind::Expense),
            "income" => Some(ActivityKind::Income),
            "check_in" => Some(ActivityKind::CheckIn),
            _ => None,
        }
    }
}

/// One user interaction on a calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: Uuid,
    pub user_id: String,
    pub date: NaiveDate,
    pub kind: ActivityKind,
    /// Amount in minor currency units; `None` for check-ins
    pub amount_cents: Option<i64>,
    /// Category group the transaction was filed under
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ActivityEvent {
    /// Create an expense or income record.
    ///
    /// # Errors
    /// Returns an error if `kind` is a check-in or the user id is empty.
    pub fn transaction(
        user_id: impl Into<String>,
        date: NaiveDate,
        kind: ActivityKind,
        amount_cents: i64,
        category: Option<String>,
    ) -> Result<Self, ValidationError> {
        let event = Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            date,
            kind,
            amount_cents: Some(amount_cents),
            category,
            created_at: Utc::now(),
        };
        event.validate()?;
        Ok(event)
    }

    /// Create an explicit check-in.
    ///
    /// # Errors
    /// Returns an error if the user id is empty.
    pub fn check_in(user_id: impl Into<String>, date: NaiveDate) -> Result<Self, ValidationError> {
        let event = Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            date,
            kind: ActivityKind::CheckIn,
            amount_cents: None,
            category: None,
            created_at: Utc::now(),
        };
        event.validate()?;
        Ok(event)
    }

    /// Check the shape of the event.
    ///
    /// Transactions carry an amount; check-ins never do.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::InvalidActivity(
                "user id must not be empty".into(),
            ));
        }
        match (self.kind.is_transaction(), self.amount_cents) {
            (true, None) => Err(ValidationError::InvalidActivity(format!(
                "{} record requires an amount",
                self.kind.as_str()
            ))),
            (false, Some(_)) => Err(ValidationError::InvalidActivity(
                "check-in must not carry an amount".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Whether this event counts toward the day's score.
    ///
    /// Zero-amount transactions are noise and do not qualify.
    pub fn is_qualifying(&self) -> bool {
        match self.kind {
            ActivityKind::CheckIn => true,
            ActivityKind::Expense | ActivityKind::Income => {
                self.amount_cents.is_some_and(|amount| amount != 0)
            }
        }
    }
}

/// True if any event belongs to `user_id` on `date` and qualifies.
pub fn has_qualifying_activity(events: &[ActivityEvent], user_id: &str, date: NaiveDate) -> bool {
    events
        .iter()
        .any(|e| e.user_id == user_id && e.date == date && e.is_qualifying())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn check_in_qualifies_without_amount() {
        let event = ActivityEvent::check_in("alice", day(1)).unwrap();
        assert!(event.amount_cents.is_none());
        assert!(event.is_qualifying());
    }

    #[test]
    fn zero_amount_transaction_is_noise() {
        let event =
            ActivityEvent::transaction("alice", day(1), ActivityKind::Expense, 0, None).unwrap();
        assert!(!event.is_qualifying());

        let refund =
            ActivityEvent::transaction("alice", day(1), ActivityKind::Income, -250, None).unwrap();
        assert!(refund.is_qualifying());
    }

    #[test]
    fn check_in_kind_rejected_as_transaction() {
        let result = ActivityEvent::transaction("alice", day(1), ActivityKind::CheckIn, 100, None);
        assert!(matches!(result, Err(ValidationError::InvalidActivity(_))));
    }

    #[test]
    fn empty_user_rejected() {
        assert!(ActivityEvent::check_in("  ", day(1)).is_err());
    }

    #[test]
    fn transaction_without_amount_fails_validation() {
        let mut event =
            ActivityEvent::transaction("bob", day(2), ActivityKind::Income, 1200, None).unwrap();
        event.amount_cents = None;
        assert!(event.validate().is_err());
    }

    #[test]
    fn qualifying_filter_matches_user_and_date() {
        let events = vec![
            ActivityEvent::transaction("alice", day(1), ActivityKind::Expense, 0, None).unwrap(),
            ActivityEvent::check_in("bob", day(1)).unwrap(),
            ActivityEvent::transaction("alice", day(2), ActivityKind::Expense, 500, None).unwrap(),
        ];
        assert!(!has_qualifying_activity(&events, "alice", day(1)));
        assert!(has_qualifying_activity(&events, "bob", day(1)));
        assert!(has_qualifying_activity(&events, "alice", day(2)));
    }

    #[test]
    fn kind_string_roundtrip() {
        for kind in [ActivityKind::Expense, ActivityKind::Income, ActivityKind::CheckIn] {
            assert_eq!(ActivityKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ActivityKind::parse("transfer"), None);
    }
}
