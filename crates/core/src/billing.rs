//! Billing period windows and the payment-status state machine.
//!
//! A billing period covers one calendar month (UTC). Exactly one period per
//! user is *current*; only closed periods may change payment status.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Date, Timestamp};

/// Maximum length of an external payment reference.
pub const MAX_PAYMENT_REFERENCE_LENGTH: usize = 255;

/// Default grace period after `period_end` before a pending period is overdue.
pub const DEFAULT_OVERDUE_AFTER_DAYS: i64 = 30;

// ---------------------------------------------------------------------------
// Payment status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
    Waived,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Overdue,
        PaymentStatus::Waived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Overdue => "overdue",
            PaymentStatus::Waived => "waived",
        }
    }

    /// `paid` and `waived` are absorbing.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Waived)
    }

    /// Statuses reachable from `self` in one step.
    ///
    /// - `pending` -> `paid`, `overdue`, `waived`
    /// - `overdue` -> `paid`, `waived`
    /// - `paid`, `waived` -> nothing
    pub fn allowed_transitions(&self) -> &'static [PaymentStatus] {
        match self {
            PaymentStatus::Pending => &[
                PaymentStatus::Paid,
                PaymentStatus::Overdue,
                PaymentStatus::Waived,
            ],
            PaymentStatus::Overdue => &[PaymentStatus::Paid, PaymentStatus::Waived],
            PaymentStatus::Paid | PaymentStatus::Waived => &[],
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "overdue" => Ok(PaymentStatus::Overdue),
            "waived" => Ok(PaymentStatus::Waived),
            other => Err(CoreError::Validation(format!(
                "Invalid payment status '{other}'. Must be one of: pending, paid, overdue, waived"
            ))),
        }
    }
}

/// Check that a period in `from` may move to `to`.
///
/// Current periods never transition; they must be rolled over first.
pub fn validate_transition(
    from: PaymentStatus,
    to: PaymentStatus,
    is_current: bool,
) -> Result<(), CoreError> {
    if is_current {
        return Err(CoreError::InvalidTransition {
            from,
            to,
            reason: "the current billing period cannot change payment status",
        });
    }
    if from.is_terminal() {
        return Err(CoreError::InvalidTransition {
            from,
            to,
            reason: "payment status is final",
        });
    }
    if !from.allowed_transitions().contains(&to) {
        return Err(CoreError::InvalidTransition {
            from,
            to,
            reason: "transition is not allowed",
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Payment metadata
// ---------------------------------------------------------------------------

/// Optional details recorded alongside a status change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentMetadata {
    /// Amount actually paid. Defaults to the period's total cost.
    pub amount_cents: Option<i64>,
    /// External invoice or payment reference.
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl PaymentMetadata {
    pub fn validate(&self) -> Result<(), CoreError> {
        if matches!(self.amount_cents, Some(amount) if amount < 0) {
            return Err(CoreError::Validation(
                "amount_cents must not be negative".into(),
            ));
        }
        if let Some(reference) = &self.reference {
            if reference.chars().count() > MAX_PAYMENT_REFERENCE_LENGTH {
                return Err(CoreError::Validation(format!(
                    "reference must be at most {MAX_PAYMENT_REFERENCE_LENGTH} characters"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Period windows
// ---------------------------------------------------------------------------

/// The first and last day of a calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    pub start: Date,
    pub end: Date,
}

impl PeriodWindow {
    /// The calendar month containing `date`.
    pub fn containing(date: Date) -> Self {
        let start = first_of_month(date);
        let end = first_of_next_month(start)
            .pred_opt()
            .unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    /// The calendar month containing the UTC date of `at`.
    pub fn containing_instant(at: Timestamp) -> Self {
        Self::containing(at.date_naive())
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

fn first_of_month(date: Date) -> Date {
    date.with_day(1).unwrap_or(date)
}

fn first_of_next_month(start: Date) -> Date {
    let (year, month) = if start.month() == 12 {
        (start.year() + 1, 1)
    } else {
        (start.year(), start.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
}

/// Human-readable label such as `"August 2025"`.
pub fn period_label(period_start: Date) -> String {
    period_start.format("%B %Y").to_string()
}

/// Pending periods that ended before this date are overdue.
pub fn overdue_cutoff(today: Date, after_days: i64) -> Result<Date, CoreError> {
    chrono::TimeDelta::try_days(after_days)
        .and_then(|delta| today.checked_sub_signed(delta))
        .ok_or_else(|| CoreError::Validation(format!("after_days out of range: {after_days}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    macro_rules! assert_invalid {
        ($result:expr) => {
            assert_matches!($result, Err(CoreError::InvalidTransition { .. }))
        };
    }

    // -- Status parsing ----------------------------------------------------

    #[test]
    fn all_statuses_round_trip_through_str() {
        for status in PaymentStatus::ALL {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_invalid() {
        assert!("refunded".parse::<PaymentStatus>().is_err());
        assert!("".parse::<PaymentStatus>().is_err());
    }

    // -- Transitions -------------------------------------------------------

    #[test]
    fn pending_can_move_to_paid_overdue_or_waived() {
        for to in [PaymentStatus::Paid, PaymentStatus::Overdue, PaymentStatus::Waived] {
            assert!(validate_transition(PaymentStatus::Pending, to, false).is_ok());
        }
        assert_invalid!(validate_transition(
            PaymentStatus::Pending,
            PaymentStatus::Pending,
            false
        ));
    }

    #[test]
    fn overdue_can_move_to_paid_or_waived() {
        assert!(validate_transition(PaymentStatus::Overdue, PaymentStatus::Paid, false).is_ok());
        assert!(validate_transition(PaymentStatus::Overdue, PaymentStatus::Waived, false).is_ok());
        assert_invalid!(validate_transition(
            PaymentStatus::Overdue,
            PaymentStatus::Pending,
            false
        ));
        assert_invalid!(validate_transition(
            PaymentStatus::Overdue,
            PaymentStatus::Overdue,
            false
        ));
    }

    #[test]
    fn paid_and_waived_are_absorbing() {
        for from in [PaymentStatus::Paid, PaymentStatus::Waived] {
            assert!(from.is_terminal());
            for to in PaymentStatus::ALL {
                assert_invalid!(validate_transition(from, to, false));
            }
        }
    }

    #[test]
    fn current_period_never_transitions() {
        for from in PaymentStatus::ALL {
            for to in PaymentStatus::ALL {
                assert_invalid!(validate_transition(from, to, true));
            }
        }
    }

    #[test]
    fn any_walk_from_a_terminal_state_stays_there() {
        for start in [PaymentStatus::Paid, PaymentStatus::Waived] {
            let mut status = start;
            for to in PaymentStatus::ALL.iter().cycle().take(16) {
                if validate_transition(status, *to, false).is_ok() {
                    status = *to;
                }
            }
            assert_eq!(status, start);
        }
    }

    // -- Metadata ----------------------------------------------------------

    #[test]
    fn negative_amount_is_rejected() {
        let meta = PaymentMetadata {
            amount_cents: Some(-1),
            ..Default::default()
        };
        assert!(meta.validate().is_err());
    }

    #[test]
    fn long_reference_is_rejected() {
        let meta = PaymentMetadata {
            reference: Some("r".repeat(MAX_PAYMENT_REFERENCE_LENGTH + 1)),
            ..Default::default()
        };
        assert!(meta.validate().is_err());

        let ok = PaymentMetadata {
            amount_cents: Some(1200),
            reference: Some("INV-1".into()),
            notes: None,
        };
        assert!(ok.validate().is_ok());
    }

    // -- Windows -----------------------------------------------------------

    #[test]
    fn mid_month_window() {
        let window = PeriodWindow::containing(date(2025, 8, 15));
        assert_eq!(window.start, date(2025, 8, 1));
        assert_eq!(window.end, date(2025, 8, 31));
    }

    #[test]
    fn december_window_ends_on_new_years_eve() {
        let window = PeriodWindow::containing(date(2025, 12, 31));
        assert_eq!(window.start, date(2025, 12, 1));
        assert_eq!(window.end, date(2025, 12, 31));
    }

    #[test]
    fn february_windows_respect_leap_years() {
        assert_eq!(PeriodWindow::containing(date(2024, 2, 10)).end, date(2024, 2, 29));
        assert_eq!(PeriodWindow::containing(date(2025, 2, 10)).end, date(2025, 2, 28));
    }

    #[test]
    fn window_from_instant_uses_utc_date() {
        use chrono::TimeZone;
        let at = chrono::Utc.with_ymd_and_hms(2025, 8, 31, 23, 59, 59).unwrap();
        let window = PeriodWindow::containing_instant(at);
        assert_eq!(window.start, date(2025, 8, 1));
        assert!(window.contains(date(2025, 8, 31)));
        assert!(!window.contains(date(2025, 9, 1)));
    }

    #[test]
    fn label_is_month_and_year() {
        assert_eq!(period_label(date(2025, 1, 1)), "January 2025");
    }

    #[test]
    fn overdue_cutoff_subtracts_days() {
        assert_eq!(overdue_cutoff(date(2025, 10, 5), 30).unwrap(), date(2025, 9, 5));
    }

    #[test]
    fn overdue_cutoff_rejects_out_of_range_days() {
        assert_matches!(
            overdue_cutoff(date(2025, 10, 5), i64::MAX),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            overdue_cutoff(date(2025, 10, 5), 1_000_000_000),
            Err(CoreError::Validation(_))
        );
    }
}
