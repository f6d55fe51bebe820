//! Target funding evaluation.
//!
//! Given the target active for a category in month `M` and the category's
//! `assigned` (this month) and `available` (rollover) amounts, computes how
//! much more must be assigned this month to stay on track. Integer cents
//! throughout; the per-month requirement of a dated goal uses ceiling division
//! so the goal is never under-funded by rounding.

use crate::{
    core::month::Month,
    entities::{TargetType, category_target},
    errors::{Error, Result},
};
use serde::Serialize;

/// A validated funding target, independent of its place in the version chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetSpec {
    pub target_type: TargetType,
    pub target_amount: i64,
    pub target_date: Option<Month>,
}

impl TargetSpec {
    /// Validates a target: the amount must be positive and every type except
    /// monthly savings needs a due month.
    pub fn new(target_type: TargetType, target_amount: i64, target_date: Option<Month>) -> Result<Self> {
        if target_amount <= 0 {
            return Err(Error::InvalidAmount {
                amount: target_amount,
            });
        }
        if target_type.requires_date() && target_date.is_none() {
            return Err(Error::InvalidTarget {
                message: "target_date is required for this target type".to_string(),
            });
        }
        Ok(Self {
            target_type,
            target_amount,
            target_date,
        })
    }

    /// Like [`TargetSpec::new`] but takes the due month as `YYYY-MM` text.
    pub fn parse(target_type: TargetType, target_amount: i64, target_date: Option<&str>) -> Result<Self> {
        let target_date = target_date.map(Month::parse).transpose()?;
        Self::new(target_type, target_amount, target_date)
    }

    /// Reads the target stored in a chain version.
    pub fn from_model(model: &category_target::Model) -> Result<Self> {
        Ok(Self {
            target_type: model.target_type,
            target_amount: model.target_amount,
            target_date: model.target_month()?,
        })
    }
}

/// Additional funding `spec` still needs in `month`. Never negative.
#[must_use]
pub fn underfunded(spec: &TargetSpec, assigned: i64, available: i64, month: Month) -> i64 {
    match spec.target_type {
        TargetType::MonthlySavings => (spec.target_amount - assigned).max(0),
        TargetType::SavingsBalance | TargetType::SpendingByDate => {
            let shortfall = spec.target_amount - available;
            if shortfall <= 0 {
                return 0;
            }

            let Some(target_date) = spec.target_date else {
                return (shortfall - assigned).max(0);
            };

            let months_remaining = month.months_until(target_date);
            if months_remaining <= 0 {
                // due now or overdue, the whole remainder is required
                return shortfall;
            }

            let monthly_needed = ceil_div(shortfall, months_remaining);
            (monthly_needed - assigned).max(0)
        }
    }
}

/// Ceiling division for a non-negative numerator and positive denominator.
const fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    (numerator + denominator - 1) / denominator
}
