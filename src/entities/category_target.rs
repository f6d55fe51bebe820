//! Category target entity - One version in a category's funding-target history.
//!
//! Versions form a non-overlapping chain per category. A version is active for
//! month `M` when `effective_from <= M` and either `effective_to` is absent or
//! `M < effective_to`. Months are stored as `YYYY-MM` text so the database can
//! compare them lexically.

use crate::core::month::Month;
use crate::errors;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How a target's shortfall is measured.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// Assign a fixed amount every month
    #[sea_orm(string_value = "monthly_savings")]
    MonthlySavings,
    /// Build the category balance up to an amount by a date
    #[sea_orm(string_value = "savings_balance")]
    SavingsBalance,
    /// Have an amount available to spend by a date
    #[sea_orm(string_value = "spending_by_date")]
    SpendingByDate,
}

impl TargetType {
    /// Whether a `target_date` must accompany this type.
    #[must_use]
    pub const fn requires_date(self) -> bool {
        !matches!(self, Self::MonthlySavings)
    }
}

/// Category target database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category_targets")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Category this version belongs to
    pub category_id: i64,
    /// Kind of target
    pub target_type: TargetType,
    /// Goal amount in cents, always positive
    pub target_amount: i64,
    /// Month the goal is due (`YYYY-MM`), absent for monthly savings
    pub target_date: Option<String>,
    /// First month this version applies to (`YYYY-MM`)
    pub effective_from: String,
    /// First month this version no longer applies to, absent while open
    pub effective_to: Option<String>,
    /// When the version was created
    pub created_at: DateTime,
    /// When the version was last modified
    pub updated_at: DateTime,
}

impl Model {
    /// Parsed `effective_from`.
    pub fn effective_from_month(&self) -> errors::Result<Month> {
        Month::parse(&self.effective_from)
    }

    /// Parsed `effective_to`.
    pub fn effective_to_month(&self) -> errors::Result<Option<Month>> {
        self.effective_to.as_deref().map(Month::parse).transpose()
    }

    /// Parsed `target_date`.
    pub fn target_month(&self) -> errors::Result<Option<Month>> {
        self.target_date.as_deref().map(Month::parse).transpose()
    }
}

/// Defines relationships between `CategoryTarget` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each version belongs to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::Error;
    use chrono::Utc;
    use sea_orm::Set;

    fn version(effective_to: Option<&str>, target_date: Option<&str>) -> Model {
        let now = Utc::now().naive_utc();
        Model {
            id: 1,
            category_id: 1,
            target_type: TargetType::SavingsBalance,
            target_amount: 60_000,
            target_date: target_date.map(str::to_string),
            effective_from: "2024-01".to_string(),
            effective_to: effective_to.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_month_accessors() {
        let open = version(None, Some("2024-06"));
        assert_eq!(open.effective_from_month().unwrap(), Month::parse("2024-01").unwrap());
        assert_eq!(open.effective_to_month().unwrap(), None);
        assert_eq!(open.target_month().unwrap(), Some(Month::parse("2024-06").unwrap()));

        let closed = version(Some("2024-03"), None);
        assert_eq!(closed.effective_to_month().unwrap(), Some(Month::parse("2024-03").unwrap()));
        assert_eq!(closed.target_month().unwrap(), None);

        let corrupt = version(Some("March"), None);
        assert!(matches!(corrupt.effective_to_month(), Err(Error::InvalidMonth { .. })));
    }

    #[test]
    fn test_active_model_round_trip() {
        let model = version(Some("2024-03"), Some("2024-06"));
        let mut active: ActiveModel = model.clone().into();
        active.target_amount = Set(75_000);

        let updated = Model::try_from(active).unwrap();
        assert_eq!(updated.target_amount, 75_000);
        assert_eq!(updated.effective_to, model.effective_to);
    }
}
