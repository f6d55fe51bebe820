//! Category entity - A named budgeting envelope.
//!
//! Categories are the rows of every budget view. Transactions, allocations and
//! targets all point at a category, which is why a category can only be
//! removed once nothing references it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable name (e.g., "Groceries", "Rent")
    pub name: String,
    /// Display colour as `#RRGGBB`
    pub colour: String,
    /// When the category was created
    pub created_at: DateTime,
    /// When the category was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Transactions tagged with this category
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
    /// Monthly allocations into this category
    #[sea_orm(has_many = "super::budget_allocation::Entity")]
    BudgetAllocations,
    /// Target versions for this category
    #[sea_orm(has_many = "super::category_target::Entity")]
    CategoryTargets,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::budget_allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetAllocations.def()
    }
}

impl Related<super::category_target::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CategoryTargets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
