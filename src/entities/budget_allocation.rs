//! Budget allocation entity - Money assigned to a category for one month.
//!
//! There is at most one row per `(month, category_id)`; writes go through an
//! upsert on that pair (see `config::database::create_tables` for the index).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget allocation database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_allocations")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Month as `YYYY-MM`
    pub month: String,
    /// Category the money is assigned to
    pub category_id: i64,
    /// Amount assigned in cents
    pub amount: i64,
    /// When the allocation was first made
    pub created_at: DateTime,
    /// When the allocation was last changed
    pub updated_at: DateTime,
}

/// Defines relationships between `BudgetAllocation` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each allocation belongs to one category
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
