//! Transaction entity - A dated income or expense entry.
//!
//! `amount` is always non-negative minor units; direction comes from `kind`.
//! `category_id` is optional, uncategorised expenses are counted separately by
//! the budget view.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Direction of a transaction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    #[sea_orm(string_value = "income")]
    Income,
    #[sea_orm(string_value = "expense")]
    Expense,
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Account the money moved through
    pub account_id: i64,
    /// Optional budgeting category
    pub category_id: Option<i64>,
    /// Amount in cents, never negative
    pub amount: i64,
    /// Human-readable description of the transaction
    pub description: String,
    /// Calendar date of the transaction
    pub date: Date,
    /// Income or expense
    #[serde(rename = "type")]
    #[sea_orm(column_name = "type")]
    pub kind: TransactionKind,
    /// When the row was created
    pub created_at: DateTime,
    /// When the row was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id"
    )]
    Account,
    /// A transaction may belong to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
