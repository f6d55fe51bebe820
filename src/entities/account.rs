//! Account entity - Where money is held (checking, savings, credit card, cash).
//!
//! The budget engine treats accounts as opaque foreign keys on transactions;
//! they exist so the ledger can group and report by where money moved.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of account, stored as its snake_case name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[sea_orm(string_value = "checking")]
    Checking,
    #[sea_orm(string_value = "savings")]
    Savings,
    #[sea_orm(string_value = "credit")]
    Credit,
    #[sea_orm(string_value = "cash")]
    Cash,
}

/// Account database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Unique identifier for the account
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Everyday", "Visa")
    pub name: String,
    /// Kind of account
    #[serde(rename = "type")]
    #[sea_orm(column_name = "type")]
    pub account_type: AccountType,
    /// When the account was created
    pub created_at: DateTime,
    /// When the account was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Account and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One account has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
