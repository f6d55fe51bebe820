//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod account;
pub mod budget_allocation;
pub mod category;
pub mod category_target;
pub mod transaction;

// Re-export specific types to avoid conflicts
pub use account::{AccountType, Column as AccountColumn, Entity as Account, Model as AccountModel};
pub use budget_allocation::{
    Column as BudgetAllocationColumn, Entity as BudgetAllocation, Model as BudgetAllocationModel,
};
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use category_target::{
    Column as CategoryTargetColumn, Entity as CategoryTarget, Model as CategoryTargetModel,
    TargetType,
};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
    TransactionKind,
};
