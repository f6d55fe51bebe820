//! Shared test utilities for the envelope ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        category,
        month::parse_date,
        transaction::{self, NewTransaction},
    },
    entities::{self, AccountType, TransactionKind},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a checking account with no starting balance.
pub async fn create_test_account(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::account::Model> {
    let now = Utc::now().naive_utc();
    entities::account::ActiveModel {
        name: Set(name.to_string()),
        account_type: Set(AccountType::Checking),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a test category with a fixed colour.
pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::category::Model> {
    category::create_category(db, name, "#4a90e2").await
}

/// Creates a transaction with custom parameters.
///
/// # Arguments
/// * `db` - Database connection
/// * `account_id` - Account the money moved through
/// * `category_id` - Optional category
/// * `amount` - Cents, non-negative
/// * `date` - `YYYY-MM-DD`
/// * `kind` - Income or expense
pub async fn create_test_transaction(
    db: &DatabaseConnection,
    account_id: i64,
    category_id: Option<i64>,
    amount: i64,
    date: &str,
    kind: TransactionKind,
) -> Result<entities::transaction::Model> {
    transaction::create_transaction(
        db,
        NewTransaction {
            account_id,
            category_id,
            amount,
            description: "Test transaction".to_string(),
            date: parse_date(date)?,
            kind,
        },
    )
    .await
}

/// Creates an uncategorised income transaction.
pub async fn create_test_income(
    db: &DatabaseConnection,
    account_id: i64,
    amount: i64,
    date: &str,
) -> Result<entities::transaction::Model> {
    create_test_transaction(db, account_id, None, amount, date, TransactionKind::Income).await
}

/// Creates an expense transaction.
pub async fn create_test_expense(
    db: &DatabaseConnection,
    account_id: i64,
    category_id: Option<i64>,
    amount: i64,
    date: &str,
) -> Result<entities::transaction::Model> {
    create_test_transaction(db, account_id, category_id, amount, date, TransactionKind::Expense)
        .await
}

/// Sets up a complete test environment with an account and a category.
/// Returns (db, account, category) for common test scenarios.
pub async fn setup_with_category() -> Result<(
    DatabaseConnection,
    entities::account::Model,
    entities::category::Model,
)> {
    let db = setup_test_db().await?;
    let account = create_test_account(&db, "Everyday").await?;
    let category = create_test_category(&db, "Groceries").await?;
    Ok((db, account, category))
}
