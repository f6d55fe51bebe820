//! Account business logic - Handles the account registry.
//!
//! An account can be opened with a starting balance, which is recorded as an
//! ordinary "Starting balance" transaction so it flows into income (or, for a
//! debt, spending) like everything else.

use crate::{
    core::transaction::{NewTransaction, create_transaction},
    entities::{Account, AccountType, Transaction, TransactionKind, account, transaction},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, instrument, warn};

const STARTING_BALANCE_DESCRIPTION: &str = "Starting balance";

/// An account to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub account_type: AccountType,
    /// Signed cents; negative for accounts that start in debt
    pub starting_balance: Option<i64>,
    /// Date of the starting balance transaction, today when absent
    pub opened_on: Option<NaiveDate>,
}

/// Fields to change on an account; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub account_type: Option<AccountType>,
}

/// An account together with whether any transaction references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    #[serde(flatten)]
    pub account: account::Model,
    pub has_transactions: bool,
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            message: "Account name cannot be empty".to_string(),
        });
    }
    Ok(name.to_string())
}

/// Opens an account, recording its starting balance in the same database transaction.
#[instrument(skip(db))]
pub async fn create_account(db: &DatabaseConnection, new: NewAccount) -> Result<account::Model> {
    let name = validate_name(&new.name)?;
    let starting_balance = new
        .starting_balance
        .filter(|balance| *balance != 0)
        .map(|balance| {
            let kind = if balance > 0 {
                TransactionKind::Income
            } else {
                TransactionKind::Expense
            };
            balance
                .checked_abs()
                .map(|amount| (amount, kind))
                .ok_or(Error::InvalidAmount { amount: balance })
        })
        .transpose()?;

    let txn = db.begin().await?;

    let now = Utc::now().naive_utc();
    let account = account::ActiveModel {
        name: Set(name),
        account_type: Set(new.account_type),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if let Some((amount, kind)) = starting_balance {
        create_transaction(
            &txn,
            NewTransaction {
                account_id: account.id,
                category_id: None,
                amount,
                description: STARTING_BALANCE_DESCRIPTION.to_string(),
                date: new.opened_on.unwrap_or_else(|| Utc::now().date_naive()),
                kind,
            },
        )
        .await?;
    }

    txn.commit().await?;

    info!(account_id = account.id, "Created account");
    Ok(account)
}

/// Lists accounts ordered by name, each flagged with whether it has transactions.
pub async fn list_accounts(db: &DatabaseConnection) -> Result<Vec<AccountSummary>> {
    let accounts = Account::find()
        .order_by_asc(account::Column::Name)
        .all(db)
        .await?;
    if accounts.is_empty() {
        return Ok(Vec::new());
    }

    let with_transactions: HashSet<i64> = Transaction::find()
        .select_only()
        .column(transaction::Column::AccountId)
        .distinct()
        .filter(transaction::Column::AccountId.is_in(accounts.iter().map(|a| a.id)))
        .into_tuple::<i64>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    Ok(accounts
        .into_iter()
        .map(|account| AccountSummary {
            has_transactions: with_transactions.contains(&account.id),
            account,
        })
        .collect())
}

/// Finds an account by its ID, returning None if it does not exist.
pub async fn get_account_by_id(
    db: &DatabaseConnection,
    account_id: i64,
) -> Result<Option<account::Model>> {
    Account::find_by_id(account_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Applies `patch` to an account, validating each present field.
pub async fn update_account(
    db: &DatabaseConnection,
    account_id: i64,
    patch: AccountPatch,
) -> Result<account::Model> {
    let name = patch.name.as_deref().map(validate_name).transpose()?;

    let existing = Account::find_by_id(account_id)
        .one(db)
        .await?
        .ok_or(Error::AccountNotFound { id: account_id })?;

    let mut account: account::ActiveModel = existing.into();
    if let Some(name) = name {
        account.name = Set(name);
    }
    if let Some(account_type) = patch.account_type {
        account.account_type = Set(account_type);
    }
    account.updated_at = Set(Utc::now().naive_utc());

    account.update(db).await.map_err(Into::into)
}

/// Deletes an account without transactions.
#[instrument(skip(db))]
pub async fn delete_account(db: &DatabaseConnection, account_id: i64) -> Result<()> {
    Account::find_by_id(account_id)
        .one(db)
        .await?
        .ok_or(Error::AccountNotFound { id: account_id })?;

    let transactions = Transaction::find()
        .filter(transaction::Column::AccountId.eq(account_id))
        .count(db)
        .await?;
    if transactions > 0 {
        warn!(transactions, "Refusing to delete account with transactions");
        return Err(Error::AccountInUse { id: account_id });
    }

    Account::delete_by_id(account_id).exec(db).await?;
    info!("Deleted account");
    Ok(())
}
