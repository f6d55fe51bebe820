//! Transaction business logic - Handles the income and expense ledger.
//!
//! Transactions are plain dated facts: a non-negative amount, a direction
//! (`kind`), one account and an optional category. Nothing is cached from them;
//! the budget view re-aggregates the ledger on every request, so creating,
//! editing or deleting a transaction needs no follow-up bookkeeping.

use crate::{
    entities::{Account, Category, Transaction, TransactionKind, transaction},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*, sea_query::Expr};
use tracing::{debug, info, instrument};

/// Upper bound on a single page of [`list_transactions`].
pub const MAX_PAGE_SIZE: u64 = 200;

/// A transaction to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub account_id: i64,
    pub category_id: Option<i64>,
    /// Cents, never negative
    pub amount: i64,
    pub description: String,
    pub date: NaiveDate,
    pub kind: TransactionKind,
}

/// Fields to change on a transaction; `None` leaves a field untouched.
///
/// `category_id: Some(None)` clears the category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionPatch {
    pub account_id: Option<i64>,
    pub category_id: Option<Option<i64>>,
    pub amount: Option<i64>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub kind: Option<TransactionKind>,
}

/// Category restriction for [`list_transactions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    Any,
    Uncategorized,
    Id(i64),
}

/// Query parameters for [`list_transactions`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub account_id: Option<i64>,
    pub category: CategoryFilter,
    /// Inclusive lower bound
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound
    pub date_to: Option<NaiveDate>,
    /// Substring of the description
    pub search: Option<String>,
    /// Page size, capped at [`MAX_PAGE_SIZE`]
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

fn validate_amount(amount: i64) -> Result<()> {
    if amount < 0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<String> {
    let description = description.trim();
    if description.is_empty() {
        return Err(Error::Validation {
            message: "Transaction description cannot be empty".to_string(),
        });
    }
    Ok(description.to_string())
}

async fn ensure_account<C>(db: &C, account_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    Account::find_by_id(account_id)
        .one(db)
        .await?
        .ok_or(Error::AccountNotFound { id: account_id })?;
    Ok(())
}

async fn ensure_category<C>(db: &C, category_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?;
    Ok(())
}

/// Records a transaction after checking its amount, description, account and category.
///
/// # Arguments
/// * `db` - Database connection or transaction
/// * `new` - The transaction to record
///
/// # Returns
/// The stored transaction
pub async fn create_transaction<C>(db: &C, new: NewTransaction) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    validate_amount(new.amount)?;
    let description = validate_description(&new.description)?;

    ensure_account(db, new.account_id).await?;
    if let Some(category_id) = new.category_id {
        ensure_category(db, category_id).await?;
    }

    let now = Utc::now().naive_utc();
    let transaction_model = transaction::ActiveModel {
        account_id: Set(new.account_id),
        category_id: Set(new.category_id),
        amount: Set(new.amount),
        description: Set(description),
        date: Set(new.date),
        kind: Set(new.kind),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = transaction_model.insert(db).await?;
    debug!(transaction_id = result.id, "Created transaction");
    Ok(result)
}

/// Retrieves a specific transaction by its unique ID.
pub async fn get_transaction_by_id(
    db: &DatabaseConnection,
    transaction_id: i64,
) -> Result<Option<transaction::Model>> {
    Transaction::find_by_id(transaction_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists transactions matching `filter`, newest first.
///
/// # Returns
/// The requested page and the total number of matches ignoring paging.
#[instrument(skip(db))]
pub async fn list_transactions(
    db: &DatabaseConnection,
    filter: &TransactionFilter,
) -> Result<(Vec<transaction::Model>, u64)> {
    let mut query = Transaction::find();

    if let Some(account_id) = filter.account_id {
        query = query.filter(transaction::Column::AccountId.eq(account_id));
    }
    query = match filter.category {
        CategoryFilter::Any => query,
        CategoryFilter::Uncategorized => query.filter(transaction::Column::CategoryId.is_null()),
        CategoryFilter::Id(category_id) => {
            query.filter(transaction::Column::CategoryId.eq(category_id))
        }
    };
    if let Some(date_from) = filter.date_from {
        query = query.filter(transaction::Column::Date.gte(date_from));
    }
    if let Some(date_to) = filter.date_to {
        query = query.filter(transaction::Column::Date.lte(date_to));
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        query = query.filter(transaction::Column::Description.contains(search));
    }

    let total = query.clone().count(db).await?;

    let mut page = query
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::Id);
    if let Some(limit) = filter.limit.filter(|limit| *limit > 0) {
        page = page.limit(limit.min(MAX_PAGE_SIZE));
    }
    if let Some(offset) = filter.offset.filter(|offset| *offset > 0) {
        page = page.offset(offset);
    }

    let transactions = page.all(db).await?;
    Ok((transactions, total))
}

/// Applies `patch` to a transaction, validating each present field.
#[instrument(skip(db))]
pub async fn update_transaction(
    db: &DatabaseConnection,
    transaction_id: i64,
    patch: TransactionPatch,
) -> Result<transaction::Model> {
    if let Some(amount) = patch.amount {
        validate_amount(amount)?;
    }
    let description = patch
        .description
        .as_deref()
        .map(validate_description)
        .transpose()?;

    let existing = Transaction::find_by_id(transaction_id)
        .one(db)
        .await?
        .ok_or(Error::TransactionNotFound { id: transaction_id })?;

    let mut transaction: transaction::ActiveModel = existing.into();
    if let Some(account_id) = patch.account_id {
        ensure_account(db, account_id).await?;
        transaction.account_id = Set(account_id);
    }
    if let Some(category_id) = patch.category_id {
        if let Some(id) = category_id {
            ensure_category(db, id).await?;
        }
        transaction.category_id = Set(category_id);
    }
    if let Some(amount) = patch.amount {
        transaction.amount = Set(amount);
    }
    if let Some(description) = description {
        transaction.description = Set(description);
    }
    if let Some(date) = patch.date {
        transaction.date = Set(date);
    }
    if let Some(kind) = patch.kind {
        transaction.kind = Set(kind);
    }
    transaction.updated_at = Set(Utc::now().naive_utc());

    transaction.update(db).await.map_err(Into::into)
}

/// Deletes a transaction.
#[instrument(skip(db))]
pub async fn delete_transaction(db: &DatabaseConnection, transaction_id: i64) -> Result<()> {
    let result = Transaction::delete_by_id(transaction_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::TransactionNotFound { id: transaction_id });
    }
    info!("Deleted transaction");
    Ok(())
}

/// Sets (or clears, with `None`) the category of every listed transaction.
///
/// # Returns
/// Number of transactions changed; unknown IDs are skipped.
#[instrument(skip(db))]
pub async fn bulk_update_category(
    db: &DatabaseConnection,
    transaction_ids: &[i64],
    category_id: Option<i64>,
) -> Result<u64> {
    if transaction_ids.is_empty() {
        return Ok(0);
    }
    if let Some(id) = category_id {
        ensure_category(db, id).await?;
    }

    let result = Transaction::update_many()
        .col_expr(transaction::Column::CategoryId, Expr::value(category_id))
        .col_expr(
            transaction::Column::UpdatedAt,
            Expr::value(Utc::now().naive_utc()),
        )
        .filter(transaction::Column::Id.is_in(transaction_ids.iter().copied()))
        .exec(db)
        .await?;

    info!(rows = result.rows_affected, "Recategorised transactions");
    Ok(result.rows_affected)
}
