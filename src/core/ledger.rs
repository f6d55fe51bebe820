//! Ledger aggregation.
//!
//! The budget view never loads raw transactions. Instead it asks the store for
//! a handful of grouped sums over the history up to the end of the requested
//! month. Each query here is a single `SELECT ... SUM(...) GROUP BY` and an
//! empty result is a valid zero, never an error.

use crate::{
    core::month::Month,
    entities::{
        BudgetAllocation, Transaction, TransactionKind, budget_allocation, transaction,
    },
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{QuerySelect, Select, prelude::*, sea_query::Expr};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Inclusive calendar date range. `start: None` means "since the beginning".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: NaiveDate,
}

impl DateRange {
    /// Every day of `month`.
    #[must_use]
    pub fn month(month: Month) -> Self {
        Self {
            start: Some(month.first_day()),
            end: month.last_day(),
        }
    }

    /// Everything up to and including the last day of `month`.
    #[must_use]
    pub fn through(month: Month) -> Self {
        Self {
            start: None,
            end: month.last_day(),
        }
    }
}

/// Which allocation months to include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthFilter {
    /// Only `month = M`
    Exactly(Month),
    /// Every `month <= M`
    Through(Month),
}

/// Sparse per-category sums read densely: absent categories are zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryAmounts(HashMap<i64, i64>);

impl CategoryAmounts {
    /// Amount for `category_id`, 0 when the category had no rows.
    #[must_use]
    pub fn get(&self, category_id: i64) -> i64 {
        self.0.get(&category_id).copied().unwrap_or(0)
    }

    /// Sum over every category present.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.0.values().sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(i64, i64)> for CategoryAmounts {
    fn from_iter<I: IntoIterator<Item = (i64, i64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Every aggregate the budget view needs for one month.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    pub month_income: i64,
    pub cumulative_income: i64,
    pub month_allocations: CategoryAmounts,
    pub cumulative_allocations: CategoryAmounts,
    pub month_activity: CategoryAmounts,
    pub cumulative_activity: CategoryAmounts,
    pub uncategorized_expenses: u64,
}

/// Runs every aggregate query for `month`.
#[instrument(skip(db))]
pub async fn aggregate<C>(db: &C, month: Month) -> Result<LedgerTotals>
where
    C: ConnectionTrait,
{
    let window = DateRange::month(month);
    let history = DateRange::through(month);

    let totals = LedgerTotals {
        month_income: sum_income(db, window).await?,
        cumulative_income: sum_income(db, history).await?,
        month_allocations: sum_allocations(db, MonthFilter::Exactly(month)).await?,
        cumulative_allocations: sum_allocations(db, MonthFilter::Through(month)).await?,
        month_activity: sum_expenses(db, window).await?,
        cumulative_activity: sum_expenses(db, history).await?,
        uncategorized_expenses: count_uncategorized_expenses(db, window).await?,
    };
    debug!(
        month_income = totals.month_income,
        cumulative_income = totals.cumulative_income,
        "Aggregated ledger"
    );
    Ok(totals)
}

fn in_range(select: Select<Transaction>, range: DateRange) -> Select<Transaction> {
    let select = select.filter(transaction::Column::Date.lte(range.end));
    match range.start {
        Some(start) => select.filter(transaction::Column::Date.gte(start)),
        None => select,
    }
}

/// Sum of income amounts dated within `range`.
pub async fn sum_income<C>(db: &C, range: DateRange) -> Result<i64>
where
    C: ConnectionTrait,
{
    let total: Option<Option<i64>> = in_range(Transaction::find(), range)
        .filter(transaction::Column::Kind.eq(TransactionKind::Income))
        .select_only()
        .column_as(Expr::col(transaction::Column::Amount).sum(), "total")
        .into_tuple()
        .one(db)
        .await?;

    Ok(total.flatten().unwrap_or(0))
}

/// Allocation totals per category for the months selected by `filter`.
pub async fn sum_allocations<C>(db: &C, filter: MonthFilter) -> Result<CategoryAmounts>
where
    C: ConnectionTrait,
{
    let select = match filter {
        MonthFilter::Exactly(month) => BudgetAllocation::find()
            .filter(budget_allocation::Column::Month.eq(month.to_string())),
        MonthFilter::Through(month) => BudgetAllocation::find()
            .filter(budget_allocation::Column::Month.lte(month.to_string())),
    };

    let rows: Vec<(i64, Option<i64>)> = select
        .select_only()
        .column(budget_allocation::Column::CategoryId)
        .column_as(Expr::col(budget_allocation::Column::Amount).sum(), "total")
        .group_by(budget_allocation::Column::CategoryId)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(category_id, total)| (category_id, total.unwrap_or(0)))
        .collect())
}

/// Categorised expense totals per category dated within `range`.
pub async fn sum_expenses<C>(db: &C, range: DateRange) -> Result<CategoryAmounts>
where
    C: ConnectionTrait,
{
    let rows: Vec<(Option<i64>, Option<i64>)> = in_range(Transaction::find(), range)
        .filter(transaction::Column::Kind.eq(TransactionKind::Expense))
        .filter(transaction::Column::CategoryId.is_not_null())
        .select_only()
        .column(transaction::Column::CategoryId)
        .column_as(Expr::col(transaction::Column::Amount).sum(), "total")
        .group_by(transaction::Column::CategoryId)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(category_id, total)| category_id.map(|id| (id, total.unwrap_or(0))))
        .collect())
}

/// Sum of expenses for one category dated in `[from, until)`.
pub async fn sum_category_expenses<C>(
    db: &C,
    category_id: i64,
    from: NaiveDate,
    until: NaiveDate,
) -> Result<i64>
where
    C: ConnectionTrait,
{
    let total: Option<Option<i64>> = Transaction::find()
        .filter(transaction::Column::Kind.eq(TransactionKind::Expense))
        .filter(transaction::Column::CategoryId.eq(category_id))
        .filter(transaction::Column::Date.gte(from))
        .filter(transaction::Column::Date.lt(until))
        .select_only()
        .column_as(Expr::col(transaction::Column::Amount).sum(), "total")
        .into_tuple()
        .one(db)
        .await?;

    Ok(total.flatten().unwrap_or(0))
}

/// Number of expenses without a category dated within `range`.
pub async fn count_uncategorized_expenses<C>(db: &C, range: DateRange) -> Result<u64>
where
    C: ConnectionTrait,
{
    in_range(Transaction::find(), range)
        .filter(transaction::Column::Kind.eq(TransactionKind::Expense))
        .filter(transaction::Column::CategoryId.is_null())
        .count(db)
        .await
        .map_err(Into::into)
}
