//! Report generation business logic.
//!
//! Spending reports group the ledger by category or account, and a few
//! formatting helpers render amounts and budget views as plain text for the
//! command-line front end.

use crate::{
    core::{budget::BudgetView, ledger::DateRange},
    entities::{
        Account, AccountType, Category, Transaction, TransactionKind, account, category,
        transaction,
    },
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{QuerySelect, Select, prelude::*, sea_query::Expr};
use serde::Serialize;
use std::{collections::HashMap, fmt::Write as _};

/// Restricts which transactions a report covers. Every field is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportFilter {
    /// Inclusive lower bound
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound
    pub date_to: Option<NaiveDate>,
    pub kind: Option<TransactionKind>,
}

impl From<DateRange> for ReportFilter {
    fn from(range: DateRange) -> Self {
        Self {
            date_from: range.start,
            date_to: Some(range.end),
            kind: None,
        }
    }
}

/// Totals for one category; uncategorised transactions have no category fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryReport {
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub colour: Option<String>,
    pub total: i64,
    pub count: i64,
}

/// Totals for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountReport {
    pub account_id: i64,
    pub account_name: String,
    pub account_type: AccountType,
    pub total: i64,
    pub count: i64,
}

fn filtered(filter: &ReportFilter) -> Select<Transaction> {
    let mut query = Transaction::find();
    if let Some(date_from) = filter.date_from {
        query = query.filter(transaction::Column::Date.gte(date_from));
    }
    if let Some(date_to) = filter.date_to {
        query = query.filter(transaction::Column::Date.lte(date_to));
    }
    if let Some(kind) = filter.kind {
        query = query.filter(transaction::Column::Kind.eq(kind));
    }
    query
}

fn by_total(a: i64, b: i64) -> std::cmp::Ordering {
    b.cmp(&a)
}

/// Transaction totals grouped by category, largest first.
///
/// # Arguments
/// * `db` - Database connection
/// * `filter` - Date range and kind to include
pub async fn spending_by_category(
    db: &DatabaseConnection,
    filter: &ReportFilter,
) -> Result<Vec<CategoryReport>> {
    let rows: Vec<(Option<i64>, Option<i64>, i64)> = filtered(filter)
        .select_only()
        .column(transaction::Column::CategoryId)
        .column_as(Expr::col(transaction::Column::Amount).sum(), "total")
        .column_as(Expr::col(transaction::Column::Id).count(), "count")
        .group_by(transaction::Column::CategoryId)
        .into_tuple()
        .all(db)
        .await?;

    let categories: HashMap<i64, category::Model> = Category::find()
        .all(db)
        .await?
        .into_iter()
        .map(|category| (category.id, category))
        .collect();

    let mut reports: Vec<CategoryReport> = rows
        .into_iter()
        .map(|(category_id, total, count)| {
            let category = category_id.and_then(|id| categories.get(&id));
            CategoryReport {
                category_id,
                category_name: category.map(|c| c.name.clone()),
                colour: category.map(|c| c.colour.clone()),
                total: total.unwrap_or(0),
                count,
            }
        })
        .collect();
    reports.sort_by(|a, b| by_total(a.total, b.total).then(a.category_id.cmp(&b.category_id)));

    Ok(reports)
}

/// Transaction totals grouped by account, largest first.
pub async fn spending_by_account(
    db: &DatabaseConnection,
    filter: &ReportFilter,
) -> Result<Vec<AccountReport>> {
    let rows: Vec<(i64, Option<i64>, i64)> = filtered(filter)
        .select_only()
        .column(transaction::Column::AccountId)
        .column_as(Expr::col(transaction::Column::Amount).sum(), "total")
        .column_as(Expr::col(transaction::Column::Id).count(), "count")
        .group_by(transaction::Column::AccountId)
        .into_tuple()
        .all(db)
        .await?;

    let accounts: HashMap<i64, account::Model> = Account::find()
        .all(db)
        .await?
        .into_iter()
        .map(|account| (account.id, account))
        .collect();

    let mut reports: Vec<AccountReport> = rows
        .into_iter()
        .filter_map(|(account_id, total, count)| {
            accounts.get(&account_id).map(|account| AccountReport {
                account_id,
                account_name: account.name.clone(),
                account_type: account.account_type,
                total: total.unwrap_or(0),
                count,
            })
        })
        .collect();
    reports.sort_by(|a, b| by_total(a.total, b.total).then(a.account_id.cmp(&b.account_id)));

    Ok(reports)
}

/// Formats cents as dollars.
///
/// # Returns
/// Formatted string like "$50.00" or "-$25.50"
#[must_use]
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}

/// Renders a budget view as a plain-text table.
#[must_use]
pub fn format_budget_summary(view: &BudgetView) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Budget for {}", view.month);
    let _ = writeln!(out, "Income:           {}", format_cents(view.income));
    let _ = writeln!(out, "Assigned:         {}", format_cents(view.total_assigned));
    let _ = writeln!(out, "Ready to assign:  {}", format_cents(view.ready_to_assign));
    if view.total_underfunded > 0 {
        let _ = writeln!(out, "Underfunded:      {}", format_cents(view.total_underfunded));
    }
    if view.uncategorized_expenses > 0 {
        let _ = writeln!(
            out,
            "Uncategorized:    {} expense(s)",
            view.uncategorized_expenses
        );
    }

    if view.categories.is_empty() {
        out.push_str("\nNo categories yet.\n");
        return out;
    }

    let _ = writeln!(
        out,
        "\n{:<20} {:>12} {:>12} {:>12}",
        "Category", "Assigned", "Activity", "Available"
    );
    for row in &view.categories {
        let _ = write!(
            out,
            "{:<20} {:>12} {:>12} {:>12}",
            row.category_name,
            format_cents(row.assigned),
            format_cents(row.activity),
            format_cents(row.available)
        );
        if let Some(underfunded) = row.underfunded.filter(|amount| *amount > 0) {
            let _ = write!(out, "  needs {}", format_cents(underfunded));
        }
        out.push('\n');
    }

    out
}
