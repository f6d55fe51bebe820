//! Budget view builder and monthly allocation.
//!
//! A budget view is composed from the ledger aggregates of
//! [`crate::core::ledger`], the category list and the target versions active in
//! the month. The composition itself, [`build_budget_view`], is pure so the
//! envelope arithmetic can be tested without a database.

use crate::{
    core::{
        category::list_categories,
        funding::{TargetSpec, underfunded},
        ledger::{LedgerTotals, aggregate, sum_category_expenses},
        month::Month,
        target::list_active_targets,
    },
    entities::{
        BudgetAllocation, Category, TargetType, budget_allocation, category, category_target,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*, sea_query::OnConflict};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, instrument};

/// Months averaged by [`get_category_average`].
const AVERAGE_WINDOW: u32 = 3;

/// One category row of a budget view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetCategoryRow {
    pub category_id: i64,
    pub category_name: String,
    pub colour: String,
    /// Allocated in this month only
    pub assigned: i64,
    /// Categorised expenses in this month
    pub activity: i64,
    /// Rollover balance: everything assigned so far minus everything spent
    pub available: i64,
    pub target_type: Option<TargetType>,
    pub target_amount: Option<i64>,
    pub target_date: Option<Month>,
    pub underfunded: Option<i64>,
}

/// The complete budget snapshot for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetView {
    pub month: Month,
    /// Income dated within the month
    pub income: i64,
    pub total_assigned: i64,
    /// Cumulative income minus cumulative allocations, never reset per month
    pub ready_to_assign: i64,
    pub total_underfunded: i64,
    pub uncategorized_expenses: u64,
    pub categories: Vec<BudgetCategoryRow>,
}

/// Composes a budget view from already-fetched facts.
///
/// # Arguments
/// * `month` - Month the view describes
/// * `categories` - Categories in display order
/// * `totals` - Ledger aggregates for `month`
/// * `targets` - Target versions active in `month`
pub fn build_budget_view(
    month: Month,
    categories: &[category::Model],
    totals: &LedgerTotals,
    targets: &[category_target::Model],
) -> Result<BudgetView> {
    let targets = targets
        .iter()
        .map(|target| TargetSpec::from_model(target).map(|spec| (target.category_id, spec)))
        .collect::<Result<HashMap<_, _>>>()?;

    let mut total_underfunded = 0;
    let rows = categories
        .iter()
        .map(|category| {
            let assigned = totals.month_allocations.get(category.id);
            let activity = totals.month_activity.get(category.id);
            let available = totals.cumulative_allocations.get(category.id)
                - totals.cumulative_activity.get(category.id);

            let target = targets.get(&category.id);
            let needed = target.map(|spec| underfunded(spec, assigned, available, month));
            total_underfunded += needed.unwrap_or(0);

            BudgetCategoryRow {
                category_id: category.id,
                category_name: category.name.clone(),
                colour: category.colour.clone(),
                assigned,
                activity,
                available,
                target_type: target.map(|spec| spec.target_type),
                target_amount: target.map(|spec| spec.target_amount),
                target_date: target.and_then(|spec| spec.target_date),
                underfunded: needed,
            }
        })
        .collect::<Vec<_>>();

    Ok(BudgetView {
        month,
        income: totals.month_income,
        total_assigned: rows.iter().map(|row| row.assigned).sum(),
        ready_to_assign: totals.cumulative_income - totals.cumulative_allocations.total(),
        total_underfunded,
        uncategorized_expenses: totals.uncategorized_expenses,
        categories: rows,
    })
}

/// Builds the budget view for `month` (`YYYY-MM`).
#[instrument(skip(db))]
pub async fn get_budget(db: &DatabaseConnection, month: &str) -> Result<BudgetView> {
    let month = Month::parse(month)?;

    let totals = aggregate(db, month).await?;
    let categories = list_categories(db).await?;
    let targets = list_active_targets(db, month).await?;

    build_budget_view(month, &categories, &totals, &targets)
}

/// Assigns `amount` to `category_id` in `month`, replacing any earlier
/// assignment for the same pair.
#[instrument(skip(db))]
pub async fn allocate_budget(
    db: &DatabaseConnection,
    month: &str,
    category_id: i64,
    amount: i64,
) -> Result<()> {
    let month = Month::parse(month)?;
    if amount < 0 {
        return Err(Error::InvalidAmount { amount });
    }

    Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?;

    let now = Utc::now().naive_utc();
    let allocation = budget_allocation::ActiveModel {
        month: Set(month.to_string()),
        category_id: Set(category_id),
        amount: Set(amount),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    BudgetAllocation::insert(allocation)
        .on_conflict(
            OnConflict::columns([
                budget_allocation::Column::Month,
                budget_allocation::Column::CategoryId,
            ])
            .update_columns([
                budget_allocation::Column::Amount,
                budget_allocation::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    info!("Allocated budget");
    Ok(())
}

/// Average monthly spending of `category_id` over the three full months
/// before `month`, rounded half away from zero.
///
/// Always divides by three, even when some of those months had no spending.
#[instrument(skip(db))]
pub async fn get_category_average(
    db: &DatabaseConnection,
    category_id: i64,
    month: &str,
) -> Result<i64> {
    let month = Month::parse(month)?;
    let from = month.minus(AVERAGE_WINDOW).first_day();
    let until = month.first_day();

    let total = sum_category_expenses(db, category_id, from, until).await?;
    Ok(div_round(total, i64::from(AVERAGE_WINDOW)))
}

/// Integer division rounding half away from zero. `divisor` must be positive.
const fn div_round(dividend: i64, divisor: i64) -> i64 {
    if dividend >= 0 {
        (2 * dividend + divisor) / (2 * divisor)
    } else {
        -((-2 * dividend + divisor) / (2 * divisor))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::target::set_category_target;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn month(value: &str) -> Month {
        Month::parse(value).unwrap()
    }

    fn row<'a>(view: &'a BudgetView, category_id: i64) -> &'a BudgetCategoryRow {
        view.categories
            .iter()
            .find(|row| row.category_id == category_id)
            .unwrap()
    }

    #[test]
    fn test_div_round() {
        assert_eq!(div_round(100, 3), 33);
        assert_eq!(div_round(200, 3), 67);
        assert_eq!(div_round(3, 2), 2);
        assert_eq!(div_round(-3, 2), -2);
        assert_eq!(div_round(0, 3), 0);
    }

    #[test]
    fn test_build_view_without_categories() {
        let totals = LedgerTotals {
            month_income: 5_000,
            cumulative_income: 8_000,
            ..LedgerTotals::default()
        };

        let view = build_budget_view(month("2024-01"), &[], &totals, &[]).unwrap();
        assert_eq!(view.income, 5_000);
        assert_eq!(view.ready_to_assign, 8_000);
        assert_eq!(view.total_assigned, 0);
        assert_eq!(view.total_underfunded, 0);
        assert!(view.categories.is_empty());
    }

    #[test]
    fn test_build_view_carries_negative_available() {
        let now = Utc::now().naive_utc();
        let category = category::Model {
            id: 7,
            name: "Dining".to_string(),
            colour: "#ff8800".to_string(),
            created_at: now,
            updated_at: now,
        };
        let totals = LedgerTotals {
            month_allocations: [(7, 1_000)].into_iter().collect(),
            cumulative_allocations: [(7, 1_000)].into_iter().collect(),
            month_activity: [(7, 4_000)].into_iter().collect(),
            cumulative_activity: [(7, 4_000)].into_iter().collect(),
            ..LedgerTotals::default()
        };

        let view = build_budget_view(month("2024-01"), &[category], &totals, &[]).unwrap();
        let dining = row(&view, 7);
        assert_eq!(dining.available, -3_000);
        assert_eq!(dining.underfunded, None);
        assert_eq!(view.ready_to_assign, -1_000);
    }

    #[test]
    fn test_row_without_target_serializes_nulls() {
        let now = Utc::now().naive_utc();
        let category = category::Model {
            id: 3,
            name: "Rent".to_string(),
            colour: "#336699".to_string(),
            created_at: now,
            updated_at: now,
        };

        let view =
            build_budget_view(month("2024-01"), &[category], &LedgerTotals::default(), &[])
                .unwrap();
        let json = serde_json::to_value(row(&view, 3)).unwrap();

        for key in ["target_type", "target_amount", "target_date", "underfunded"] {
            assert_eq!(json.get(key), Some(&serde_json::Value::Null), "{key}");
        }
        assert_eq!(json["available"], 0);
    }

    #[tokio::test]
    async fn test_rollover_carries_unspent_money() -> Result<()> {
        let (db, account, category) = setup_with_category().await?;
        create_test_income(&db, account.id, 50_000, "2024-01-01").await?;

        allocate_budget(&db, "2024-01", category.id, 10_000).await?;
        create_test_expense(&db, account.id, Some(category.id), 3_000, "2024-01-15").await?;
        allocate_budget(&db, "2024-02", category.id, 5_000).await?;
        create_test_expense(&db, account.id, Some(category.id), 2_000, "2024-02-15").await?;

        let jan = get_budget(&db, "2024-01").await?;
        assert_eq!(row(&jan, category.id).available, 7_000);

        let feb = get_budget(&db, "2024-02").await?;
        let feb_row = row(&feb, category.id);
        assert_eq!(feb_row.assigned, 5_000);
        assert_eq!(feb_row.activity, 2_000);
        assert_eq!(feb_row.available, 10_000);

        // available(M) = available(M-1) + assigned(M) - activity(M)
        let jan_row = row(&jan, category.id);
        assert_eq!(feb_row.available, jan_row.available + feb_row.assigned - feb_row.activity);

        Ok(())
    }

    #[tokio::test]
    async fn test_ready_to_assign_is_cumulative() -> Result<()> {
        let (db, account, food) = setup_with_category().await?;
        let rent = create_test_category(&db, "Rent").await?;

        create_test_income(&db, account.id, 100_000, "2024-01-05").await?;
        allocate_budget(&db, "2024-01", food.id, 20_000).await?;
        allocate_budget(&db, "2024-01", rent.id, 50_000).await?;
        create_test_income(&db, account.id, 40_000, "2024-02-05").await?;
        allocate_budget(&db, "2024-02", food.id, 25_000).await?;

        let jan = get_budget(&db, "2024-01").await?;
        assert_eq!(jan.income, 100_000);
        assert_eq!(jan.total_assigned, 70_000);
        assert_eq!(jan.ready_to_assign, 30_000);

        let feb = get_budget(&db, "2024-02").await?;
        assert_eq!(feb.income, 40_000);
        assert_eq!(feb.total_assigned, 25_000);
        assert_eq!(feb.ready_to_assign, 45_000);
        assert_eq!(
            feb.ready_to_assign,
            jan.ready_to_assign + feb.income - feb.total_assigned
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_categories_ordered_by_name() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_category(&db, "Utilities").await?;
        create_test_category(&db, "Groceries").await?;
        create_test_category(&db, "Rent").await?;

        let view = get_budget(&db, "2024-01").await?;
        let names: Vec<_> = view
            .categories
            .iter()
            .map(|row| row.category_name.as_str())
            .collect();
        assert_eq!(names, ["Groceries", "Rent", "Utilities"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_uncategorized_expenses_counted_per_month() -> Result<()> {
        let (db, account, _) = setup_with_category().await?;
        create_test_expense(&db, account.id, None, 100, "2024-01-03").await?;
        create_test_expense(&db, account.id, None, 200, "2024-01-04").await?;
        create_test_expense(&db, account.id, None, 300, "2024-02-04").await?;

        assert_eq!(get_budget(&db, "2024-01").await?.uncategorized_expenses, 2);
        assert_eq!(get_budget(&db, "2024-02").await?.uncategorized_expenses, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_allocation_upsert_keeps_one_row() -> Result<()> {
        let (db, _, category) = setup_with_category().await?;

        allocate_budget(&db, "2024-01", category.id, 10_000).await?;
        allocate_budget(&db, "2024-01", category.id, 15_000).await?;

        let rows = BudgetAllocation::find()
            .filter(budget_allocation::Column::CategoryId.eq(category.id))
            .all(&db)
            .await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, 15_000);
        assert_eq!(rows[0].month, "2024-01");

        Ok(())
    }

    #[tokio::test]
    async fn test_allocate_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let negative = allocate_budget(&db, "2024-01", 1, -1).await;
        assert!(matches!(negative, Err(Error::InvalidAmount { amount: -1 })));

        let malformed = allocate_budget(&db, "January", 1, 100).await;
        assert!(matches!(malformed, Err(Error::InvalidMonth { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_allocate_missing_category() -> Result<()> {
        let db = setup_test_db().await?;

        let result = allocate_budget(&db, "2024-01", 42, 100).await;
        assert!(matches!(result, Err(Error::CategoryNotFound { id: 42 })));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_budget_rejects_malformed_month() -> Result<()> {
        let db = setup_test_db().await?;

        let result = get_budget(&db, "2024-13").await;
        assert!(matches!(result, Err(Error::InvalidMonth { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_category_average_rounds_and_keeps_divisor() -> Result<()> {
        let (db, account, category) = setup_with_category().await?;

        create_test_expense(&db, account.id, Some(category.id), 40, "2024-01-10").await?;
        create_test_expense(&db, account.id, Some(category.id), 30, "2024-02-10").await?;
        create_test_expense(&db, account.id, Some(category.id), 30, "2024-03-10").await?;
        // the requested month itself is excluded
        create_test_expense(&db, account.id, Some(category.id), 9_999, "2024-04-01").await?;

        assert_eq!(get_category_average(&db, category.id, "2024-04").await?, 33);

        create_test_expense(&db, account.id, Some(category.id), 100, "2024-03-20").await?;
        assert_eq!(get_category_average(&db, category.id, "2024-04").await?, 67);

        // only one of the three months has data, still divided by three
        assert_eq!(get_category_average(&db, category.id, "2024-02").await?, 13);

        Ok(())
    }

    #[tokio::test]
    async fn test_budget_shows_target_version_for_each_month() -> Result<()> {
        let (db, account, category) = setup_with_category().await?;
        create_test_income(&db, account.id, 100_000, "2024-01-01").await?;

        let monthly = TargetSpec::new(TargetType::MonthlySavings, 10_000, None)?;
        set_category_target(&db, category.id, "2024-01", monthly).await?;
        let balance = TargetSpec::parse(TargetType::SavingsBalance, 120_000, Some("2024-06"))?;
        set_category_target(&db, category.id, "2024-03", balance).await?;

        allocate_budget(&db, "2024-01", category.id, 6_000).await?;
        let jan = get_budget(&db, "2024-01").await?;
        let jan_row = row(&jan, category.id);
        assert_eq!(jan_row.target_type, Some(TargetType::MonthlySavings));
        assert_eq!(jan_row.underfunded, Some(4_000));
        assert_eq!(jan.total_underfunded, 4_000);

        allocate_budget(&db, "2024-03", category.id, 14_000).await?;
        let mar = get_budget(&db, "2024-03").await?;
        let mar_row = row(&mar, category.id);
        assert_eq!(mar_row.target_type, Some(TargetType::SavingsBalance));
        assert_eq!(mar_row.target_date, Some(month("2024-06")));
        // available 20000, shortfall 100000 over 3 months -> 33334, minus 14000 assigned
        assert_eq!(mar_row.available, 20_000);
        assert_eq!(mar_row.underfunded, Some(19_334));

        Ok(())
    }
}
