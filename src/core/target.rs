//! Category target lifecycle.
//!
//! Targets are versioned per category (see [`crate::core::timeline`]). Setting
//! or deleting a target at month `M` retires the version covering `M` and, for
//! a set, inserts a new version from `M`. Each mutation runs inside a single
//! database transaction so the chain is never observed half-edited.

use crate::{
    core::{
        funding::TargetSpec,
        month::Month,
        timeline::{ChainEdit, TargetTimeline, plan_edit},
    },
    entities::{Category, CategoryTarget, category_target},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

fn active_in(month: Month) -> Condition {
    let month = month.to_string();
    Condition::all()
        .add(category_target::Column::EffectiveFrom.lte(month.clone()))
        .add(
            Condition::any()
                .add(category_target::Column::EffectiveTo.is_null())
                .add(category_target::Column::EffectiveTo.gt(month)),
        )
}

/// The version of `category_id`'s target active in `month`.
pub async fn find_active_target<C>(
    db: &C,
    category_id: i64,
    month: Month,
) -> Result<Option<category_target::Model>>
where
    C: ConnectionTrait,
{
    CategoryTarget::find()
        .filter(category_target::Column::CategoryId.eq(category_id))
        .filter(active_in(month))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Every category's active target version in `month`.
pub async fn list_active_targets<C>(db: &C, month: Month) -> Result<Vec<category_target::Model>>
where
    C: ConnectionTrait,
{
    CategoryTarget::find()
        .filter(active_in(month))
        .all(db)
        .await
        .map_err(Into::into)
}

/// All versions of `category_id`'s target, oldest first.
pub async fn target_history<C>(db: &C, category_id: i64) -> Result<Vec<category_target::Model>>
where
    C: ConnectionTrait,
{
    CategoryTarget::find()
        .filter(category_target::Column::CategoryId.eq(category_id))
        .order_by_asc(category_target::Column::EffectiveFrom)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads `category_id`'s chain as a checked [`TargetTimeline`].
pub async fn load_timeline<C>(db: &C, category_id: i64) -> Result<TargetTimeline>
where
    C: ConnectionTrait,
{
    let history = target_history(db, category_id).await?;
    TargetTimeline::from_models(&history)
}

async fn next_version_start<C>(db: &C, category_id: i64, month: Month) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let next = CategoryTarget::find()
        .filter(category_target::Column::CategoryId.eq(category_id))
        .filter(category_target::Column::EffectiveFrom.gt(month.to_string()))
        .order_by_asc(category_target::Column::EffectiveFrom)
        .one(db)
        .await?;
    Ok(next.map(|version| version.effective_from))
}

/// Retires `version` for an edit at `month`.
async fn retire<C>(db: &C, version: category_target::Model, month: Month) -> Result<ChainEdit>
where
    C: ConnectionTrait,
{
    let edit = plan_edit(version.effective_from_month()?, month);
    match edit {
        ChainEdit::Remove => {
            CategoryTarget::delete_by_id(version.id).exec(db).await?;
        }
        ChainEdit::Close { at } => {
            let mut active_model: category_target::ActiveModel = version.into();
            active_model.effective_to = Set(Some(at.to_string()));
            active_model.updated_at = Set(Utc::now().naive_utc());
            active_model.update(db).await?;
        }
    }
    Ok(edit)
}

/// Makes `spec` the target of `category_id` from `month` on.
///
/// The version covering `month` is deleted when it also started in `month`
/// and closed at `month` otherwise. The new version stays open unless a later
/// version already exists, in which case it ends where that one begins.
#[instrument(skip(db))]
pub async fn set_category_target(
    db: &DatabaseConnection,
    category_id: i64,
    month: &str,
    spec: TargetSpec,
) -> Result<category_target::Model> {
    let month = Month::parse(month)?;

    let txn = db.begin().await?;

    Category::find_by_id(category_id)
        .one(&txn)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?;

    if let Some(active) = find_active_target(&txn, category_id, month).await? {
        let edit = retire(&txn, active, month).await?;
        info!(?edit, "Retired previous target version");
    }

    let effective_to = next_version_start(&txn, category_id, month).await?;
    let now = Utc::now().naive_utc();
    let version = category_target::ActiveModel {
        category_id: Set(category_id),
        target_type: Set(spec.target_type),
        target_amount: Set(spec.target_amount),
        target_date: Set(spec.target_date.map(|date| date.to_string())),
        effective_from: Set(month.to_string()),
        effective_to: Set(effective_to),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = version.insert(&txn).await?;

    txn.commit().await?;

    info!(target_id = created.id, "Set category target");
    Ok(created)
}

/// Ends the target of `category_id` active in `month`.
///
/// A version that started in `month` is deleted outright; an older one is
/// closed at `month` so earlier months keep showing it.
#[instrument(skip(db))]
pub async fn delete_category_target(
    db: &DatabaseConnection,
    category_id: i64,
    month: &str,
) -> Result<()> {
    let parsed = Month::parse(month)?;

    let txn = db.begin().await?;

    let active = find_active_target(&txn, category_id, parsed)
        .await?
        .ok_or_else(|| Error::TargetNotFound {
            category_id,
            month: month.to_string(),
        })?;
    let edit = retire(&txn, active, parsed).await?;

    txn.commit().await?;

    info!(?edit, "Deleted category target");
    Ok(())
}
