//! Category business logic - Handles the category registry.
//!
//! Categories are the envelopes money is assigned to. They can be renamed and
//! recoloured freely but only deleted once no transaction, allocation or target
//! points at them.

use crate::{
    config::AppConfig,
    entities::{
        BudgetAllocation, Category, CategoryTarget, Transaction, budget_allocation, category,
        category_target, transaction,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, info, instrument, warn};

/// Fields to change on a category; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub colour: Option<String>,
}

/// Checks a `#RRGGBB` display colour.
pub fn validate_colour(colour: &str) -> Result<()> {
    let valid = colour.len() == 7
        && colour.starts_with('#')
        && colour[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidColour {
            value: colour.to_string(),
        })
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            message: "Category name cannot be empty".to_string(),
        });
    }
    Ok(name.to_string())
}

/// Retrieves every category ordered alphabetically by name.
pub async fn list_categories<C>(db: &C) -> Result<Vec<category::Model>>
where
    C: ConnectionTrait,
{
    Category::find()
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a category by its ID, returning None if it does not exist.
pub async fn get_category_by_id(
    db: &DatabaseConnection,
    category_id: i64,
) -> Result<Option<category::Model>> {
    Category::find_by_id(category_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a category by its exact name.
pub async fn get_category_by_name<C>(db: &C, name: &str) -> Result<Option<category::Model>>
where
    C: ConnectionTrait,
{
    Category::find()
        .filter(category::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a category after trimming the name and checking the colour.
pub async fn create_category<C>(db: &C, name: &str, colour: &str) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    let name = validate_name(name)?;
    validate_colour(colour)?;

    let now = Utc::now().naive_utc();
    let category = category::ActiveModel {
        name: Set(name),
        colour: Set(colour.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = category.insert(db).await?;
    debug!(category_id = result.id, "Created category");
    Ok(result)
}

/// Applies `patch` field by field, validating each present field.
pub async fn update_category(
    db: &DatabaseConnection,
    category_id: i64,
    patch: CategoryPatch,
) -> Result<category::Model> {
    let name = patch.name.as_deref().map(validate_name).transpose()?;
    if let Some(colour) = &patch.colour {
        validate_colour(colour)?;
    }

    let existing = Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?;

    let mut category: category::ActiveModel = existing.into();
    if let Some(name) = name {
        category.name = Set(name);
    }
    if let Some(colour) = patch.colour {
        category.colour = Set(colour);
    }
    category.updated_at = Set(Utc::now().naive_utc());

    category.update(db).await.map_err(Into::into)
}

/// Deletes a category nothing refers to any more.
///
/// # Returns
/// `CategoryInUse` while a transaction, allocation or target still references it.
#[instrument(skip(db))]
pub async fn delete_category(db: &DatabaseConnection, category_id: i64) -> Result<()> {
    Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?;

    let transactions = Transaction::find()
        .filter(transaction::Column::CategoryId.eq(category_id))
        .count(db)
        .await?;
    let allocations = BudgetAllocation::find()
        .filter(budget_allocation::Column::CategoryId.eq(category_id))
        .count(db)
        .await?;
    let targets = CategoryTarget::find()
        .filter(category_target::Column::CategoryId.eq(category_id))
        .count(db)
        .await?;

    if transactions + allocations + targets > 0 {
        warn!(transactions, allocations, targets, "Refusing to delete category in use");
        return Err(Error::CategoryInUse { id: category_id });
    }

    Category::delete_by_id(category_id).exec(db).await?;
    info!("Deleted category");
    Ok(())
}

/// Creates the categories listed in the configuration that do not exist yet.
///
/// Existing categories are left untouched, so running this on every start is safe.
pub async fn seed_initial_categories(db: &DatabaseConnection, config: &AppConfig) -> Result<()> {
    info!(
        "Starting to seed initial categories. Found {} configurations from TOML.",
        config.categories.len()
    );

    for cfg_category in &config.categories {
        if get_category_by_name(db, cfg_category.name.trim()).await?.is_some() {
            debug!("Category '{}' already exists. Skipping.", cfg_category.name);
            continue;
        }
        create_category(db, &cfg_category.name, &cfg_category.colour).await?;
        info!("Seeded category '{}'", cfg_category.name);
    }

    Ok(())
}
