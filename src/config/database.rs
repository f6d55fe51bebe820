//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs. Indexes the entities cannot express (the `(month, category_id)`
//! uniqueness of allocations and the per-category target lookup) are created
//! alongside them.

use crate::entities::{
    Account, BudgetAllocation, BudgetAllocationColumn, Category, CategoryTarget,
    CategoryTargetColumn, Transaction, TransactionColumn,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::{debug, info, instrument};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/envelope_ledger.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable,
/// falling back to a local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// File path of an on-disk `SQLite` URL; `None` for in-memory or other databases.
fn sqlite_file_path(database_url: &str) -> Option<&Path> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path.contains(":memory:") || path == "memory" {
        return None;
    }
    Some(Path::new(path))
}

/// Establishes a connection to the database at `database_url`.
///
/// For an on-disk `SQLite` database the parent directory is created first.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(parent) = sqlite_file_path(database_url)
        .and_then(Path::parent)
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent)?;
    }

    debug!("Connecting to database");
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all tables and indexes if they do not already exist.
///
/// Tables are created parents first so foreign keys always point at an
/// existing table.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut tables = [
        schema.create_table_from_entity(Account),
        schema.create_table_from_entity(Category),
        schema.create_table_from_entity(Transaction),
        schema.create_table_from_entity(BudgetAllocation),
        schema.create_table_from_entity(CategoryTarget),
    ];
    for table in &mut tables {
        db.execute(builder.build(table.if_not_exists())).await?;
    }

    let indexes = [
        Index::create()
            .name("idx_budget_allocations_month_category")
            .table(BudgetAllocation)
            .col(BudgetAllocationColumn::Month)
            .col(BudgetAllocationColumn::CategoryId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_category_targets_category")
            .table(CategoryTarget)
            .col(CategoryTargetColumn::CategoryId)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_transactions_date")
            .table(Transaction)
            .col(TransactionColumn::Date)
            .if_not_exists()
            .to_owned(),
    ];
    for index in &indexes {
        db.execute(builder.build(index)).await?;
    }

    info!("Database schema ready");
    Ok(())
}
