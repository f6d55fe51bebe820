use chrono::Utc;
use dotenvy::dotenv;
use envelope_ledger::{
    config::{self, database},
    core::{budget, category, month::Month, report},
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Load .env file (as early as possible)
    dotenv().ok(); // Make it non-fatal, env vars can be set externally

    // 2. Load the main application configuration
    let app_config = config::load_app_configuration()?;

    // 3. Initialize tracing; RUST_LOG wins over the configured filter
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&app_config.log_filter)),
        )
        .init();
    info!("Successfully processed application configuration.");

    // 4. Initialize database
    let db = database::create_connection(&app_config.resolved_database_url())
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Seed initial categories (if necessary)
    category::seed_initial_categories(&db, &app_config)
        .await
        .inspect_err(|e| error!("Failed to seed initial categories: {}", e))?;

    // 6. Print the budget for the requested month, defaulting to this one
    let month = match std::env::args().nth(1) {
        Some(arg) => Month::parse(&arg)?,
        None => Month::from_date(Utc::now().date_naive()),
    };
    let view = budget::get_budget(&db, &month.to_string()).await?;
    print!("{}", report::format_budget_summary(&view));

    Ok(())
}
