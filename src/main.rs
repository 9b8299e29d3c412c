use chore_ledger::{
    config::{
        catalog::{catalog_path, load_catalog},
        database::{create_connection, create_tables, get_database_url},
        ledger::LedgerSettings,
    },
    core::{catalog, ledger::Ledger, tasks},
    errors::Result,
};
use chrono::Utc;
use dotenvy::dotenv;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Ledger settings
    let settings = LedgerSettings::from_env()
        .inspect_err(|e| error!("Invalid ledger settings: {}", e))?;
    info!(
        "Ledger settings: timeout {:?}, {} attempts, backoff {:?}",
        settings.store_timeout, settings.retry_attempts, settings.retry_backoff
    );

    // 4. Connect and create tables
    let db = create_connection(&get_database_url(), &settings)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the catalog if present
    let path = catalog_path();
    if !Path::new(&path).exists() {
        warn!("No catalog at {}. Nothing to seed.", path);
        return Ok(());
    }
    let config = load_catalog(&path)?;
    let summary = catalog::seed_catalog(&db, &config)
        .await
        .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;
    info!(
        "Seeded {} children, {} tasks, {} rules, {} rewards",
        summary.children, summary.tasks, summary.rules, summary.rewards
    );

    // 6. Schedule today's daily tasks and report balances
    let ledger = Ledger::new(db, settings.retry_policy());
    let date = Utc::now().date_naive();
    for child in catalog::list_children(ledger.connection(), &config.parent_id).await? {
        tasks::schedule_daily_tasks(ledger.connection(), &config.parent_id, child.id, date)
            .await?;
        let balance = ledger
            .get_child_balance(&config.parent_id, child.id)
            .await?;
        let today = ledger.todays_tasks(&config.parent_id, child.id).await?;
        info!(
            "{} (id {}): {} points, {} task(s) today",
            child.name,
            child.id,
            balance,
            today.len()
        );
    }

    Ok(())
}
