//! Database configuration module for the points ledger.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs. The one constraint the entities cannot express, the composite
//! uniqueness of a task instance slot, is added as a separate index.

use crate::config::ledger::LedgerSettings;
use crate::entities::{
    Child, ChildTask, Reward, RewardRedemption, Rule, RuleViolation, Task, child_task,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/chore_ledger.sqlite?mode=rwc";

/// Name of the unique index guarding `(child_id, task_id, due_date)`.
pub const TASK_SLOT_INDEX: &str = "idx_child_tasks_slot";

/// Gets the database URL from the environment or returns the default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection pool sized and timed according to `settings`.
///
/// The pool's acquire timeout matches the ledger's store timeout so a starved
/// pool surfaces as a transient failure instead of hanging the request.
pub async fn create_connection(url: &str, settings: &LedgerSettings) -> Result<DatabaseConnection> {
    ensure_sqlite_dir(url)?;

    let mut options = ConnectOptions::new(url.to_owned());
    options
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.store_timeout)
        .sqlx_logging(false);

    info!("Connecting to ledger store at {}", url);
    Database::connect(options).await.map_err(Into::into)
}

/// Creates the directory holding a file-backed `SQLite` database.
fn ensure_sqlite_dir(url: &str) -> Result<()> {
    let Some(path) = url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Creates all ledger tables and the task slot index if they do not exist yet.
///
/// Parent tables are created before the tables that reference them so the
/// generated foreign keys resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Child).await?;
    create_table(db, &schema, Task).await?;
    create_table(db, &schema, Rule).await?;
    create_table(db, &schema, Reward).await?;
    create_table(db, &schema, ChildTask).await?;
    create_table(db, &schema, RuleViolation).await?;
    create_table(db, &schema, RewardRedemption).await?;

    let slot_index = Index::create()
        .name(TASK_SLOT_INDEX)
        .table(ChildTask)
        .col(child_task::Column::ChildId)
        .col(child_task::Column::TaskId)
        .col(child_task::Column::DueDate)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(db.get_database_backend().build(&slot_index))
        .await?;

    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(db.get_database_backend().build(&statement))
        .await?;
    debug!("Ensured table {}", entity.table_name());
    Ok(())
}
