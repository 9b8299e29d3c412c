//! Shared test utilities for the points ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        balance,
        catalog::{self, ChildProfile},
        query, tasks,
    },
    entities::{child, child_task, reward, rule, task},
    errors::Result,
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::path::PathBuf;

/// Parent account that owns every entity created by these helpers.
pub const TEST_PARENT: &str = "test-parent";

/// Creates an in-memory `SQLite` database with all tables initialized.
///
/// The pool is capped at one connection; every pooled connection to
/// `sqlite::memory:` would otherwise open its own empty database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a file-backed `SQLite` database with all tables initialized.
///
/// Uses a rollback journal, so a reader on another connection holds up commits.
/// Returns the connection, its URL (for opening more connections), and the file
/// path for [`remove_file_db`].
pub async fn setup_file_db(name: &str) -> Result<(DatabaseConnection, String, PathBuf)> {
    let path = std::env::temp_dir().join(format!(
        "chore-ledger-{name}-{}.sqlite",
        std::process::id()
    ));
    remove_file_db(&path);
    let url = format!("sqlite://{}?mode=rwc", path.display());

    let mut options = ConnectOptions::new(url.clone());
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;
    db.execute_unprepared("PRAGMA journal_mode=DELETE").await?;
    crate::config::database::create_tables(&db).await?;
    Ok((db, url, path))
}

/// Removes a database file created by [`setup_file_db`] and its journal.
pub fn remove_file_db(path: &std::path::Path) {
    let _ = std::fs::remove_file(path);
    let _ = std::fs::remove_file(path.with_extension("sqlite-journal"));
}

/// Creates a test child with only a name and a zero balance.
pub async fn create_test_child(
    db: &DatabaseConnection,
    parent_id: &str,
    name: &str,
) -> Result<child::Model> {
    let profile = ChildProfile {
        name: name.to_string(),
        ..Default::default()
    };
    catalog::create_child(db, parent_id, profile).await
}

/// Creates a daily test task.
pub async fn create_test_task(
    db: &DatabaseConnection,
    parent_id: &str,
    label: &str,
    points_reward: i64,
) -> Result<task::Model> {
    catalog::create_task(db, parent_id, label.to_string(), points_reward, true).await
}

/// Creates a test rule.
pub async fn create_test_rule(
    db: &DatabaseConnection,
    parent_id: &str,
    label: &str,
    points_penalty: i64,
) -> Result<rule::Model> {
    catalog::create_rule(db, parent_id, label.to_string(), points_penalty).await
}

/// Creates a test reward.
pub async fn create_test_reward(
    db: &DatabaseConnection,
    parent_id: &str,
    label: &str,
    cost: i64,
) -> Result<reward::Model> {
    catalog::create_reward(db, parent_id, label.to_string(), cost).await
}

/// Sets up a test database with one child holding `points`.
///
/// The returned model reflects the stored balance.
pub async fn setup_with_child(points: i64) -> Result<(DatabaseConnection, child::Model)> {
    let db = setup_test_db().await?;
    let child = create_test_child(&db, TEST_PARENT, "Test Child").await?;
    if points != 0 {
        balance::apply_delta(&db, child.id, points).await?;
    }
    let child = query::find_child(&db, TEST_PARENT, child.id).await?;
    Ok((db, child))
}

/// Sets up a child holding `balance` with one daily task worth `reward`
/// scheduled on [`test_date`].
pub async fn setup_with_scheduled_task(
    balance: i64,
    reward: i64,
) -> Result<(
    DatabaseConnection,
    child::Model,
    task::Model,
    child_task::Model,
)> {
    let (db, child) = setup_with_child(balance).await?;
    let task = create_test_task(&db, TEST_PARENT, "Make the bed", reward).await?;
    let instance = tasks::schedule_task(&db, TEST_PARENT, child.id, task.id, test_date()).await?;
    Ok((db, child, task, instance))
}

/// Fixed due date used by scheduling tests.
#[allow(clippy::unwrap_used)]
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn test_timestamp() -> NaiveDateTime {
    test_date().and_hms_opt(8, 0, 0).unwrap_or_default()
}

/// Builds a child model without touching a database, for `MockDatabase` results.
pub fn test_child_model(id: i64, parent_id: &str, points: i64) -> child::Model {
    child::Model {
        id,
        parent_id: parent_id.to_string(),
        name: "Test Child".to_string(),
        age: None,
        avatar_url: None,
        custom_color: None,
        points,
        created_at: test_timestamp(),
    }
}

/// Builds a task model without touching a database, for `MockDatabase` results.
pub fn test_task_model(id: i64, parent_id: &str, points_reward: i64) -> task::Model {
    task::Model {
        id,
        parent_id: parent_id.to_string(),
        label: "Make the bed".to_string(),
        points_reward,
        is_daily: true,
        is_deleted: false,
        created_at: test_timestamp(),
        updated_at: test_timestamp(),
    }
}
