//! Catalog business logic - parent-owned children, tasks, rules, and rewards.
//!
//! These are plain create/update/delete operations with input validation. None
//! of them change a balance: children are created at zero points and profile
//! updates leave `points` alone. Tasks, rules, and rewards are soft deleted so
//! scheduled instances and history keep resolving; deleting a child removes its
//! ledger rows with it.

use crate::{
    config::catalog::CatalogConfig,
    core::query,
    entities::{
        Child, ChildTask, Reward, RewardRedemption, Rule, RuleViolation, Task, child, child_task,
        reward, reward_redemption, rule, rule_violation, task,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, warn};

/// Display attributes of a child.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildProfile {
    /// Display name, required
    pub name: String,
    /// Age in years
    pub age: Option<i32>,
    /// Avatar image URL
    pub avatar_url: Option<String>,
    /// Display color
    pub custom_color: Option<String>,
}

/// Counts of entries inserted by [`seed_catalog`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Children inserted
    pub children: usize,
    /// Tasks inserted
    pub tasks: usize,
    /// Rules inserted
    pub rules: usize,
    /// Rewards inserted
    pub rewards: usize,
}

fn validate_label(label: &str, what: &str) -> Result<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput {
            message: format!("{what} cannot be empty"),
        });
    }
    Ok(trimmed.to_string())
}

fn validate_points(amount: i64) -> Result<i64> {
    if amount <= 0 {
        return Err(Error::InvalidPoints { amount });
    }
    Ok(amount)
}

fn validate_profile(profile: ChildProfile) -> Result<ChildProfile> {
    if profile.age.is_some_and(|age| age < 0) {
        return Err(Error::InvalidInput {
            message: "Child age cannot be negative".to_string(),
        });
    }
    Ok(ChildProfile {
        name: validate_label(&profile.name, "Child name")?,
        ..profile
    })
}

// ---- children ----

/// Creates a child with a zero balance.
pub async fn create_child<C>(db: &C, parent_id: &str, profile: ChildProfile) -> Result<child::Model>
where
    C: ConnectionTrait,
{
    let profile = validate_profile(profile)?;

    let created = child::ActiveModel {
        parent_id: Set(parent_id.to_string()),
        name: Set(profile.name),
        age: Set(profile.age),
        avatar_url: Set(profile.avatar_url),
        custom_color: Set(profile.custom_color),
        points: Set(0),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(child_id = created.id, parent_id, "Created child");
    Ok(created)
}

/// Replaces a child's display attributes. The balance is untouched.
pub async fn update_child_profile<C>(
    db: &C,
    parent_id: &str,
    child_id: i64,
    profile: ChildProfile,
) -> Result<child::Model>
where
    C: ConnectionTrait,
{
    let profile = validate_profile(profile)?;
    let mut active: child::ActiveModel = query::find_child(db, parent_id, child_id).await?.into();

    active.name = Set(profile.name);
    active.age = Set(profile.age);
    active.avatar_url = Set(profile.avatar_url);
    active.custom_color = Set(profile.custom_color);

    active.update(db).await.map_err(Into::into)
}

/// Deletes a child together with its task instances, violations, and redemptions.
pub async fn delete_child<C>(db: &C, parent_id: &str, child_id: i64) -> Result<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;

    query::find_child(&txn, parent_id, child_id).await?;

    let instances = ChildTask::delete_many()
        .filter(child_task::Column::ChildId.eq(child_id))
        .exec(&txn)
        .await?;
    let violations = RuleViolation::delete_many()
        .filter(rule_violation::Column::ChildId.eq(child_id))
        .exec(&txn)
        .await?;
    let redemptions = RewardRedemption::delete_many()
        .filter(reward_redemption::Column::ChildId.eq(child_id))
        .exec(&txn)
        .await?;
    Child::delete_by_id(child_id).exec(&txn).await?;

    txn.commit().await?;

    info!(
        child_id,
        parent_id,
        instances = instances.rows_affected,
        violations = violations.rows_affected,
        redemptions = redemptions.rows_affected,
        "Deleted child"
    );
    Ok(())
}

/// Lists a parent's children ordered by name.
pub async fn list_children<C>(db: &C, parent_id: &str) -> Result<Vec<child::Model>>
where
    C: ConnectionTrait,
{
    Child::find()
        .filter(child::Column::ParentId.eq(parent_id))
        .order_by_asc(child::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

// ---- tasks ----

/// Creates a task template.
pub async fn create_task<C>(
    db: &C,
    parent_id: &str,
    label: String,
    points_reward: i64,
    is_daily: bool,
) -> Result<task::Model>
where
    C: ConnectionTrait,
{
    let label = validate_label(&label, "Task label")?;
    let points_reward = validate_points(points_reward)?;
    let now = chrono::Utc::now().naive_utc();

    task::ActiveModel {
        parent_id: Set(parent_id.to_string()),
        label: Set(label),
        points_reward: Set(points_reward),
        is_daily: Set(is_daily),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Updates a task template. Past awards are not affected.
pub async fn update_task<C>(
    db: &C,
    parent_id: &str,
    task_id: i64,
    label: String,
    points_reward: i64,
    is_daily: bool,
) -> Result<task::Model>
where
    C: ConnectionTrait,
{
    let label = validate_label(&label, "Task label")?;
    let points_reward = validate_points(points_reward)?;
    let mut active: task::ActiveModel = query::find_task(db, parent_id, task_id).await?.into();

    active.label = Set(label);
    active.points_reward = Set(points_reward);
    active.is_daily = Set(is_daily);
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    active.update(db).await.map_err(Into::into)
}

/// Soft deletes a task template.
pub async fn delete_task<C>(db: &C, parent_id: &str, task_id: i64) -> Result<task::Model>
where
    C: ConnectionTrait,
{
    let mut active: task::ActiveModel = query::find_task(db, parent_id, task_id).await?.into();
    active.is_deleted = Set(true);
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    active.update(db).await.map_err(Into::into)
}

/// Lists a parent's active task templates ordered by label.
pub async fn list_tasks<C>(db: &C, parent_id: &str) -> Result<Vec<task::Model>>
where
    C: ConnectionTrait,
{
    Task::find()
        .filter(task::Column::ParentId.eq(parent_id))
        .filter(task::Column::IsDeleted.eq(false))
        .order_by_asc(task::Column::Label)
        .all(db)
        .await
        .map_err(Into::into)
}

// ---- rules ----

/// Creates a rule.
pub async fn create_rule<C>(
    db: &C,
    parent_id: &str,
    label: String,
    points_penalty: i64,
) -> Result<rule::Model>
where
    C: ConnectionTrait,
{
    let label = validate_label(&label, "Rule label")?;
    let points_penalty = validate_points(points_penalty)?;
    let now = chrono::Utc::now().naive_utc();

    rule::ActiveModel {
        parent_id: Set(parent_id.to_string()),
        label: Set(label),
        points_penalty: Set(points_penalty),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Updates a rule. Recorded violations keep their original penalty.
pub async fn update_rule<C>(
    db: &C,
    parent_id: &str,
    rule_id: i64,
    label: String,
    points_penalty: i64,
) -> Result<rule::Model>
where
    C: ConnectionTrait,
{
    let label = validate_label(&label, "Rule label")?;
    let points_penalty = validate_points(points_penalty)?;
    let mut active: rule::ActiveModel = query::find_rule(db, parent_id, rule_id).await?.into();

    active.label = Set(label);
    active.points_penalty = Set(points_penalty);
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    active.update(db).await.map_err(Into::into)
}

/// Soft deletes a rule.
pub async fn delete_rule<C>(db: &C, parent_id: &str, rule_id: i64) -> Result<rule::Model>
where
    C: ConnectionTrait,
{
    let mut active: rule::ActiveModel = query::find_rule(db, parent_id, rule_id).await?.into();
    active.is_deleted = Set(true);
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    active.update(db).await.map_err(Into::into)
}

/// Lists a parent's active rules ordered by label.
pub async fn list_rules<C>(db: &C, parent_id: &str) -> Result<Vec<rule::Model>>
where
    C: ConnectionTrait,
{
    Rule::find()
        .filter(rule::Column::ParentId.eq(parent_id))
        .filter(rule::Column::IsDeleted.eq(false))
        .order_by_asc(rule::Column::Label)
        .all(db)
        .await
        .map_err(Into::into)
}

// ---- rewards ----

/// Creates a reward.
pub async fn create_reward<C>(
    db: &C,
    parent_id: &str,
    label: String,
    cost: i64,
) -> Result<reward::Model>
where
    C: ConnectionTrait,
{
    let label = validate_label(&label, "Reward label")?;
    let cost = validate_points(cost)?;
    let now = chrono::Utc::now().naive_utc();

    reward::ActiveModel {
        parent_id: Set(parent_id.to_string()),
        label: Set(label),
        cost: Set(cost),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Updates a reward. Past redemptions keep the price they paid.
pub async fn update_reward<C>(
    db: &C,
    parent_id: &str,
    reward_id: i64,
    label: String,
    cost: i64,
) -> Result<reward::Model>
where
    C: ConnectionTrait,
{
    let label = validate_label(&label, "Reward label")?;
    let cost = validate_points(cost)?;
    let mut active: reward::ActiveModel =
        query::find_reward(db, parent_id, reward_id).await?.into();

    active.label = Set(label);
    active.cost = Set(cost);
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    active.update(db).await.map_err(Into::into)
}

/// Soft deletes a reward.
pub async fn delete_reward<C>(db: &C, parent_id: &str, reward_id: i64) -> Result<reward::Model>
where
    C: ConnectionTrait,
{
    let mut active: reward::ActiveModel =
        query::find_reward(db, parent_id, reward_id).await?.into();
    active.is_deleted = Set(true);
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    active.update(db).await.map_err(Into::into)
}

/// Lists a parent's active rewards ordered by cost.
pub async fn list_rewards<C>(db: &C, parent_id: &str) -> Result<Vec<reward::Model>>
where
    C: ConnectionTrait,
{
    Reward::find()
        .filter(reward::Column::ParentId.eq(parent_id))
        .filter(reward::Column::IsDeleted.eq(false))
        .order_by_asc(reward::Column::Cost)
        .all(db)
        .await
        .map_err(Into::into)
}

// ---- seeding ----

/// Inserts the catalog entries whose name or label does not exist yet for the parent.
///
/// Runs in one transaction; an invalid entry aborts the whole seed.
pub async fn seed_catalog<C>(db: &C, config: &CatalogConfig) -> Result<SeedSummary>
where
    C: ConnectionTrait + TransactionTrait,
{
    let parent_id = config.parent_id.as_str();
    info!(
        "Seeding catalog for parent {}: {} children, {} tasks, {} rules, {} rewards in config",
        parent_id,
        config.children.len(),
        config.tasks.len(),
        config.rules.len(),
        config.rewards.len()
    );

    let txn = db.begin().await?;
    let mut summary = SeedSummary::default();

    let existing: Vec<String> = list_children(&txn, parent_id)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    for seed in &config.children {
        if existing.iter().any(|name| name == seed.name.trim()) {
            warn!("Child '{}' already exists. Skipping.", seed.name);
            continue;
        }
        let profile = ChildProfile {
            name: seed.name.clone(),
            age: seed.age,
            avatar_url: seed.avatar_url.clone(),
            custom_color: seed.custom_color.clone(),
        };
        create_child(&txn, parent_id, profile).await?;
        summary.children += 1;
    }

    let existing: Vec<String> = list_tasks(&txn, parent_id)
        .await?
        .into_iter()
        .map(|t| t.label)
        .collect();
    for seed in &config.tasks {
        if existing.iter().any(|label| label == seed.label.trim()) {
            debug!("Task '{}' already exists. Skipping.", seed.label);
            continue;
        }
        create_task(
            &txn,
            parent_id,
            seed.label.clone(),
            seed.points_reward,
            seed.is_daily,
        )
        .await?;
        summary.tasks += 1;
    }

    let existing: Vec<String> = list_rules(&txn, parent_id)
        .await?
        .into_iter()
        .map(|r| r.label)
        .collect();
    for seed in &config.rules {
        if existing.iter().any(|label| label == seed.label.trim()) {
            debug!("Rule '{}' already exists. Skipping.", seed.label);
            continue;
        }
        create_rule(&txn, parent_id, seed.label.clone(), seed.points_penalty).await?;
        summary.rules += 1;
    }

    let existing: Vec<String> = list_rewards(&txn, parent_id)
        .await?
        .into_iter()
        .map(|r| r.label)
        .collect();
    for seed in &config.rewards {
        if existing.iter().any(|label| label == seed.label.trim()) {
            debug!("Reward '{}' already exists. Skipping.", seed.label);
            continue;
        }
        create_reward(&txn, parent_id, seed.label.clone(), seed.cost).await?;
        summary.rewards += 1;
    }

    txn.commit().await?;

    info!("Catalog seeding finished: {:?}", summary);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::catalog::parse_catalog;
    use crate::core::{balance, redemptions, tasks, violations};
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase, PaginatorTrait};

    #[tokio::test]
    async fn test_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_task(&db, TEST_PARENT, "   ".to_string(), 5, true).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let result = create_task(&db, TEST_PARENT, "Dishes".to_string(), 0, true).await;
        assert!(matches!(result, Err(Error::InvalidPoints { amount: 0 })));

        let result = create_rule(&db, TEST_PARENT, "Yelling".to_string(), -3).await;
        assert!(matches!(result, Err(Error::InvalidPoints { amount: -3 })));

        let result = create_reward(&db, TEST_PARENT, String::new(), 10).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let result = create_child(
            &db,
            TEST_PARENT,
            ChildProfile {
                name: "Ada".to_string(),
                age: Some(-1),
                ..ChildProfile::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_child_starts_at_zero() -> Result<()> {
        let db = setup_test_db().await?;
        let child = create_child(
            &db,
            TEST_PARENT,
            ChildProfile {
                name: "  Lea ".to_string(),
                age: Some(7),
                avatar_url: None,
                custom_color: Some("#ffcc00".to_string()),
            },
        )
        .await?;

        assert_eq!(child.name, "Lea");
        assert_eq!(child.points, 0);
        assert_eq!(child.parent_id, TEST_PARENT);
        assert_eq!(child.custom_color.as_deref(), Some("#ffcc00"));
        Ok(())
    }

    #[tokio::test]
    async fn test_profile_update_keeps_balance() -> Result<()> {
        let (db, child) = setup_with_child(75).await?;

        let updated = update_child_profile(
            &db,
            TEST_PARENT,
            child.id,
            ChildProfile {
                name: "Renamed".to_string(),
                age: Some(9),
                ..ChildProfile::default()
            },
        )
        .await?;

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.age, Some(9));
        assert_eq!(updated.points, 75);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_child_cascades() -> Result<()> {
        let (db, child, task, instance) = setup_with_scheduled_task(0, 50).await?;
        let rule = create_test_rule(&db, TEST_PARENT, "Bedtime", 5).await?;
        let reward = create_test_reward(&db, TEST_PARENT, "Sticker", 10).await?;

        tasks::toggle_completion(&db, TEST_PARENT, child.id, task.id, instance.due_date, None)
            .await?;
        violations::record_violation(&db, TEST_PARENT, child.id, rule.id).await?;
        redemptions::redeem(&db, TEST_PARENT, child.id, reward.id).await?;

        delete_child(&db, TEST_PARENT, child.id).await?;

        assert!(matches!(
            balance::get_balance(&db, child.id).await,
            Err(Error::ChildNotFound { .. })
        ));
        assert_eq!(ChildTask::find().count(&db).await?, 0);
        assert_eq!(RuleViolation::find().count(&db).await?, 0);
        assert_eq!(RewardRedemption::find().count(&db).await?, 0);
        // Templates are untouched
        assert_eq!(list_rules(&db, TEST_PARENT).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_child_out_of_scope() -> Result<()> {
        let (db, child) = setup_with_child(10).await?;

        let result = delete_child(&db, "other-parent", child.id).await;
        assert!(matches!(result, Err(Error::ChildNotFound { .. })));
        assert_eq!(balance::get_balance(&db, child.id).await?, 10);
        Ok(())
    }

    #[tokio::test]
    async fn test_soft_delete_and_listing() -> Result<()> {
        let db = setup_test_db().await?;
        let cheap = create_test_reward(&db, TEST_PARENT, "Sticker", 5).await?;
        let pricey = create_test_reward(&db, TEST_PARENT, "Cinema", 50).await?;
        create_test_reward(&db, "other-parent", "Theirs", 1).await?;

        let listed: Vec<i64> = list_rewards(&db, TEST_PARENT)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(listed, vec![cheap.id, pricey.id]);

        let deleted = delete_reward(&db, TEST_PARENT, cheap.id).await?;
        assert!(deleted.is_deleted);
        assert_eq!(list_rewards(&db, TEST_PARENT).await?.len(), 1);

        // Deleting twice reports not found
        let again = delete_reward(&db, TEST_PARENT, cheap.id).await;
        assert!(matches!(again, Err(Error::RewardNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_task() -> Result<()> {
        let db = setup_test_db().await?;
        let task = create_test_task(&db, TEST_PARENT, "Dishes", 5).await?;

        let updated =
            update_task(&db, TEST_PARENT, task.id, "Dry dishes".to_string(), 8, false).await?;
        assert_eq!(updated.label, "Dry dishes");
        assert_eq!(updated.points_reward, 8);
        assert!(!updated.is_daily);

        let foreign = update_task(&db, "other-parent", task.id, "x".to_string(), 1, true).await;
        assert!(matches!(foreign, Err(Error::TaskNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_catalog_skips_existing() -> Result<()> {
        let db = setup_test_db().await?;
        let config = parse_catalog(&format!(
            r#"
            parent_id = "{TEST_PARENT}"

            [[children]]
            name = "Lea"

            [[tasks]]
            label = "Make the bed"
            points_reward = 5

            [[rules]]
            label = "No yelling"
            points_penalty = 10

            [[rewards]]
            label = "Ice cream"
            cost = 40
            "#
        ))?;

        let first = seed_catalog(&db, &config).await?;
        assert_eq!(
            first,
            SeedSummary {
                children: 1,
                tasks: 1,
                rules: 1,
                rewards: 1
            }
        );

        let second = seed_catalog(&db, &config).await?;
        assert_eq!(second, SeedSummary::default());

        assert_eq!(list_children(&db, TEST_PARENT).await?.len(), 1);
        assert_eq!(list_tasks(&db, TEST_PARENT).await?.len(), 1);
        Ok(())
    }
}
