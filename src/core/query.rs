//! Parent-scoped lookups shared by the ledger components.
//!
//! Every catalog entity belongs to exactly one parent. A lookup for an entity
//! that exists but belongs to another parent is indistinguishable from a lookup
//! for one that does not exist: both yield the entity's `NotFound` error.
//! Soft-deleted templates are treated the same way.

use crate::{
    entities::{Child, Reward, Rule, Task, child, reward, rule, task},
    errors::{Error, Result},
};
use sea_orm::prelude::*;

/// Finds a child owned by `parent_id`.
pub async fn find_child<C>(db: &C, parent_id: &str, child_id: i64) -> Result<child::Model>
where
    C: ConnectionTrait,
{
    Child::find_by_id(child_id)
        .filter(child::Column::ParentId.eq(parent_id))
        .one(db)
        .await?
        .ok_or(Error::ChildNotFound { id: child_id })
}

/// Finds an active task template owned by `parent_id`.
pub async fn find_task<C>(db: &C, parent_id: &str, task_id: i64) -> Result<task::Model>
where
    C: ConnectionTrait,
{
    Task::find_by_id(task_id)
        .filter(task::Column::ParentId.eq(parent_id))
        .filter(task::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or(Error::TaskNotFound { id: task_id })
}

/// Finds an active rule owned by `parent_id`.
pub async fn find_rule<C>(db: &C, parent_id: &str, rule_id: i64) -> Result<rule::Model>
where
    C: ConnectionTrait,
{
    Rule::find_by_id(rule_id)
        .filter(rule::Column::ParentId.eq(parent_id))
        .filter(rule::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or(Error::RuleNotFound { id: rule_id })
}

/// Finds an active reward owned by `parent_id`.
pub async fn find_reward<C>(db: &C, parent_id: &str, reward_id: i64) -> Result<reward::Model>
where
    C: ConnectionTrait,
{
    Reward::find_by_id(reward_id)
        .filter(reward::Column::ParentId.eq(parent_id))
        .filter(reward::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or(Error::RewardNotFound { id: reward_id })
}
