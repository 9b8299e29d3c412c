//! Task entity - A chore template defined by a parent.
//!
//! Templates carry the reward amount; scheduling a task for a child on a given
//! day creates a `child_task` row that references the template by id.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Task template database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    /// Unique identifier for the task
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Parent account that owns this task
    pub parent_id: String,
    /// Description shown to the child (e.g. "Make the bed")
    pub label: String,
    /// Points awarded when an instance is completed
    pub points_reward: i64,
    /// Whether the task is scheduled every day
    pub is_daily: bool,
    /// Soft delete flag - scheduled instances and history are preserved
    pub is_deleted: bool,
    /// When the task was created
    pub created_at: DateTime,
    /// When the task was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Task and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One task template has many scheduled instances
    #[sea_orm(has_many = "super::child_task::Entity")]
    ChildTasks,
}

impl Related<super::child_task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChildTasks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
