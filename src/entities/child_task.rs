//! Task instance entity - A task scheduled for one child on one due date.
//!
//! `(child_id, task_id, due_date)` is unique; the store enforces it with the
//! `idx_child_tasks_slot` index created alongside the tables.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Task instance database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "child_tasks")]
pub struct Model {
    /// Unique identifier for the instance
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Child the task is scheduled for
    pub child_id: i64,
    /// Task template being scheduled
    pub task_id: i64,
    /// Day the task is due
    pub due_date: Date,
    /// Completion flag, flipped by the completion toggle
    pub is_completed: bool,
    /// Set when the instance last moved to completed, cleared when un-completed
    pub completed_at: Option<DateTimeUtc>,
}

/// Defines relationships between task instances and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each instance belongs to one child
    #[sea_orm(
        belongs_to = "super::child::Entity",
        from = "Column::ChildId",
        to = "super::child::Column::Id"
    )]
    Child,
    /// Each instance is bound to one task template
    #[sea_orm(
        belongs_to = "super::task::Entity",
        from = "Column::TaskId",
        to = "super::task::Column::Id"
    )]
    Task,
}

impl Related<super::child::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Child.def()
    }
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Task.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
