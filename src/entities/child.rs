//! Child entity - A child account that earns and spends points.
//!
//! The `points` column is the ledger balance. It is only ever written by
//! `core::balance`; catalog operations touch the display attributes only.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Child database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "children")]
pub struct Model {
    /// Unique identifier for the child
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Parent account that owns this child
    pub parent_id: String,
    /// Display name
    pub name: String,
    /// Optional age in years
    pub age: Option<i32>,
    /// Optional avatar image URL
    pub avatar_url: Option<String>,
    /// Optional display color (e.g. `"#ffcc00"`)
    pub custom_color: Option<String>,
    /// Current point balance, never negative
    pub points: i64,
    /// When the child was created
    pub created_at: DateTime,
}

/// Defines relationships between Child and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One child has many scheduled task instances
    #[sea_orm(has_many = "super::child_task::Entity")]
    ChildTasks,
    /// One child has many rule violations
    #[sea_orm(has_many = "super::rule_violation::Entity")]
    RuleViolations,
    /// One child has many reward redemptions
    #[sea_orm(has_many = "super::reward_redemption::Entity")]
    RewardRedemptions,
}

impl Related<super::child_task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChildTasks.def()
    }
}

impl Related<super::rule_violation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RuleViolations.def()
    }
}

impl Related<super::reward_redemption::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RewardRedemptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
