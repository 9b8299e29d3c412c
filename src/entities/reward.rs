//! Reward entity - Something a child can buy with points.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reward database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rewards")]
pub struct Model {
    /// Unique identifier for the reward
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Parent account that owns this reward
    pub parent_id: String,
    /// Description of the reward (e.g. "30 minutes of screen time")
    pub label: String,
    /// Points required to redeem
    pub cost: i64,
    /// Soft delete flag - redemption history is preserved
    pub is_deleted: bool,
    /// When the reward was created
    pub created_at: DateTime,
    /// When the reward was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Reward and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One reward has many redemptions
    #[sea_orm(has_many = "super::reward_redemption::Entity")]
    RewardRedemptions,
}

impl Related<super::reward_redemption::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RewardRedemptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
