//! Reward redemption entity - Append-only record of a successful redemption.
//!
//! Only written after the affordability check passes; `cost` is the reward
//! price at the time of redemption.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Redemption record database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "child_rewards_claimed")]
pub struct Model {
    /// Unique identifier for the record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Child who redeemed the reward
    pub child_id: i64,
    /// Reward that was redeemed
    pub reward_id: i64,
    /// Reward label at the time of redemption
    pub reward_label: String,
    /// Points paid
    pub cost: i64,
    /// When the reward was claimed
    pub claimed_at: DateTimeUtc,
}

/// Defines relationships between redemption records and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each record belongs to one child
    #[sea_orm(
        belongs_to = "super::child::Entity",
        from = "Column::ChildId",
        to = "super::child::Column::Id"
    )]
    Child,
    /// Each record references one reward
    #[sea_orm(
        belongs_to = "super::reward::Entity",
        from = "Column::RewardId",
        to = "super::reward::Column::Id"
    )]
    Reward,
}

impl Related<super::child::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Child.def()
    }
}

impl Related<super::reward::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reward.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
