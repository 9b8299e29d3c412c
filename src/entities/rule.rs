//! Rule entity - A behavioral rule with a point penalty.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Rule database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rules")]
pub struct Model {
    /// Unique identifier for the rule
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Parent account that owns this rule
    pub parent_id: String,
    /// Description of the rule (e.g. "No shouting at dinner")
    pub label: String,
    /// Nominal points deducted per violation
    pub points_penalty: i64,
    /// Soft delete flag - violation history is preserved
    pub is_deleted: bool,
    /// When the rule was created
    pub created_at: DateTime,
    /// When the rule was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Rule and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One rule has many recorded violations
    #[sea_orm(has_many = "super::rule_violation::Entity")]
    RuleViolations,
}

impl Related<super::rule_violation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RuleViolations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
