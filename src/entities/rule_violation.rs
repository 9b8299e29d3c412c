//! Rule violation entity - Append-only record of a reported violation.
//!
//! The penalty is snapshotted at the moment of the report. `penalty` is the
//! nominal amount from the rule; `points_deducted` is what the clamped balance
//! update actually removed, which is smaller when the child could not cover it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Violation record database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "child_rules_violations")]
pub struct Model {
    /// Unique identifier for the record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Child who violated the rule
    pub child_id: i64,
    /// Rule that was violated
    pub rule_id: i64,
    /// Rule label at the time of the violation
    pub rule_label: String,
    /// Nominal penalty at the time of the violation
    pub penalty: i64,
    /// Points actually removed from the balance
    pub points_deducted: i64,
    /// When the violation was reported
    pub violated_at: DateTimeUtc,
}

/// Defines relationships between violation records and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each record belongs to one child
    #[sea_orm(
        belongs_to = "super::child::Entity",
        from = "Column::ChildId",
        to = "super::child::Column::Id"
    )]
    Child,
    /// Each record references one rule
    #[sea_orm(
        belongs_to = "super::rule::Entity",
        from = "Column::RuleId",
        to = "super::rule::Column::Id"
    )]
    Rule,
}

impl Related<super::child::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Child.def()
    }
}

impl Related<super::rule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
