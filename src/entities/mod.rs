//! Entity module - Contains all SeaORM entity definitions for the ledger store.
//! Catalog entities (children, tasks, rules, rewards) are owned by a parent;
//! ledger entities (task instances, violations, redemptions) are owned by a child.

pub mod child;
pub mod child_task;
pub mod reward;
pub mod reward_redemption;
pub mod rule;
pub mod rule_violation;
pub mod task;

// Re-export specific types to avoid conflicts
pub use child::{Column as ChildColumn, Entity as Child, Model as ChildModel};
pub use child_task::{Column as ChildTaskColumn, Entity as ChildTask, Model as ChildTaskModel};
pub use reward::{Column as RewardColumn, Entity as Reward, Model as RewardModel};
pub use reward_redemption::{
    Column as RewardRedemptionColumn, Entity as RewardRedemption, Model as RewardRedemptionModel,
};
pub use rule::{Column as RuleColumn, Entity as Rule, Model as RuleModel};
pub use rule_violation::{
    Column as RuleViolationColumn, Entity as RuleViolation, Model as RuleViolationModel,
};
pub use task::{Column as TaskColumn, Entity as Task, Model as TaskModel};
