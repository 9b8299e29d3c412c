//! Reward Redemption Processor - affordability-gated reward claims.
//!
//! The affordability check and the deduction are evaluated against the same
//! balance snapshot: the deduction is a compare-and-swap on the balance the
//! check read. A redemption never relies on the zero floor; if the floor ever
//! kicks in on this path the redemption is rejected as an invariant violation.

use crate::{
    core::{balance, query},
    entities::{RewardRedemption, reward_redemption},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{error, info};

/// Result of a successful redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionResult {
    /// The appended record
    pub record: reward_redemption::Model,
    /// Child balance after paying for the reward
    pub balance: i64,
}

/// Redeems `reward_id` for `child_id` if the child can afford it.
///
/// The balance read for the affordability check is the one the deduction is
/// applied against, so a redemption either pays the full cost or writes
/// nothing. The record keeps the reward's label and cost at claim time.
///
/// Must run inside a store transaction, so that a rejected deduction also
/// discards the record.
///
/// # Arguments
/// * `db` - Connection or transaction to run on
/// * `parent_id` - Parent owning the child and the reward
/// * `child_id` - Child spending the points
/// * `reward_id` - Reward being claimed
///
/// # Errors
/// * `ChildNotFound` / `RewardNotFound` - out of scope, or the reward is deleted
/// * [`Error::InsufficientPoints`] - balance below cost; nothing is written
/// * `InvariantViolation` - the zero floor triggered on this path
pub async fn redeem<C>(
    db: &C,
    parent_id: &str,
    child_id: i64,
    reward_id: i64,
) -> Result<RedemptionResult>
where
    C: ConnectionTrait,
{
    let child = query::find_child(db, parent_id, child_id).await?;
    let reward = query::find_reward(db, parent_id, reward_id).await?;

    if child.points < reward.cost {
        info!(
            child_id,
            reward_id,
            balance = child.points,
            cost = reward.cost,
            "Redemption refused: insufficient points"
        );
        return Err(Error::InsufficientPoints {
            balance: child.points,
            cost: reward.cost,
        });
    }

    let record = reward_redemption::ActiveModel {
        child_id: Set(child_id),
        reward_id: Set(reward_id),
        reward_label: Set(reward.label),
        cost: Set(reward.cost),
        claimed_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let change = balance::apply_delta_from(db, &child, -reward.cost).await?;
    if change.was_clamped() {
        error!(
            child_id,
            reward_id,
            previous = change.previous,
            cost = reward.cost,
            "Zero floor triggered on an affordability-checked redemption"
        );
        return Err(Error::InvariantViolation {
            message: format!(
                "redemption of reward {reward_id} by child {child_id} was clamped at zero"
            ),
        });
    }

    info!(
        child_id,
        reward_id,
        cost = record.cost,
        balance = change.new_balance,
        "Redeemed reward"
    );

    Ok(RedemptionResult {
        record,
        balance: change.new_balance,
    })
}

/// Lists a child's redemptions, newest first.
pub async fn redemptions_for_child<C>(
    db: &C,
    parent_id: &str,
    child_id: i64,
) -> Result<Vec<reward_redemption::Model>>
where
    C: ConnectionTrait,
{
    query::find_child(db, parent_id, child_id).await?;

    RewardRedemption::find()
        .filter(reward_redemption::Column::ChildId.eq(child_id))
        .order_by_desc(reward_redemption::Column::ClaimedAt)
        .order_by_desc(reward_redemption::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
