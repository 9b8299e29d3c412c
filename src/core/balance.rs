//! Balance Mutator - the only code that writes `children.points`.
//!
//! Every award, penalty, and redemption goes through [`apply_delta`] or
//! [`apply_delta_from`]. The new balance is `max(0, current + delta)` and is
//! written with a compare-and-swap on the balance that was read, so a write
//! racing in from outside the caller's serialization point is detected as
//! [`Error::Contention`] instead of being lost.
//!
//! In-process serialization is provided by [`ChildLocks`]: one async mutex per
//! child, so mutations for the same child are linearized while different
//! children never contend.

use crate::{
    entities::{Child, child},
    errors::{Error, Result},
};
use sea_orm::{prelude::*, sea_query::Expr};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, error};

/// Outcome of a single balance mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceChange {
    /// Child whose balance changed
    pub child_id: i64,
    /// Balance read before the mutation
    pub previous: i64,
    /// Balance written by the mutation
    pub new_balance: i64,
    /// Delta the caller asked for
    pub requested: i64,
}

impl BalanceChange {
    /// Delta that actually landed after clamping.
    #[must_use]
    pub const fn applied(&self) -> i64 {
        self.new_balance - self.previous
    }

    /// Whether the zero floor cut the requested delta short.
    #[must_use]
    pub const fn was_clamped(&self) -> bool {
        self.applied() != self.requested
    }
}

/// Reads a child's balance.
pub async fn get_balance<C>(db: &C, child_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    Child::find_by_id(child_id)
        .one(db)
        .await?
        .map(|c| c.points)
        .ok_or(Error::ChildNotFound { id: child_id })
}

/// Reads the child and applies `delta` to its balance, clamped at zero.
///
/// # Arguments
/// * `db` - Connection or transaction to run on
/// * `child_id` - Child whose balance changes
/// * `delta` - Signed amount; additions saturate at `i64::MAX`
pub async fn apply_delta<C>(db: &C, child_id: i64, delta: i64) -> Result<BalanceChange>
where
    C: ConnectionTrait,
{
    let snapshot = Child::find_by_id(child_id)
        .one(db)
        .await?
        .ok_or(Error::ChildNotFound { id: child_id })?;

    apply_delta_from(db, &snapshot, delta).await
}

/// Applies `delta` against a child row the caller already read.
///
/// The write only lands if the stored balance still equals `snapshot.points`,
/// which is what lets a caller check a condition on the snapshot (e.g.
/// affordability) and deduct against that same snapshot.
pub async fn apply_delta_from<C>(
    db: &C,
    snapshot: &child::Model,
    delta: i64,
) -> Result<BalanceChange>
where
    C: ConnectionTrait,
{
    let previous = snapshot.points;
    if previous < 0 {
        error!(
            child_id = snapshot.id,
            balance = previous,
            "Stored balance is negative; refusing to mutate"
        );
        return Err(Error::InvariantViolation {
            message: format!(
                "child {} has negative balance {} before mutation",
                snapshot.id, previous
            ),
        });
    }

    let new_balance = previous.saturating_add(delta).max(0);

    let result = Child::update_many()
        .col_expr(child::Column::Points, Expr::value(new_balance))
        .filter(child::Column::Id.eq(snapshot.id))
        .filter(child::Column::Points.eq(previous))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::Contention {
            child_id: snapshot.id,
        });
    }

    let change = BalanceChange {
        child_id: snapshot.id,
        previous,
        new_balance,
        requested: delta,
    };
    debug!(
        child_id = change.child_id,
        previous = change.previous,
        new_balance = change.new_balance,
        requested = change.requested,
        "Applied balance delta"
    );
    Ok(change)
}

/// Per-child serialization point for balance mutations.
#[derive(Debug, Default)]
pub struct ChildLocks {
    slots: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
}

impl ChildLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `child_id`. Waiters are admitted in FIFO order.
    pub async fn acquire(&self, child_id: i64) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(child_id).or_default())
        };
        slot.lock_owned().await
    }

    /// Drops the slot for a deleted child.
    pub fn forget(&self, child_id: i64) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&child_id);
    }

    /// Number of children with a lock slot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no child has a lock slot yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
