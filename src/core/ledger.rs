//! Ledger facade - the entry points UI and API collaborators call.
//!
//! Each mutation runs as attempts of the configured [`RetryPolicy`]: acquire the
//! child's lock, open a store transaction, run the component. A failed or
//! timed-out attempt drops its transaction, which rolls it back, so a retry
//! starts from the state before the attempt. The attempt that succeeds is
//! committed exactly once, outside the retry loop and its timeout, while the
//! lock is still held. A failed commit is reported as [`Error::CommitFailed`]
//! and never retried.

use crate::{
    core::{
        balance::ChildLocks,
        catalog, query,
        redemptions::{self, RedemptionResult},
        retry::RetryPolicy,
        tasks::{self, DailyTask, ToggleResult},
        violations::{self, ViolationResult},
    },
    entities::{child_task, reward_redemption, rule_violation},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::sync::OnceLock;
use tokio::sync::OwnedMutexGuard;
use tracing::error;

/// Response of [`Ledger::toggle_task_completion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// Completion state after the toggle
    pub is_completed: bool,
    /// Balance after the toggle
    pub new_balance: i64,
    /// Points awarded by this toggle
    pub points_awarded: i64,
    /// The instance as stored
    pub instance: child_task::Model,
}

/// Response of [`Ledger::report_rule_violation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationOutcome {
    /// Balance after the penalty
    pub new_balance: i64,
    /// Points actually deducted; below the nominal penalty when clamped
    pub penalty_applied: i64,
    /// The appended record
    pub record: rule_violation::Model,
}

/// Response of [`Ledger::redeem_reward`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionOutcome {
    /// Balance after paying for the reward
    pub new_balance: i64,
    /// The appended record
    pub record: reward_redemption::Model,
}

/// Points ledger bound to a store connection.
#[derive(Debug)]
pub struct Ledger {
    db: DatabaseConnection,
    locks: ChildLocks,
    retry: RetryPolicy,
}

impl Ledger {
    /// Creates a ledger over `db` using `retry` for every operation.
    #[must_use]
    pub fn new(db: DatabaseConnection, retry: RetryPolicy) -> Self {
        Self {
            db,
            locks: ChildLocks::new(),
            retry,
        }
    }

    /// Underlying connection, for read-only collaborators and catalog management.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Current balance of a child in the parent's scope.
    pub async fn get_child_balance(&self, parent_id: &str, child_id: i64) -> Result<i64> {
        self.retry
            .run("get_child_balance", move || async move {
                query::find_child(&self.db, parent_id, child_id)
                    .await
                    .map(|c| c.points)
            })
            .await
    }

    /// Flips completion of the child's instance of `task_id` due on `due_date`.
    ///
    /// Completing awards the task's points; un-completing awards nothing and
    /// takes nothing back. A retried attempt compares the stored state with the
    /// state the first attempt observed and does not flip a second time.
    ///
    /// # Arguments
    /// * `parent_id` - Authenticated parent owning the child and the task
    /// * `child_id` - Child whose instance is toggled
    /// * `task_id` - Task template of the instance
    /// * `due_date` - Day the instance is scheduled for
    pub async fn toggle_task_completion(
        &self,
        parent_id: &str,
        child_id: i64,
        task_id: i64,
        due_date: NaiveDate,
    ) -> Result<ToggleOutcome> {
        let first_seen = OnceLock::new();
        let first_seen = &first_seen;

        let staged = self
            .retry
            .run("toggle_task_completion", move || {
                self.stage_toggle(parent_id, child_id, task_id, due_date, first_seen)
            })
            .await?;
        let result = staged.commit("toggle_task_completion").await?;

        Ok(ToggleOutcome {
            is_completed: result.instance.is_completed,
            new_balance: result.balance,
            points_awarded: result.points_awarded,
            instance: result.instance,
        })
    }

    /// Records a violation of `rule_id` and deducts its penalty, floored at zero.
    ///
    /// Every call appends one record, even for a rule the child already broke
    /// today.
    ///
    /// # Arguments
    /// * `parent_id` - Authenticated parent owning the child and the rule
    /// * `child_id` - Child who broke the rule
    /// * `rule_id` - Rule that was broken
    pub async fn report_rule_violation(
        &self,
        parent_id: &str,
        child_id: i64,
        rule_id: i64,
    ) -> Result<ViolationOutcome> {
        let staged = self
            .retry
            .run("report_rule_violation", move || {
                self.stage_violation(parent_id, child_id, rule_id)
            })
            .await?;
        let result = staged.commit("report_rule_violation").await?;

        Ok(ViolationOutcome {
            new_balance: result.balance,
            penalty_applied: result.record.points_deducted,
            record: result.record,
        })
    }

    /// Redeems `reward_id` if the child can afford it.
    ///
    /// Fails with `InsufficientPoints` and changes nothing otherwise. Concurrent
    /// redemptions for one child are admitted in arrival order.
    ///
    /// # Arguments
    /// * `parent_id` - Authenticated parent owning the child and the reward
    /// * `child_id` - Child spending the points
    /// * `reward_id` - Reward being claimed
    pub async fn redeem_reward(
        &self,
        parent_id: &str,
        child_id: i64,
        reward_id: i64,
    ) -> Result<RedemptionOutcome> {
        let staged = self
            .retry
            .run("redeem_reward", move || {
                self.stage_redemption(parent_id, child_id, reward_id)
            })
            .await?;
        let result = staged.commit("redeem_reward").await?;

        Ok(RedemptionOutcome {
            new_balance: result.balance,
            record: result.record,
        })
    }

    /// The child's instances due today (UTC), joined with their templates.
    pub async fn todays_tasks(&self, parent_id: &str, child_id: i64) -> Result<Vec<DailyTask>> {
        let today = Utc::now().date_naive();
        self.retry
            .run("todays_tasks", move || {
                tasks::tasks_for_day(&self.db, parent_id, child_id, today)
            })
            .await
    }

    /// Deletes a child and its ledger history while holding the child's lock.
    pub async fn delete_child(&self, parent_id: &str, child_id: i64) -> Result<()> {
        let staged = self
            .retry
            .run("delete_child", move || self.stage_delete(parent_id, child_id))
            .await?;
        staged.commit("delete_child").await?;
        self.locks.forget(child_id);
        Ok(())
    }

    async fn begin(&self, child_id: i64) -> Result<(OwnedMutexGuard<()>, DatabaseTransaction)> {
        let guard = self.locks.acquire(child_id).await;
        let txn = self.db.begin().await?;
        Ok((guard, txn))
    }

    async fn stage_toggle(
        &self,
        parent_id: &str,
        child_id: i64,
        task_id: i64,
        due_date: NaiveDate,
        first_seen: &OnceLock<bool>,
    ) -> Result<Staged<ToggleResult>> {
        let (guard, txn) = self.begin(child_id).await?;

        // Only the first attempt records what it saw; retries compare against it
        let expected = first_seen.get().copied();
        if expected.is_none() {
            if let Ok(instance) = tasks::find_instance(&txn, child_id, task_id, due_date).await {
                let _ = first_seen.set(instance.is_completed);
            }
        }

        let value =
            tasks::toggle_completion(&txn, parent_id, child_id, task_id, due_date, expected)
                .await?;
        Ok(Staged { guard, txn, value })
    }

    async fn stage_violation(
        &self,
        parent_id: &str,
        child_id: i64,
        rule_id: i64,
    ) -> Result<Staged<ViolationResult>> {
        let (guard, txn) = self.begin(child_id).await?;
        let value = violations::record_violation(&txn, parent_id, child_id, rule_id).await?;
        Ok(Staged { guard, txn, value })
    }

    async fn stage_redemption(
        &self,
        parent_id: &str,
        child_id: i64,
        reward_id: i64,
    ) -> Result<Staged<RedemptionResult>> {
        let (guard, txn) = self.begin(child_id).await?;
        let value = redemptions::redeem(&txn, parent_id, child_id, reward_id).await?;
        Ok(Staged { guard, txn, value })
    }

    async fn stage_delete(&self, parent_id: &str, child_id: i64) -> Result<Staged<()>> {
        let (guard, txn) = self.begin(child_id).await?;
        catalog::delete_child(&txn, parent_id, child_id).await?;
        Ok(Staged {
            guard,
            txn,
            value: (),
        })
    }
}

/// Uncommitted work of one attempt, still holding the child's lock.
///
/// Attempts run under the retry timeout; the commit does not. A commit cut
/// short by a timer may still land in the store, and retrying it would apply
/// the operation twice.
struct Staged<T> {
    guard: OwnedMutexGuard<()>,
    txn: DatabaseTransaction,
    value: T,
}

impl<T> Staged<T> {
    async fn commit(self, operation: &str) -> Result<T> {
        let Self { guard, txn, value } = self;
        let committed = txn.commit().await;
        drop(guard);

        committed.map_err(|source| {
            error!(operation, %source, "Commit failed; not retrying");
            Error::CommitFailed {
                operation: operation.to_string(),
                source,
            }
        })?;
        Ok(value)
    }
}
