//! Task Completion Tracker - scheduling and completion of per-day task instances.
//!
//! A task instance is a task template bound to one child for one due date. The
//! completion toggle is a strict flip: completing an instance awards the
//! template's `points_reward` through the Balance Mutator, un-completing it
//! clears the completion but leaves the award in place. Completing it again
//! awards again.

use crate::{
    core::{balance, query},
    entities::{ChildTask, Task, child_task, task},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, SqlErr, prelude::*};
use tracing::{debug, error, info};

/// Result of a completion toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleResult {
    /// Instance after the toggle
    pub instance: child_task::Model,
    /// Child balance after the toggle
    pub balance: i64,
    /// Points added to the balance by this toggle (0 when un-completing)
    pub points_awarded: i64,
}

/// A scheduled instance joined with its template, as shown in a daily view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTask {
    /// The scheduled instance
    pub instance: child_task::Model,
    /// Template label
    pub label: String,
    /// Template reward
    pub points_reward: i64,
    /// Template recurrence flag
    pub is_daily: bool,
}

/// Flips the completion state of the instance for `(child_id, task_id, due_date)`.
///
/// Completing the instance stamps `completed_at` and awards the template's
/// `points_reward` through the Balance Mutator. Un-completing clears the stamp
/// and leaves the balance alone. The instance must already be scheduled; a
/// toggle never creates one.
///
/// Must run inside a store transaction for the award and the flip to land
/// together.
///
/// # Arguments
/// * `db` - Connection or transaction to run on
/// * `parent_id` - Parent owning the child and the task template
/// * `child_id` - Child whose instance is toggled
/// * `task_id` - Task template of the instance
/// * `due_date` - Day the instance is scheduled for
/// * `expected_completed` - State a retried request observed on its first
///   attempt. When the stored state already differs from it, the earlier
///   attempt landed and the instance is returned without flipping again.
///   `None` for a fresh request.
///
/// # Errors
/// * `ChildNotFound` / `TaskNotFound` - out of scope, or the template is deleted
/// * `TaskInstanceNotFound` - nothing scheduled for that slot
/// * `InvariantViolation` - duplicate instances, or a negative stored balance
pub async fn toggle_completion<C>(
    db: &C,
    parent_id: &str,
    child_id: i64,
    task_id: i64,
    due_date: NaiveDate,
    expected_completed: Option<bool>,
) -> Result<ToggleResult>
where
    C: ConnectionTrait,
{
    let child = query::find_child(db, parent_id, child_id).await?;
    let task = query::find_task(db, parent_id, task_id).await?;
    let instance = find_instance(db, child_id, task_id, due_date).await?;

    if expected_completed.is_some_and(|expected| expected != instance.is_completed) {
        info!(
            child_id,
            task_id,
            %due_date,
            is_completed = instance.is_completed,
            "Toggle already applied by an earlier attempt"
        );
        return Ok(ToggleResult {
            instance,
            balance: child.points,
            points_awarded: 0,
        });
    }

    let completing = !instance.is_completed;
    let mut active: child_task::ActiveModel = instance.into();
    active.is_completed = Set(completing);
    active.completed_at = Set(completing.then(Utc::now));
    let updated = active.update(db).await?;

    let (balance, points_awarded) = if completing {
        let change = balance::apply_delta_from(db, &child, task.points_reward).await?;
        (change.new_balance, change.applied())
    } else {
        (child.points, 0)
    };

    info!(
        child_id,
        task_id,
        %due_date,
        is_completed = completing,
        points_awarded,
        balance,
        "Toggled task completion"
    );

    Ok(ToggleResult {
        instance: updated,
        balance,
        points_awarded,
    })
}

/// Looks up the unique instance for a slot.
///
/// Two rows for one slot mean the uniqueness invariant is broken; that is
/// reported, not repaired.
pub async fn find_instance<C>(
    db: &C,
    child_id: i64,
    task_id: i64,
    due_date: NaiveDate,
) -> Result<child_task::Model>
where
    C: ConnectionTrait,
{
    let mut matches = ChildTask::find()
        .filter(child_task::Column::ChildId.eq(child_id))
        .filter(child_task::Column::TaskId.eq(task_id))
        .filter(child_task::Column::DueDate.eq(due_date))
        .limit(2)
        .all(db)
        .await?;

    match matches.len() {
        0 => Err(Error::TaskInstanceNotFound {
            child_id,
            task_id,
            due_date,
        }),
        1 => Ok(matches.remove(0)),
        _ => {
            error!(
                child_id,
                task_id,
                %due_date,
                "Duplicate task instances found for one slot"
            );
            Err(Error::InvariantViolation {
                message: format!(
                    "duplicate task instances for child {child_id}, task {task_id} on {due_date}"
                ),
            })
        }
    }
}

/// Schedules a task for a child on `due_date`, returning the existing instance
/// if the slot is already taken.
pub async fn schedule_task<C>(
    db: &C,
    parent_id: &str,
    child_id: i64,
    task_id: i64,
    due_date: NaiveDate,
) -> Result<child_task::Model>
where
    C: ConnectionTrait,
{
    query::find_child(db, parent_id, child_id).await?;
    query::find_task(db, parent_id, task_id).await?;

    match find_instance(db, child_id, task_id, due_date).await {
        Ok(existing) => return Ok(existing),
        Err(Error::TaskInstanceNotFound { .. }) => {}
        Err(err) => return Err(err),
    }

    let instance = child_task::ActiveModel {
        child_id: Set(child_id),
        task_id: Set(task_id),
        due_date: Set(due_date),
        is_completed: Set(false),
        completed_at: Set(None),
        ..Default::default()
    };
    match instance.insert(db).await {
        Ok(created) => Ok(created),
        // Lost a race with a concurrent schedule of the same slot
        Err(err) if is_unique_violation(&err) => {
            debug!(child_id, task_id, %due_date, "Slot scheduled concurrently; re-reading");
            find_instance(db, child_id, task_id, due_date).await
        }
        Err(err) => Err(err.into()),
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Schedules every active daily task of the parent for a child on `date`.
///
/// Returns one instance per daily task, whether newly created or pre-existing.
pub async fn schedule_daily_tasks<C>(
    db: &C,
    parent_id: &str,
    child_id: i64,
    date: NaiveDate,
) -> Result<Vec<child_task::Model>>
where
    C: ConnectionTrait,
{
    let daily = Task::find()
        .filter(task::Column::ParentId.eq(parent_id))
        .filter(task::Column::IsDaily.eq(true))
        .filter(task::Column::IsDeleted.eq(false))
        .order_by_asc(task::Column::Id)
        .all(db)
        .await?;

    let mut instances = Vec::with_capacity(daily.len());
    for template in daily {
        instances.push(schedule_task(db, parent_id, child_id, template.id, date).await?);
    }

    info!(
        child_id,
        %date,
        count = instances.len(),
        "Scheduled daily tasks"
    );
    Ok(instances)
}

/// Lists a child's instances due on `date`, joined with their templates.
///
/// Instances whose template was deleted are left out.
pub async fn tasks_for_day<C>(
    db: &C,
    parent_id: &str,
    child_id: i64,
    date: NaiveDate,
) -> Result<Vec<DailyTask>>
where
    C: ConnectionTrait,
{
    query::find_child(db, parent_id, child_id).await?;

    let rows = ChildTask::find()
        .filter(child_task::Column::ChildId.eq(child_id))
        .filter(child_task::Column::DueDate.eq(date))
        .order_by_asc(child_task::Column::Id)
        .find_also_related(Task)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(instance, template)| {
            template
                .filter(|t| !t.is_deleted)
                .map(|t| DailyTask {
                    instance,
                    label: t.label,
                    points_reward: t.points_reward,
                    is_daily: t.is_daily,
                })
        })
        .collect())
}
