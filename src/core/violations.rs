//! Rule Violation Recorder - append-only violation records with clamped penalties.
//!
//! Violations are never deduplicated: reporting the same rule twice records two
//! violations and applies two penalties. The record keeps the nominal penalty;
//! `points_deducted` holds what the zero floor actually let through.

use crate::{
    core::{balance, query},
    entities::{RuleViolation, rule_violation},
    errors::Result,
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Result of recording a violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationResult {
    /// The appended record
    pub record: rule_violation::Model,
    /// Child balance after the penalty
    pub balance: i64,
}

/// Records a violation of `rule_id` by `child_id` and deducts the penalty.
///
/// The deduction is clamped at zero. The appended record carries the rule's
/// label and nominal penalty as they were at this moment, plus the points that
/// were actually deducted. Repeated reports are never merged.
///
/// Must run inside a store transaction for the record and the deduction to
/// land together.
///
/// # Arguments
/// * `db` - Connection or transaction to run on
/// * `parent_id` - Parent owning the child and the rule
/// * `child_id` - Child who broke the rule
/// * `rule_id` - Rule that was broken
///
/// # Errors
/// * `ChildNotFound` / `RuleNotFound` - out of scope, or the rule is deleted
/// * `Contention` - the balance moved after it was read
pub async fn record_violation<C>(
    db: &C,
    parent_id: &str,
    child_id: i64,
    rule_id: i64,
) -> Result<ViolationResult>
where
    C: ConnectionTrait,
{
    let child = query::find_child(db, parent_id, child_id).await?;
    let rule = query::find_rule(db, parent_id, rule_id).await?;

    let change = balance::apply_delta_from(db, &child, -rule.points_penalty).await?;

    let record = rule_violation::ActiveModel {
        child_id: Set(child_id),
        rule_id: Set(rule_id),
        rule_label: Set(rule.label),
        penalty: Set(rule.points_penalty),
        points_deducted: Set(-change.applied()),
        violated_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        child_id,
        rule_id,
        penalty = record.penalty,
        points_deducted = record.points_deducted,
        balance = change.new_balance,
        "Recorded rule violation"
    );

    Ok(ViolationResult {
        record,
        balance: change.new_balance,
    })
}

/// Lists a child's violations, newest first.
pub async fn violations_for_child<C>(
    db: &C,
    parent_id: &str,
    child_id: i64,
) -> Result<Vec<rule_violation::Model>>
where
    C: ConnectionTrait,
{
    query::find_child(db, parent_id, child_id).await?;

    RuleViolation::find()
        .filter(rule_violation::Column::ChildId.eq(child_id))
        .order_by_desc(rule_violation::Column::ViolatedAt)
        .order_by_desc(rule_violation::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{balance::get_balance, catalog};
    use crate::errors::Error;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_full_penalty() -> Result<()> {
        let (db, child) = setup_with_child(30).await?;
        let rule = create_test_rule(&db, TEST_PARENT, "No yelling", 10).await?;

        let result = record_violation(&db, TEST_PARENT, child.id, rule.id).await?;

        assert_eq!(result.balance, 20);
        assert_eq!(result.record.penalty, 10);
        assert_eq!(result.record.points_deducted, 10);
        assert_eq!(result.record.rule_label, "No yelling");
        assert_eq!(get_balance(&db, child.id).await?, 20);
        Ok(())
    }

    #[tokio::test]
    async fn test_penalty_clamps_but_record_keeps_nominal() -> Result<()> {
        let (db, child) = setup_with_child(5).await?;
        let rule = create_test_rule(&db, TEST_PARENT, "No yelling", 10).await?;

        let result = record_violation(&db, TEST_PARENT, child.id, rule.id).await?;

        assert_eq!(result.balance, 0);
        assert_eq!(result.record.penalty, 10);
        assert_eq!(result.record.points_deducted, 5);

        // At zero, another violation still records but deducts nothing
        let again = record_violation(&db, TEST_PARENT, child.id, rule.id).await?;
        assert_eq!(again.balance, 0);
        assert_eq!(again.record.penalty, 10);
        assert_eq!(again.record.points_deducted, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_repeated_violations_are_not_deduplicated() -> Result<()> {
        let (db, child) = setup_with_child(100).await?;
        let rule = create_test_rule(&db, TEST_PARENT, "Bedtime", 15).await?;

        record_violation(&db, TEST_PARENT, child.id, rule.id).await?;
        record_violation(&db, TEST_PARENT, child.id, rule.id).await?;

        let history = violations_for_child(&db, TEST_PARENT, child.id).await?;
        assert_eq!(history.len(), 2);
        assert!(history[0].id > history[1].id);
        assert_eq!(get_balance(&db, child.id).await?, 70);
        Ok(())
    }

    #[tokio::test]
    async fn test_record_keeps_penalty_snapshot() -> Result<()> {
        let (db, child) = setup_with_child(100).await?;
        let rule = create_test_rule(&db, TEST_PARENT, "Bedtime", 15).await?;

        record_violation(&db, TEST_PARENT, child.id, rule.id).await?;
        catalog::update_rule(&db, TEST_PARENT, rule.id, "Lights out".to_string(), 40).await?;

        let history = violations_for_child(&db, TEST_PARENT, child.id).await?;
        assert_eq!(history[0].penalty, 15);
        assert_eq!(history[0].rule_label, "Bedtime");
        Ok(())
    }

    #[tokio::test]
    async fn test_rule_out_of_scope() -> Result<()> {
        let (db, child) = setup_with_child(10).await?;
        let foreign = create_test_rule(&db, "other-parent", "Theirs", 5).await?;

        let result = record_violation(&db, TEST_PARENT, child.id, foreign.id).await;
        assert!(matches!(result, Err(Error::RuleNotFound { .. })));

        let result = record_violation(&db, TEST_PARENT, child.id, 999).await;
        assert!(matches!(result, Err(Error::RuleNotFound { id: 999 })));

        assert_eq!(get_balance(&db, child.id).await?, 10);
        assert!(violations_for_child(&db, TEST_PARENT, child.id).await?.is_empty());
        Ok(())
    }
}
