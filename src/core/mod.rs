//! Core business logic - the points ledger and its state-transition engine.
//!
//! `balance` is the only writer of child balances. `tasks`, `violations`, and
//! `redemptions` are the three event handlers that route through it, and
//! `ledger` wraps each of them in a per-child lock and a retried transaction.

/// Balance Mutator and per-child locks
pub mod balance;
/// Parent-scoped create/update/delete of children, tasks, rules, and rewards
pub mod catalog;
/// External entry points
pub mod ledger;
/// Parent-scoped lookups
pub mod query;
/// Reward Redemption Processor
pub mod redemptions;
/// Timeout and retry policy for store operations
pub mod retry;
/// Task Completion Tracker
pub mod tasks;
/// Rule Violation Recorder
pub mod violations;
