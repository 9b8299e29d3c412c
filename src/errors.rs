//! Unified error type for the points ledger.
//!
//! Every fallible operation in the crate returns [`Result`]. Callers that need to
//! branch on the outcome (refusal vs. retry vs. bug) should use [`Error::kind`]
//! rather than matching individual variants.

use chrono::NaiveDate;
use sea_orm::DbErr;
use thiserror::Error;

/// All errors produced by the ledger and its supporting modules.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong with the configuration
        message: String,
    },

    /// Store error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Filesystem error while reading configuration or preparing the store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable could not be read
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// No child with this id in the caller's scope
    #[error("Child not found: {id}")]
    ChildNotFound {
        /// Requested child id
        id: i64,
    },

    /// No active task template with this id in the caller's scope
    #[error("Task not found: {id}")]
    TaskNotFound {
        /// Requested task id
        id: i64,
    },

    /// The task was not scheduled for the child on that day
    #[error("No task {task_id} scheduled for child {child_id} on {due_date}")]
    TaskInstanceNotFound {
        /// Child the instance would belong to
        child_id: i64,
        /// Task template of the instance
        task_id: i64,
        /// Day the instance would be due
        due_date: NaiveDate,
    },

    /// No active rule with this id in the caller's scope
    #[error("Rule not found: {id}")]
    RuleNotFound {
        /// Requested rule id
        id: i64,
    },

    /// No active reward with this id in the caller's scope
    #[error("Reward not found: {id}")]
    RewardNotFound {
        /// Requested reward id
        id: i64,
    },

    /// Redemption refused; nothing was written
    #[error("Insufficient points: balance {balance}, cost {cost}")]
    InsufficientPoints {
        /// Balance at the time of the check
        balance: i64,
        /// Cost of the reward
        cost: i64,
    },

    /// A reward, penalty, or cost that is not strictly positive
    #[error("Invalid points amount: {amount}")]
    InvalidPoints {
        /// The rejected amount
        amount: i64,
    },

    /// Unusable caller input, such as an empty label
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input
        message: String,
    },

    /// The balance moved between read and write
    #[error("Balance of child {child_id} changed concurrently")]
    Contention {
        /// Child whose balance moved
        child_id: i64,
    },

    /// Transient failures used up the retry budget
    #[error("Store unavailable after {attempts} attempt(s): {message}")]
    TransientStoreFailure {
        /// Attempts made
        attempts: u32,
        /// Last failure seen
        message: String,
    },

    /// The store rejected a commit; whether it landed is unknown, so it is not retried
    #[error("Commit of {operation} failed: {source}")]
    CommitFailed {
        /// Ledger operation being committed
        operation: String,
        /// Error reported by the store
        source: DbErr,
    },

    /// A ledger invariant does not hold in the stored data
    #[error("Ledger invariant violated: {message}")]
    InvariantViolation {
        /// Description of the broken invariant
        message: String,
    },
}

/// Coarse classification of [`Error`] used by callers and the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Referenced entity is absent or belongs to another parent. Never retried.
    NotFound,
    /// Redemption refused; balance untouched.
    InsufficientPoints,
    /// Timeout or contention on the store; safe to retry.
    TransientStoreFailure,
    /// Internal bug detected (negative stored balance, duplicate instance).
    InvariantViolation,
    /// Caller supplied an unusable label or amount.
    InvalidInput,
    /// Any other store failure, including a failed commit. Never retried.
    Store,
    /// Startup configuration problem.
    Config,
}

impl Error {
    /// Maps this error onto the ledger's error taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ChildNotFound { .. }
            | Self::TaskNotFound { .. }
            | Self::TaskInstanceNotFound { .. }
            | Self::RuleNotFound { .. }
            | Self::RewardNotFound { .. } => ErrorKind::NotFound,
            Self::InsufficientPoints { .. } => ErrorKind::InsufficientPoints,
            Self::Contention { .. } | Self::TransientStoreFailure { .. } => {
                ErrorKind::TransientStoreFailure
            }
            Self::Database(err) if is_transient_db_error(err) => ErrorKind::TransientStoreFailure,
            Self::Database(_) | Self::CommitFailed { .. } => ErrorKind::Store,
            Self::InvariantViolation { .. } => ErrorKind::InvariantViolation,
            Self::InvalidPoints { .. } | Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::Config { .. } | Self::Io(_) | Self::EnvVar(_) => ErrorKind::Config,
        }
    }

    /// Whether retrying the same operation may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::TransientStoreFailure
    }
}

/// Pool exhaustion and `SQLITE_BUSY` are the store failures worth retrying.
fn is_transient_db_error(err: &DbErr) -> bool {
    if matches!(err, DbErr::ConnectionAcquire(_)) {
        return true;
    }
    let message = err.to_string();
    message.contains("database is locked") || message.contains("database table is locked")
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
