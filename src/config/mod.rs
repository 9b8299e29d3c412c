/// Database connection and table creation
pub mod database;

/// Household catalog loading from catalog.toml
pub mod catalog;

/// Timeouts and retry budget from environment variables
pub mod ledger;
