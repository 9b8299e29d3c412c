//! Household catalog loading from catalog.toml
//!
//! A catalog file lists the children, tasks, rules, and rewards of one parent
//! account. It is used to seed the store on first run; entries whose label
//! already exists for the parent are skipped by `core::catalog::seed_catalog`.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default catalog location, overridable with `CATALOG_PATH`.
pub const DEFAULT_CATALOG_PATH: &str = "catalog.toml";

/// Configuration structure representing the entire catalog.toml file
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// Parent account that owns every entry below
    pub parent_id: String,
    /// Children to create
    #[serde(default)]
    pub children: Vec<ChildSeed>,
    /// Task templates to create
    #[serde(default)]
    pub tasks: Vec<TaskSeed>,
    /// Rules to create
    #[serde(default)]
    pub rules: Vec<RuleSeed>,
    /// Rewards to create
    #[serde(default)]
    pub rewards: Vec<RewardSeed>,
}

/// A child entry. Balances always start at zero.
#[derive(Debug, Deserialize, Clone)]
pub struct ChildSeed {
    /// Display name
    pub name: String,
    /// Optional age in years
    pub age: Option<i32>,
    /// Optional avatar URL
    pub avatar_url: Option<String>,
    /// Optional display color
    pub custom_color: Option<String>,
}

/// A task template entry
#[derive(Debug, Deserialize, Clone)]
pub struct TaskSeed {
    /// Task description
    pub label: String,
    /// Points awarded on completion
    pub points_reward: i64,
    /// Whether the task recurs daily
    #[serde(default = "default_daily")]
    pub is_daily: bool,
}

/// A rule entry
#[derive(Debug, Deserialize, Clone)]
pub struct RuleSeed {
    /// Rule description
    pub label: String,
    /// Points deducted per violation
    pub points_penalty: i64,
}

/// A reward entry
#[derive(Debug, Deserialize, Clone)]
pub struct RewardSeed {
    /// Reward description
    pub label: String,
    /// Points required
    pub cost: i64,
}

const fn default_daily() -> bool {
    true
}

/// Loads a catalog from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML syntax is invalid,
/// or required fields are missing.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<CatalogConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read catalog file: {e}"),
    })?;

    parse_catalog(&contents)
}

/// Parses catalog TOML text
pub fn parse_catalog(contents: &str) -> Result<CatalogConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse catalog.toml: {e}"),
    })
}

/// Resolves the catalog path from `CATALOG_PATH`, falling back to ./catalog.toml
#[must_use]
pub fn catalog_path() -> String {
    std::env::var("CATALOG_PATH").unwrap_or_else(|_| DEFAULT_CATALOG_PATH.to_string())
}
