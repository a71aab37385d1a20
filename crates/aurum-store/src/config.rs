//! Configuration section shapes and defaults

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use aurum_core::DeclaredStorage;

/// Generic, cross-session tunables
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenericConfig {
    /// Emit routine notices at info level instead of debug
    pub verbose: bool,
    /// Cooldown between non-forced personal pushes
    pub push_cooldown_seconds: u64,
    /// Periodic pull/reconcile interval
    pub pull_interval_seconds: u64,
    /// Leaderboard entries shown before truncation
    pub board_entry_limit: usize,
    /// Resolved profile id to display name cache
    pub name_cache: BTreeMap<String, String>,
}

impl Default for GenericConfig {
    fn default() -> Self {
        GenericConfig {
            verbose: false,
            push_cooldown_seconds: 10,
            pull_interval_seconds: 60,
            board_entry_limit: 5,
            name_cache: BTreeMap::new(),
        }
    }
}

/// World-scoped section, one per scope id
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorldConfig {
    /// Declared shared storages keyed by `"x,y,z"`
    pub declared_storages: BTreeMap<String, DeclaredStorage>,
    /// Gold tracked inside the private overflow container
    pub reserve_quantity: f64,
}

/// On-disk shape of `worlds.json`
pub type WorldsFile = BTreeMap<String, WorldConfig>;
