//! Pulled ledger records
//!
//! The last-pulled authoritative map for the current scope. Replaced
//! wholesale on every pull, never partially merged.

use std::collections::BTreeMap;

use aurum_core::{AccountId, BlockPos};

/// Identity-to-quantity map for one scope
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LedgerSnapshot {
    entries: BTreeMap<AccountId, f64>,
}

impl LedgerSnapshot {
    /// Decode a raw scope map as returned by the records endpoint
    pub fn from_raw(raw: impl IntoIterator<Item = (String, f64)>) -> Self {
        LedgerSnapshot {
            entries: raw
                .into_iter()
                .map(|(key, quantity)| (AccountId::parse(&key), quantity))
                .collect(),
        }
    }

    pub fn get(&self, id: &AccountId) -> Option<f64> {
        self.entries.get(id).copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&AccountId, f64)> {
        self.entries.iter().map(|(id, &quantity)| (id, quantity))
    }

    /// The shared-storage subset, decoded to positions
    pub fn storage_entries(&self) -> Vec<(BlockPos, f64)> {
        self.entries
            .iter()
            .filter_map(|(id, &quantity)| id.storage_pos().map(|pos| (pos, quantity)))
            .collect()
    }

    /// Player identities and their quantities
    pub fn player_entries(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().filter_map(|(id, &quantity)| match id {
            AccountId::Player(raw) => Some((raw.as_str(), quantity)),
            AccountId::Storage(_) => None,
        })
    }

    /// Total gold across the whole pool
    pub fn total(&self) -> f64 {
        self.entries.values().sum()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
