//! Storage registry
//!
//! The durable local record of declared shared storages, mirrored in
//! memory and written through to the world-scoped config section on
//! every mutation.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use aurum_core::{AurumResult, Block, BlockPos, DeclaredStorage, StorageKind};
use aurum_store::ConfigStore;

/// World lookup needed to validate declare/renounce targets
pub trait WorldProbe {
    /// The block at `pos`, or None when the position is not loaded
    fn block_at(&self, pos: BlockPos) -> Option<Block>;
}

/// Outcome of a declare attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclareOutcome {
    Declared(StorageKind),
    /// The position is not currently observable; retry later
    NotLoaded,
    /// The block is not an accepted storage kind
    InvalidKind,
    /// Already registered; quantity and nickname are left untouched
    AlreadyDeclared,
}

/// Outcome of a renounce attempt
#[derive(Clone, Debug, PartialEq)]
pub enum RenounceOutcome {
    Renounced(DeclaredStorage),
    NotLoaded,
    NotDeclared,
}

/// Declared shared storages for the current scope
#[derive(Debug, Default)]
pub struct StorageRegistry {
    entries: BTreeMap<BlockPos, DeclaredStorage>,
}

impl StorageRegistry {
    /// Load the registry from the world-scoped config section.
    /// Entries whose keys no longer parse are dropped with a warning.
    pub fn load(store: &ConfigStore) -> AurumResult<Self> {
        let mut entries = BTreeMap::new();
        for (key, record) in store.declared_storages()? {
            match key.parse::<BlockPos>() {
                Ok(pos) => {
                    entries.insert(pos, record);
                }
                Err(_) => warn!(key = %key, "dropping declared storage with unparsable key"),
            }
        }
        Ok(StorageRegistry { entries })
    }

    #[inline]
    pub fn contains(&self, pos: BlockPos) -> bool {
        self.entries.contains_key(&pos)
    }

    pub fn get(&self, pos: BlockPos) -> Option<&DeclaredStorage> {
        self.entries.get(&pos)
    }

    pub fn quantity(&self, pos: BlockPos) -> Option<f64> {
        self.entries.get(&pos).map(|record| record.quantity)
    }

    pub fn nickname(&self, pos: BlockPos) -> Option<&str> {
        self.entries.get(&pos)?.nickname.as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BlockPos, &DeclaredStorage)> {
        self.entries.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register `pos` as a shared storage with quantity zero
    pub fn declare(
        &mut self,
        store: &ConfigStore,
        world: &impl WorldProbe,
        pos: BlockPos,
    ) -> AurumResult<DeclareOutcome> {
        let Some(block) = world.block_at(pos) else {
            return Ok(DeclareOutcome::NotLoaded);
        };
        let Some(kind) = block.storage_kind() else {
            return Ok(DeclareOutcome::InvalidKind);
        };
        if self.entries.contains_key(&pos) {
            return Ok(DeclareOutcome::AlreadyDeclared);
        }

        self.entries.insert(pos, DeclaredStorage::new(kind));
        self.persist(store)?;
        debug!(%pos, ?kind, "declared shared storage");
        Ok(DeclareOutcome::Declared(kind))
    }

    /// Remove `pos` from the registry. Remote wipe and pull are the
    /// caller's responsibility.
    pub fn renounce(
        &mut self,
        store: &ConfigStore,
        world: &impl WorldProbe,
        pos: BlockPos,
    ) -> AurumResult<RenounceOutcome> {
        if world.block_at(pos).is_none() {
            return Ok(RenounceOutcome::NotLoaded);
        }
        let Some(record) = self.entries.remove(&pos) else {
            return Ok(RenounceOutcome::NotDeclared);
        };

        self.persist(store)?;
        debug!(%pos, "renounced shared storage");
        Ok(RenounceOutcome::Renounced(record))
    }

    /// Update a declared storage's cached quantity; false if unknown
    pub fn set_quantity(
        &mut self,
        store: &ConfigStore,
        pos: BlockPos,
        quantity: f64,
    ) -> AurumResult<bool> {
        match self.entries.get_mut(&pos) {
            Some(record) => {
                record.quantity = quantity;
                self.persist(store)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Set or clear a declared storage's nickname; false if unknown
    pub fn set_nickname(
        &mut self,
        store: &ConfigStore,
        pos: BlockPos,
        nickname: Option<String>,
    ) -> AurumResult<bool> {
        match self.entries.get_mut(&pos) {
            Some(record) => {
                record.nickname = nickname;
                self.persist(store)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn persist(&self, store: &ConfigStore) -> AurumResult<()> {
        let map: BTreeMap<String, DeclaredStorage> = self
            .entries
            .iter()
            .map(|(pos, record)| (pos.pos_key(), record.clone()))
            .collect();
        store.set_declared_storages(map)
    }
}
