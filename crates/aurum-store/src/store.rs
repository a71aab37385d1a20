//! File-backed configuration store
//!
//! Reads and writes are all-or-nothing per section. The store never
//! caches: each accessor re-reads its section so concurrent command
//! and handler paths always observe the latest persisted state.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use aurum_core::{AurumError, AurumResult, BlockPos, DeclaredStorage, ScopeId};

use crate::{GenericConfig, WorldConfig, WorldsFile};

const GENERIC_FILE: &str = "config.json";
const WORLDS_FILE: &str = "worlds.json";

/// Handle on the configuration directory for one session scope
pub struct ConfigStore {
    dir: PathBuf,
    scope: ScopeId,
}

impl ConfigStore {
    /// Open (creating the directory if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>, scope: ScopeId) -> AurumResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| AurumError::StoreIo(e.to_string()))?;
        Ok(ConfigStore { dir, scope })
    }

    #[inline]
    pub fn scope(&self) -> &ScopeId {
        &self.scope
    }

    /// Read both sections, materializing defaults where a section or
    /// the current scope's entry is missing or unreadable.
    pub fn load_or_initialize(&self) -> AurumResult<(GenericConfig, WorldConfig)> {
        Ok((self.generic()?, self.world()?))
    }

    /// The generic section, materialized from defaults on first use
    pub fn generic(&self) -> AurumResult<GenericConfig> {
        match self.try_read::<GenericConfig>(GENERIC_FILE)? {
            Some(cfg) => Ok(cfg),
            None => {
                let cfg = GenericConfig::default();
                self.write_section(GENERIC_FILE, &cfg)?;
                Ok(cfg)
            }
        }
    }

    /// Rewrite the generic section through a mutation
    pub fn update_generic(
        &self,
        mutate: impl FnOnce(&mut GenericConfig),
    ) -> AurumResult<GenericConfig> {
        let mut cfg = self.generic()?;
        mutate(&mut cfg);
        self.write_section(GENERIC_FILE, &cfg)?;
        Ok(cfg)
    }

    /// The current scope's world section, lazily materialized
    pub fn world(&self) -> AurumResult<WorldConfig> {
        let mut worlds = self.try_read::<WorldsFile>(WORLDS_FILE)?.unwrap_or_default();
        match worlds.get(self.scope.as_str()) {
            Some(world) => Ok(world.clone()),
            None => {
                let world = WorldConfig::default();
                worlds.insert(self.scope.as_str().to_string(), world.clone());
                self.write_section(WORLDS_FILE, &worlds)?;
                Ok(world)
            }
        }
    }

    /// Rewrite the current scope's world section through a mutation
    pub fn update_world(&self, mutate: impl FnOnce(&mut WorldConfig)) -> AurumResult<WorldConfig> {
        let mut worlds = self.try_read::<WorldsFile>(WORLDS_FILE)?.unwrap_or_default();
        let world = worlds
            .entry(self.scope.as_str().to_string())
            .or_default();
        mutate(world);
        let world = world.clone();
        self.write_section(WORLDS_FILE, &worlds)?;
        Ok(world)
    }

    // Typed helpers over the two sections.

    pub fn declared_storages(&self) -> AurumResult<BTreeMap<String, DeclaredStorage>> {
        Ok(self.world()?.declared_storages)
    }

    pub fn set_declared_storages(
        &self,
        storages: BTreeMap<String, DeclaredStorage>,
    ) -> AurumResult<()> {
        self.update_world(|world| world.declared_storages = storages)?;
        Ok(())
    }

    pub fn storage_quantity(&self, pos: BlockPos) -> AurumResult<Option<f64>> {
        Ok(self
            .world()?
            .declared_storages
            .get(&pos.pos_key())
            .map(|record| record.quantity))
    }

    pub fn reserve_quantity(&self) -> AurumResult<f64> {
        Ok(self.world()?.reserve_quantity)
    }

    pub fn set_reserve_quantity(&self, quantity: f64) -> AurumResult<()> {
        self.update_world(|world| world.reserve_quantity = quantity)?;
        Ok(())
    }

    pub fn name_cache(&self) -> AurumResult<BTreeMap<String, String>> {
        Ok(self.generic()?.name_cache)
    }

    pub fn merge_name_cache(
        &self,
        entries: impl IntoIterator<Item = (String, String)>,
    ) -> AurumResult<()> {
        self.update_generic(|cfg| cfg.name_cache.extend(entries))?;
        Ok(())
    }

    pub fn reset_name_cache(&self) -> AurumResult<()> {
        self.update_generic(|cfg| cfg.name_cache.clear())?;
        Ok(())
    }

    /// Ok(None) means "materialize defaults": the file is absent, or
    /// it exists but no longer parses (it will be rewritten whole).
    fn try_read<T: DeserializeOwned>(&self, file: &str) -> AurumResult<Option<T>> {
        let path = self.path(file);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AurumError::StoreIo(e.to_string())),
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(file, error = %e, "unreadable config section, resetting to defaults");
                Ok(None)
            }
        }
    }

    fn write_section<T: Serialize>(&self, file: &str, value: &T) -> AurumResult<()> {
        let body = serde_json::to_string_pretty(value)
            .map_err(|e| AurumError::StoreFormat(e.to_string()))?;
        fs::write(self.path(file), body).map_err(|e| AurumError::StoreIo(e.to_string()))
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("dir", &self.dir)
            .field("scope", &self.scope)
            .finish()
    }
}
