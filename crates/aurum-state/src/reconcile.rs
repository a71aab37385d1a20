//! Reconciliation planner
//!
//! Compares the remote ledger's shared-storage subset against the
//! local registry and produces the minimal set of corrections:
//! - remove storages whose block is loaded but no longer a valid kind
//!   (the physical storage was destroyed or replaced)
//! - add storages known remotely but not locally, copying the remote
//!   quantity without re-pushing it
//!
//! Unloaded additions are skipped at apply time and retried on the
//! next pass. Applying the same plan twice is harmless: every step is
//! idempotent.

use aurum_core::BlockPos;

use crate::{StorageRegistry, WorldProbe};

/// Corrections to converge the registry on the remote set
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReconcilePlan {
    /// Wipe remotely and renounce locally
    pub removals: Vec<BlockPos>,
    /// Declare locally with the remote quantity
    pub additions: Vec<(BlockPos, f64)>,
}

impl ReconcilePlan {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.additions.is_empty()
    }
}

/// Counts surfaced to the caller after a pass is applied
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub removed: u32,
    pub added: u32,
    pub skipped_not_loaded: u32,
}

impl ReconcileReport {
    /// Whether the pass changed anything locally or remotely
    #[inline]
    pub fn changed(&self) -> bool {
        self.removed > 0 || self.added > 0
    }
}

/// Build the correction plan for one pass
pub fn plan(
    remote_storages: &[(BlockPos, f64)],
    registry: &StorageRegistry,
    world: &impl WorldProbe,
) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();

    for &(pos, quantity) in remote_storages {
        match world.block_at(pos) {
            Some(block) if !block.is_valid_storage() => plan.removals.push(pos),
            _ => {
                if !registry.contains(pos) {
                    plan.additions.push((pos, quantity));
                }
            }
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::MapWorld;
    use aurum_core::{Block, ScopeId};
    use aurum_store::ConfigStore;

    fn store(tag: &str) -> ConfigStore {
        let dir =
            std::env::temp_dir().join(format!("aurum-reconcile-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        ConfigStore::open(dir, ScopeId::new("world")).unwrap()
    }

    #[test]
    fn test_plan_partitions_remote_set() {
        let store = store("partition");
        let mut registry = StorageRegistry::default();

        let kept = BlockPos::new(0, 64, 0);
        let destroyed = BlockPos::new(1, 64, 0);
        let unknown = BlockPos::new(2, 64, 0);
        let unloaded = BlockPos::new(3, 64, 0);
        let world = MapWorld::new([
            (kept, Block::Barrel),
            (destroyed, Block::Other("air".into())),
            (unknown, Block::Barrel),
        ]);

        registry.declare(&store, &world, kept).unwrap();

        let remote = vec![
            (kept, 10.0),
            (destroyed, 5.0),
            (unknown, 40.0),
            (unloaded, 7.0),
        ];
        let plan = plan(&remote, &registry, &world);

        assert_eq!(plan.removals, vec![destroyed]);
        assert_eq!(plan.additions, vec![(unknown, 40.0), (unloaded, 7.0)]);
    }

    #[test]
    fn test_plan_is_empty_when_converged() {
        let store = store("converged");
        let mut registry = StorageRegistry::default();
        let pos = BlockPos::new(0, 64, 0);
        let world = MapWorld::new([(pos, Block::Barrel)]);
        registry.declare(&store, &world, pos).unwrap();

        let plan = plan(&[(pos, 10.0)], &registry, &world);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_destroyed_but_undeclared_still_removed() {
        // Remote knows a storage whose block is now something else and
        // which this client never declared: the wipe must still go out.
        let registry = StorageRegistry::default();
        let pos = BlockPos::new(4, 64, 4);
        let world = MapWorld::new([(pos, Block::Chest { single: false })]);

        let plan = plan(&[(pos, 3.0)], &registry, &world);
        assert_eq!(plan.removals, vec![pos]);
        assert!(plan.additions.is_empty());
    }
}
