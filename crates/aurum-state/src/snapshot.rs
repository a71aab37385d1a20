//! Interaction snapshots
//!
//! A snapshot is captured the moment a storage location opens and
//! consumed when it closes; it never outlives one open/close pair and
//! is never persisted. The reserve and shared slots are independent
//! and never aliased.

use aurum_core::{BlockPos, ItemStack, WeightTable};

/// Carried/location quantity pair captured at interaction start
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Snapshot {
    /// Gold tallied across carry-space when the location opened
    pub carried: f64,
    /// Gold tallied inside the location when it opened
    pub location: f64,
}

/// Open shared-storage interaction
#[derive(Clone, Debug, PartialEq)]
pub struct SharedSnapshot {
    pub quantities: Snapshot,
    /// The declared storage under interaction, when recognized
    pub position: Option<BlockPos>,
    /// A tracked item was deposited via a single-slot transfer
    pub explicit_drop: bool,
    /// The opened container was not a declared storage at open time
    pub undeclared_at_open: bool,
}

/// Holds the at-most-one open snapshot per storage location kind
#[derive(Debug, Default)]
pub struct SnapshotTracker {
    reserve: Option<Snapshot>,
    shared: Option<SharedSnapshot>,
}

impl SnapshotTracker {
    pub fn new() -> Self {
        SnapshotTracker::default()
    }

    /// Capture the reserve (private overflow) interaction
    pub fn open_reserve(
        &mut self,
        weights: &WeightTable,
        carried: &[ItemStack],
        location: &[ItemStack],
    ) {
        self.reserve = Some(Snapshot {
            carried: weights.tally(carried),
            location: weights.tally(location),
        });
    }

    /// Capture a shared-storage interaction. `declared_position` is the
    /// opened container's position when it is a recognized declared
    /// storage; quantities are recorded either way so a drop landing
    /// after a late declare still resolves correctly.
    pub fn open_shared(
        &mut self,
        weights: &WeightTable,
        carried: &[ItemStack],
        location: &[ItemStack],
        declared_position: Option<BlockPos>,
    ) {
        self.shared = Some(SharedSnapshot {
            quantities: Snapshot {
                carried: weights.tally(carried),
                location: weights.tally(location),
            },
            undeclared_at_open: declared_position.is_none(),
            position: declared_position,
            explicit_drop: false,
        });
    }

    /// Re-baseline any open snapshot from the live slot contents.
    /// Used when tracked items enter or leave mid-interaction.
    pub fn refresh(&mut self, weights: &WeightTable, carried: &[ItemStack], location: &[ItemStack]) {
        if let Some(snapshot) = self.reserve.as_mut() {
            snapshot.carried = weights.tally(carried);
            snapshot.location = weights.tally(location);
        }
        if let Some(shared) = self.shared.as_mut() {
            shared.quantities.carried = weights.tally(carried);
            shared.quantities.location = weights.tally(location);
        }
    }

    /// Raise the explicit-drop flag on the open shared interaction
    pub fn flag_explicit_drop(&mut self) {
        if let Some(shared) = self.shared.as_mut() {
            shared.explicit_drop = true;
        }
    }

    #[inline]
    pub fn reserve_open(&self) -> bool {
        self.reserve.is_some()
    }

    #[inline]
    pub fn shared_open(&self) -> bool {
        self.shared.is_some()
    }

    /// Consume the reserve snapshot on close
    pub fn take_reserve(&mut self) -> Option<Snapshot> {
        self.reserve.take()
    }

    /// Consume the shared snapshot on close
    pub fn take_shared(&mut self) -> Option<SharedSnapshot> {
        self.shared.take()
    }
}
