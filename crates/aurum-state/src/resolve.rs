//! Delta resolver
//!
//! Infers how much gold moved into or out of a storage location from
//! the before/after carried-quantity difference alone. Equal and
//! opposite transfers within one interaction cancel out and are
//! invisible to the diff; the explicit-drop flag is the only channel
//! that corrects for that, and only for single-slot deposits.

use crate::Snapshot;

/// How a close resolved
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Resolution {
    /// Gold moved from carry-space into the location
    MovedIn { amount: f64, new_location: f64 },
    /// Gold moved from the location into carry-space
    MovedOut { amount: f64, new_location: f64 },
    /// Carried tally unchanged, but a single-slot deposit was observed
    /// so the snapshot's live-updated location value is trusted
    Corrected { new_location: f64 },
    /// Carried tally unchanged: the blind spot, nothing to persist
    Unchanged,
}

impl Resolution {
    /// The location quantity to persist, when there is one
    pub fn new_location(&self) -> Option<f64> {
        match *self {
            Resolution::MovedIn { new_location, .. }
            | Resolution::MovedOut { new_location, .. }
            | Resolution::Corrected { new_location } => Some(new_location),
            Resolution::Unchanged => None,
        }
    }

    /// Whether gold was redistributed between carry-space and the location
    #[inline]
    pub fn redistributed(&self) -> bool {
        matches!(
            self,
            Resolution::MovedIn { .. } | Resolution::MovedOut { .. }
        )
    }
}

/// Resolve one open/close pair. `current_carried` is the carry-space
/// tally at close; `explicit_drop` is the shared snapshot's drop flag
/// (always false for the reserve, whose drops persist directly).
pub fn resolve(opened: Snapshot, current_carried: f64, explicit_drop: bool) -> Resolution {
    if current_carried < opened.carried {
        let amount = opened.carried - current_carried;
        Resolution::MovedIn {
            amount,
            new_location: opened.location + amount,
        }
    } else if current_carried > opened.carried {
        let amount = current_carried - opened.carried;
        Resolution::MovedOut {
            amount,
            new_location: opened.location - amount,
        }
    } else if explicit_drop {
        Resolution::Corrected {
            new_location: opened.location,
        }
    } else {
        Resolution::Unchanged
    }
}
