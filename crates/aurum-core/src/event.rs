//! World events delivered by the host
//!
//! The tracker is event-driven: the host game client delivers these
//! one at a time, in order, and every handler runs to completion
//! before the next is dispatched.

use crate::{BlockPos, ItemStack};

/// Which inventory region a slot belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotRegion {
    /// The player's own carry-space (main inventory + hotbar)
    Carry,
    /// The open screen's container slots
    Container,
}

/// Which kind of storage location an opened screen fronts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerSite {
    /// The player's private overflow container
    Reserve,
    /// Any other world container
    Shared,
}

/// Discrete trigger from the host
#[derive(Clone, Debug, PartialEq)]
pub enum WorldEvent {
    /// A tracked-or-not item landed in carry-space
    ItemPickup { item: ItemStack },
    /// A single-slot transfer out of the given region
    SlotDrop {
        region: SlotRegion,
        stack: Option<ItemStack>,
    },
    /// A container screen opened
    ContainerOpened { site: ContainerSite },
    /// The open screen closed
    ScreenClosed,
    /// The player started breaking a block
    BlockAttacked { pos: BlockPos },
    /// The player finished breaking the attacked block
    BlockBreakFinished,
    /// Fixed world tick
    Tick { world_tick: u64 },
    /// Joined a world/session
    WorldJoined,
    /// Moved between dimensions within the session
    DimensionChanged,
}

/// Event categories for subscription management
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    ItemPickup,
    SlotDrop,
    ContainerOpened,
    ScreenClosed,
    BlockAttacked,
    BlockBreakFinished,
    Tick,
    WorldJoined,
    DimensionChanged,
}

impl EventKind {
    /// Everything the tracker subscribes to on attach
    pub const ALL: [EventKind; 9] = [
        EventKind::ItemPickup,
        EventKind::SlotDrop,
        EventKind::ContainerOpened,
        EventKind::ScreenClosed,
        EventKind::BlockAttacked,
        EventKind::BlockBreakFinished,
        EventKind::Tick,
        EventKind::WorldJoined,
        EventKind::DimensionChanged,
    ];
}

impl WorldEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WorldEvent::ItemPickup { .. } => EventKind::ItemPickup,
            WorldEvent::SlotDrop { .. } => EventKind::SlotDrop,
            WorldEvent::ContainerOpened { .. } => EventKind::ContainerOpened,
            WorldEvent::ScreenClosed => EventKind::ScreenClosed,
            WorldEvent::BlockAttacked { .. } => EventKind::BlockAttacked,
            WorldEvent::BlockBreakFinished => EventKind::BlockBreakFinished,
            WorldEvent::Tick { .. } => EventKind::Tick,
            WorldEvent::WorldJoined => EventKind::WorldJoined,
            WorldEvent::DimensionChanged => EventKind::DimensionChanged,
        }
    }
}
