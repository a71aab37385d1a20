//! Host abstraction
//!
//! The narrow contract between the tracker and the game client it
//! runs inside. Everything the engine needs from the world goes
//! through this trait; everything else stays out of scope.

use std::fmt;

use aurum_core::{Block, BlockPos, EventKind, ItemStack};
use aurum_state::WorldProbe;

/// Game mode as reported by the host
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameMode {
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl GameMode {
    /// Whether the tracker may run in this mode
    #[inline]
    pub fn allows_tracking(&self) -> bool {
        !matches!(self, GameMode::Creative)
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameMode::Survival => "survival",
            GameMode::Creative => "creative",
            GameMode::Adventure => "adventure",
            GameMode::Spectator => "spectator",
        };
        f.write_str(name)
    }
}

/// Handle for one registered event subscription
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

/// The game client as seen by the tracker
pub trait Host {
    /// The local player's profile id
    fn player_id(&self) -> String;

    /// World identifier partitioning ledger records. None when the
    /// session cannot be identified (e.g. singleplayer).
    fn scope_id(&self) -> Option<String>;

    fn game_mode(&self) -> GameMode;

    /// Carry-space contents: main inventory plus hotbar
    fn carried_slots(&self) -> Vec<ItemStack>;

    /// Container region of the currently open screen
    fn container_slots(&self) -> Vec<ItemStack>;

    /// Block at `pos`, None when the position is not loaded
    fn block_at(&self, pos: BlockPos) -> Option<Block>;

    /// Block position under the crosshair, within reach
    fn crosshair_target(&self) -> Option<BlockPos>;

    /// Register interest in an event category
    fn subscribe(&mut self, kind: EventKind) -> SubscriptionHandle;

    /// Release one subscription
    fn unsubscribe(&mut self, handle: SubscriptionHandle);
}

/// [`WorldProbe`] adapter over a host borrow
pub struct HostWorld<'a, H: Host>(pub &'a H);

impl<H: Host> WorldProbe for HostWorld<'_, H> {
    fn block_at(&self, pos: BlockPos) -> Option<Block> {
        self.0.block_at(pos)
    }
}
