//! Shared storage declarations
//!
//! A shared storage is a world container players have explicitly
//! declared into the pool. Only barrels and single-variant chests are
//! accepted; double chests would straddle two positions and break the
//! position-keyed identity.

use serde::{Deserialize, Serialize};

/// Accepted shared storage block kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageKind {
    #[serde(rename = "singleChest")]
    SingleChest,
    #[serde(rename = "barrel")]
    Barrel,
}

/// A declared shared storage's locally cached record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeclaredStorage {
    pub kind: StorageKind,
    pub quantity: f64,
    #[serde(default)]
    pub nickname: Option<String>,
}

impl DeclaredStorage {
    /// Fresh declaration: empty until gold is observed moving in
    pub fn new(kind: StorageKind) -> Self {
        DeclaredStorage {
            kind,
            quantity: 0.0,
            nickname: None,
        }
    }
}

/// What occupies a world position, as reported by the host
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Barrel,
    Chest { single: bool },
    Other(String),
}

impl Block {
    /// The storage kind this block would register as, if accepted
    pub fn storage_kind(&self) -> Option<StorageKind> {
        match self {
            Block::Barrel => Some(StorageKind::Barrel),
            Block::Chest { single: true } => Some(StorageKind::SingleChest),
            Block::Chest { single: false } | Block::Other(_) => None,
        }
    }

    /// Whether the block may hold a declared storage
    #[inline]
    pub fn is_valid_storage(&self) -> bool {
        self.storage_kind().is_some()
    }
}
