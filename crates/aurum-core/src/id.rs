//! Ledger identity types
//!
//! Every account in the remote ledger lives in one flat namespace per
//! scope. Player accounts use the raw profile id as their key; shared
//! storage accounts encode their block position as `[C@x,y,z]` so the
//! two kinds can share the namespace without collision.

use std::fmt;

use crate::BlockPos;

/// Session scope - the world identifier partitioning ledger records
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(String);

impl ScopeId {
    pub fn new(id: impl Into<String>) -> Self {
        ScopeId(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope({})", self.0)
    }
}

/// Account identity within a scope's flat ledger namespace
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccountId {
    /// A player's personal account, keyed by profile id
    Player(String),
    /// A declared shared storage, keyed by position
    Storage(BlockPos),
}

const STORAGE_OPEN: &str = "[C@";
const STORAGE_CLOSE: &str = "]";

impl AccountId {
    pub fn player(id: impl Into<String>) -> Self {
        AccountId::Player(id.into())
    }

    pub fn storage(pos: BlockPos) -> Self {
        AccountId::Storage(pos)
    }

    /// Decode a ledger key. Keys matching the exact `[C@x,y,z]` codec
    /// become storage accounts; everything else is a player id.
    pub fn parse(raw: &str) -> AccountId {
        raw.strip_prefix(STORAGE_OPEN)
            .and_then(|rest| rest.strip_suffix(STORAGE_CLOSE))
            .and_then(|inner| inner.parse::<BlockPos>().ok())
            .map(AccountId::Storage)
            .unwrap_or_else(|| AccountId::Player(raw.to_string()))
    }

    #[inline]
    pub fn is_storage(&self) -> bool {
        matches!(self, AccountId::Storage(_))
    }

    pub fn storage_pos(&self) -> Option<BlockPos> {
        match self {
            AccountId::Storage(pos) => Some(*pos),
            AccountId::Player(_) => None,
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountId::Player(id) => f.write_str(id),
            AccountId::Storage(pos) => write!(f, "{STORAGE_OPEN}{pos}{STORAGE_CLOSE}"),
        }
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountId::Player(id) => write!(f, "Player({id})"),
            AccountId::Storage(pos) => write!(f, "Storage({pos})"),
        }
    }
}
