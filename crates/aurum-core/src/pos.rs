//! Block positions and their string encoding
//!
//! Positions key both the local registry and (bracketed, see
//! [`crate::AccountId`]) the shared-storage identities on the ledger.
//! The encoding is deterministic and reversible.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AurumError;

/// Integer block position in the world
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    #[inline]
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        BlockPos { x, y, z }
    }

    /// Registry key encoding: `"x,y,z"`
    pub fn pos_key(&self) -> String {
        format!("{},{},{}", self.x, self.y, self.z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

impl fmt::Debug for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({},{},{})", self.x, self.y, self.z)
    }
}

impl FromStr for BlockPos {
    type Err = AurumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 3 {
            return Err(AurumError::InvalidPositionKey(s.to_string()));
        }
        let coord = |i: usize| {
            parts[i]
                .trim()
                .parse::<i32>()
                .map_err(|_| AurumError::InvalidPositionKey(s.to_string()))
        };
        Ok(BlockPos::new(coord(0)?, coord(1)?, coord(2)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_key_roundtrip() {
        let pos = BlockPos::new(1, 64, -12);
        let key = pos.pos_key();
        assert_eq!(key, "1,64,-12");
        assert_eq!(key.parse::<BlockPos>().unwrap(), pos);
    }

    #[test]
    fn test_pos_key_rejects_malformed() {
        assert!("1,64".parse::<BlockPos>().is_err());
        assert!("1,64,2,3".parse::<BlockPos>().is_err());
        assert!("1,sixty-four,2".parse::<BlockPos>().is_err());
        assert!("".parse::<BlockPos>().is_err());
    }
}
