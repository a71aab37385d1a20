//! Leaderboard projection
//!
//! Pure data view over the last pull: entries sorted by quantity,
//! nicknames substituted for storage identities and display names for
//! players, truncated to the configured limit. Rendering is the
//! host's problem.

use std::collections::BTreeMap;

use aurum_core::AccountId;
use aurum_ledger::LedgerSnapshot;
use aurum_state::StorageRegistry;

/// One leaderboard row
#[derive(Clone, Debug, PartialEq)]
pub struct BoardEntry {
    pub label: String,
    pub quantity: f64,
}

/// Compiled leaderboard for display
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Board {
    /// Highest quantities first, at most the configured limit
    pub entries: Vec<BoardEntry>,
    /// Pool total across all records, including hidden ones
    pub total: f64,
    /// Entries truncated away by the limit
    pub hidden: usize,
}

/// Build the board from pulled records
pub fn compile(
    records: &LedgerSnapshot,
    names: &BTreeMap<String, String>,
    registry: &StorageRegistry,
    limit: usize,
) -> Board {
    let mut entries: Vec<BoardEntry> = records
        .entries()
        .map(|(id, quantity)| {
            let label = match id {
                AccountId::Player(raw) => names.get(raw).cloned().unwrap_or_else(|| raw.clone()),
                AccountId::Storage(pos) => registry
                    .nickname(*pos)
                    .map(str::to_string)
                    .unwrap_or_else(|| id.to_string()),
            };
            BoardEntry { label, quantity }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.quantity
            .partial_cmp(&a.quantity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });

    let total = records.total();
    let hidden = entries.len().saturating_sub(limit);
    entries.truncate(limit);

    Board {
        entries,
        total,
        hidden,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurum_core::{Block, BlockPos, ScopeId};
    use aurum_state::WorldProbe;
    use aurum_store::ConfigStore;

    struct OneBarrel(BlockPos);

    impl WorldProbe for OneBarrel {
        fn block_at(&self, pos: BlockPos) -> Option<Block> {
            (pos == self.0).then_some(Block::Barrel)
        }
    }

    fn registry_with_nickname(pos: BlockPos, nickname: &str) -> StorageRegistry {
        let dir = std::env::temp_dir().join(format!(
            "aurum-board-{nickname}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        let store = ConfigStore::open(dir, ScopeId::new("world")).unwrap();
        let mut registry = StorageRegistry::default();
        registry.declare(&store, &OneBarrel(pos), pos).unwrap();
        registry
            .set_nickname(&store, pos, Some(nickname.to_string()))
            .unwrap();
        registry
    }

    #[test]
    fn test_sorted_labelled_and_truncated() {
        let pos = BlockPos::new(1, 64, 1);
        let registry = registry_with_nickname(pos, "vault");
        let records = LedgerSnapshot::from_raw([
            ("aaa".to_string(), 10.0),
            ("bbb".to_string(), 120.0),
            ("[C@1,64,1]".to_string(), 40.0),
            ("[C@9,64,9]".to_string(), 5.0),
        ]);
        let mut names = BTreeMap::new();
        names.insert("bbb".to_string(), "Steve".to_string());

        let board = compile(&records, &names, &registry, 3);

        let labels: Vec<&str> = board.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["Steve", "vault", "aaa"]);
        assert_eq!(board.hidden, 1);
        assert!((board.total - 175.0).abs() < 1e-9);
    }

    #[test]
    fn test_unresolved_ids_fall_back_to_raw() {
        let records = LedgerSnapshot::from_raw([("mystery".to_string(), 1.0)]);
        let board = compile(&records, &BTreeMap::new(), &StorageRegistry::default(), 5);
        assert_eq!(board.entries[0].label, "mystery");
        assert_eq!(board.hidden, 0);
    }

    #[test]
    fn test_empty_records() {
        let board = compile(
            &LedgerSnapshot::default(),
            &BTreeMap::new(),
            &StorageRegistry::default(),
            5,
        );
        assert!(board.entries.is_empty());
        assert_eq!(board.total, 0.0);
    }
}
