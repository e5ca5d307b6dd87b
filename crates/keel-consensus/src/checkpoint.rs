//! Checkpoint verification and the sync-checkpoint reorg gate.
//!
//! Provides functions to verify that blocks at checkpoint heights match the
//! expected hash, to resolve the most recent checkpoint block the node
//! actually knows, and to reject reorgs that would unwind too far behind
//! the best tip.
//!
//! # Attack vectors
//!
//! - **Long-range rewrite:** Without checkpoints an attacker with sufficient
//!   hash power could rewrite arbitrarily deep history. Hardened checkpoints
//!   pin known-good blocks so that any chain presenting a different hash at
//!   a pinned height is rejected outright.
//!
//! - **Deep reorg during sync:** Even between checkpoints, [`check_sync`]
//!   bounds how far back a reorganization may reach: at most
//!   [`CHECKPOINT_SPAN`] blocks behind the current best tip.
//!
//! - **Checkpoint spoofing:** The checkpoint tables are compiled into the
//!   binary. An attacker would need to distribute a modified binary to
//!   exploit this, which is outside our threat model.
//!
//! # Usage
//!
//! The node layer calls [`check_hardened`] when connecting a block whose
//! height is known, and [`check_sync`] before allowing a reorganization to
//! disconnect blocks at or below a candidate height. [`last_checkpoint`]
//! and [`total_blocks_estimate`] feed chain-selection decisions and sync
//! progress display respectively.
//!
//! Every function is a pure read of the checkpoint table and, where one is
//! taken, the caller's block index; nothing is cached between calls, so the
//! sync checkpoint tracks the best tip as it advances. Callers hold whatever
//! read lock already guards the index for the duration of the call.

use keel_core::chain_index::{BlockIndex, BlockIndexEntry};
use keel_core::checkpoints::{checkpoint_table, CHECKPOINT_SPAN};
use keel_core::constants::NetworkType;
use keel_core::types::Hash256;
use tracing::{debug, warn};

/// Verify that a block at `height` is consistent with the hardened
/// checkpoints of `network`.
///
/// Returns true when no checkpoint exists at `height` (unconstrained heights
/// are permitted), so block acceptance can call this unconditionally for
/// every height. When a checkpoint exists, returns true iff `hash` matches
/// the pinned hash.
pub fn check_hardened(network: NetworkType, height: u64, hash: &Hash256) -> bool {
    check_hardened_with(checkpoint_table(network), height, hash)
}

/// Like [`check_hardened`] but takes an explicit checkpoint table.
///
/// This is the testable core: production code passes the compiled-in table,
/// while tests can supply their own.
pub fn check_hardened_with(table: &[(u64, Hash256)], height: u64, hash: &Hash256) -> bool {
    match table.iter().find(|&&(cp_height, _)| cp_height == height) {
        Some((_, expected)) if expected == hash => true,
        Some((_, expected)) => {
            warn!(height, got = %hash, want = %expected, "checkpoint: hardened checkpoint mismatch");
            false
        }
        None => true,
    }
}

/// Height of the highest checkpoint for `network`, or 0 with no checkpoints.
///
/// A lower bound on total chain length, used for sync progress display only.
pub fn total_blocks_estimate(network: NetworkType) -> u64 {
    total_blocks_estimate_with(checkpoint_table(network))
}

/// Like [`total_blocks_estimate`] but takes an explicit checkpoint table.
pub fn total_blocks_estimate_with(table: &[(u64, Hash256)]) -> u64 {
    // Tables are ordered by strictly increasing height.
    table.last().map(|&(height, _)| height).unwrap_or(0)
}

/// The highest checkpoint of `network` whose block is present in `index`.
///
/// Scans checkpoints from highest to lowest height and returns the first
/// entry found in the index. `None` means none of the checkpoint blocks are
/// known yet (expected during early sync), not an error.
pub fn last_checkpoint<'a>(
    network: NetworkType,
    index: &'a BlockIndex,
) -> Option<&'a BlockIndexEntry> {
    last_checkpoint_with(checkpoint_table(network), index)
}

/// Like [`last_checkpoint`] but takes an explicit checkpoint table.
pub fn last_checkpoint_with<'a>(
    table: &[(u64, Hash256)],
    index: &'a BlockIndex,
) -> Option<&'a BlockIndexEntry> {
    table.iter().rev().find_map(|(_, hash)| index.get(hash))
}

/// Automatically select a suitable sync checkpoint: the reorg boundary
/// roughly [`CHECKPOINT_SPAN`] blocks behind the current best tip.
///
/// Walks parent links backward from the best tip while the walked entry is
/// still within the span window, and returns the entry the walk stops on:
/// the ancestor at `tip.height - CHECKPOINT_SPAN`, or genesis when the chain
/// is shorter than the span. The boundary therefore moves as the tip
/// advances; the result is re-derived on every call.
///
/// The walk deliberately returns the *oldest* ancestor still reachable
/// within the window rather than the newest at the boundary. That cutoff is
/// reorg-depth policy and is pinned by tests; do not "fix" it.
///
/// Returns `None` only when the index has no best tip, which violates the
/// caller's obligation to establish a valid chain state first.
pub fn auto_select_sync_checkpoint(index: &BlockIndex) -> Option<&BlockIndexEntry> {
    let tip = index.best_tip()?;
    let mut current = tip;
    while current.height.saturating_add(CHECKPOINT_SPAN) > tip.height {
        match index.parent(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    Some(current)
}

/// Check a candidate height against the synchronized checkpoint.
///
/// Returns true iff `height` is strictly above the sync checkpoint selected
/// by [`auto_select_sync_checkpoint`]. Heights at or behind the boundary are
/// unsafe to reorganize past and are rejected, as is everything when no
/// best tip exists yet.
pub fn check_sync(index: &BlockIndex, height: u64) -> bool {
    let Some(sync) = auto_select_sync_checkpoint(index) else {
        debug!(height, "checkpoint: no sync checkpoint available, rejecting");
        return false;
    };
    if height <= sync.height {
        debug!(
            height,
            sync_height = sync.height,
            "checkpoint: height at or behind sync checkpoint"
        );
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A test-only checkpoint table with two entries.
    const TEST_CHECKPOINTS: &[(u64, Hash256)] = &[
        (10, Hash256([0xAA; 32])),
        (50, Hash256([0xBB; 32])),
    ];

    /// Deterministic synthetic block hash for a height.
    fn block_hash(height: u64) -> Hash256 {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&height.to_le_bytes());
        bytes[31] = 0x4B;
        Hash256(bytes)
    }

    /// Linear chain at heights 0..=tip_height with synthetic hashes,
    /// best tip at the end.
    fn build_chain(tip_height: u64) -> BlockIndex {
        let mut index = BlockIndex::new();
        index.insert(block_hash(0), 0, None).unwrap();
        for h in 1..=tip_height {
            index.insert(block_hash(h), h, Some(block_hash(h - 1))).unwrap();
        }
        index.set_best(&block_hash(tip_height)).unwrap();
        index
    }

    // ------------------------------------------------------------------
    // check_hardened
    // ------------------------------------------------------------------

    #[test]
    fn hardened_passes_for_matching_hash() {
        assert!(check_hardened_with(TEST_CHECKPOINTS, 10, &Hash256([0xAA; 32])));
        assert!(check_hardened_with(TEST_CHECKPOINTS, 50, &Hash256([0xBB; 32])));
    }

    #[test]
    fn hardened_fails_for_wrong_hash() {
        assert!(!check_hardened_with(TEST_CHECKPOINTS, 10, &Hash256([0xFF; 32])));
        assert!(!check_hardened_with(TEST_CHECKPOINTS, 50, &Hash256([0x00; 32])));
        // The other checkpoint's hash is still wrong at this height.
        assert!(!check_hardened_with(TEST_CHECKPOINTS, 10, &Hash256([0xBB; 32])));
    }

    #[test]
    fn hardened_passes_for_unconstrained_heights() {
        let arbitrary = Hash256([0xDE; 32]);
        for height in [0, 5, 11, 49, 51, 100, u64::MAX] {
            assert!(
                check_hardened_with(TEST_CHECKPOINTS, height, &arbitrary),
                "height {height} should pass with no checkpoint"
            );
        }
    }

    #[test]
    fn hardened_mainnet_genesis() {
        let table = checkpoint_table(NetworkType::Mainnet);
        let (height, pinned) = table[0];
        assert!(check_hardened(NetworkType::Mainnet, height, &pinned));
        assert!(!check_hardened(NetworkType::Mainnet, height, &Hash256([0x01; 32])));
    }

    #[test]
    fn hardened_testnet_is_unconstrained() {
        // Testnet has no checkpoints: every (height, hash) pair passes.
        assert!(check_hardened(NetworkType::Testnet, 0, &Hash256([0x07; 32])));
        assert!(check_hardened(NetworkType::Testnet, 3767, &Hash256([0x07; 32])));
    }

    // ------------------------------------------------------------------
    // total_blocks_estimate
    // ------------------------------------------------------------------

    #[test]
    fn estimate_is_highest_checkpoint_height() {
        assert_eq!(total_blocks_estimate_with(TEST_CHECKPOINTS), 50);
        assert_eq!(total_blocks_estimate(NetworkType::Mainnet), 3767);
    }

    #[test]
    fn estimate_empty_table_is_zero() {
        assert_eq!(total_blocks_estimate_with(&[]), 0);
        assert_eq!(total_blocks_estimate(NetworkType::Testnet), 0);
    }

    // ------------------------------------------------------------------
    // last_checkpoint
    // ------------------------------------------------------------------

    #[test]
    fn last_checkpoint_prefers_highest_present() {
        // Index knows blocks at heights 0..=60 whose hashes at 10 and 50
        // match the test checkpoints.
        let mut index = BlockIndex::new();
        let hash_at = |h: u64| match h {
            10 => Hash256([0xAA; 32]),
            50 => Hash256([0xBB; 32]),
            _ => block_hash(h),
        };
        index.insert(hash_at(0), 0, None).unwrap();
        for h in 1..=60 {
            index.insert(hash_at(h), h, Some(hash_at(h - 1))).unwrap();
        }

        let found = last_checkpoint_with(TEST_CHECKPOINTS, &index).unwrap();
        assert_eq!(found.height, 50);
        assert_eq!(found.hash, Hash256([0xBB; 32]));
    }

    #[test]
    fn last_checkpoint_falls_back_to_lower_entry() {
        // Only the height-10 checkpoint block is known.
        let mut index = BlockIndex::new();
        let hash_at = |h: u64| if h == 10 { Hash256([0xAA; 32]) } else { block_hash(h) };
        index.insert(hash_at(0), 0, None).unwrap();
        for h in 1..=20 {
            index.insert(hash_at(h), h, Some(hash_at(h - 1))).unwrap();
        }

        let found = last_checkpoint_with(TEST_CHECKPOINTS, &index).unwrap();
        assert_eq!(found.height, 10);
    }

    #[test]
    fn last_checkpoint_none_when_absent() {
        // Early sync: none of the checkpoint blocks are known yet.
        let index = build_chain(5);
        assert!(last_checkpoint_with(TEST_CHECKPOINTS, &index).is_none());

        // Empty index behaves the same.
        let empty = BlockIndex::new();
        assert!(last_checkpoint_with(TEST_CHECKPOINTS, &empty).is_none());
        assert!(last_checkpoint(NetworkType::Mainnet, &empty).is_none());
    }

    #[test]
    fn last_checkpoint_spec_scenario() {
        // Table {(0, H0), (5, H5)}; index holds blocks at heights 0, 3, 5
        // with hashes H0, H3, H5.
        let h0 = Hash256([0x10; 32]);
        let h3 = Hash256([0x13; 32]);
        let h5 = Hash256([0x15; 32]);
        let table: &[(u64, Hash256)] = &[(0, h0), (5, h5)];

        let mut index = BlockIndex::new();
        let hash_at = |h: u64| match h {
            0 => h0,
            3 => h3,
            5 => h5,
            _ => block_hash(h),
        };
        index.insert(hash_at(0), 0, None).unwrap();
        for h in 1..=5 {
            index.insert(hash_at(h), h, Some(hash_at(h - 1))).unwrap();
        }

        let found = last_checkpoint_with(table, &index).unwrap();
        assert_eq!(found.height, 5);
        assert_eq!(found.hash, h5);

        assert!(check_hardened_with(table, 5, &h5));
        assert!(!check_hardened_with(table, 5, &h3));
        assert!(check_hardened_with(table, 3, &h3));
        assert!(check_hardened_with(table, 3, &Hash256([0x99; 32])));
    }

    // ------------------------------------------------------------------
    // auto_select_sync_checkpoint
    // ------------------------------------------------------------------

    #[test]
    fn sync_checkpoint_is_genesis_for_short_chain() {
        let index = build_chain(100);
        let sync = auto_select_sync_checkpoint(&index).unwrap();
        assert_eq!(sync.height, 0);
        assert_eq!(sync.hash, block_hash(0));
    }

    #[test]
    fn sync_checkpoint_single_block_chain() {
        let index = build_chain(0);
        let sync = auto_select_sync_checkpoint(&index).unwrap();
        assert_eq!(sync.height, 0);
    }

    #[test]
    fn sync_checkpoint_at_exact_span_depth() {
        // Depth equals the span: the boundary and genesis coincide.
        let index = build_chain(CHECKPOINT_SPAN);
        let sync = auto_select_sync_checkpoint(&index).unwrap();
        assert_eq!(sync.height, 0);
    }

    #[test]
    fn sync_checkpoint_trails_tip_by_span() {
        let tip_height = CHECKPOINT_SPAN + 1000;
        let index = build_chain(tip_height);
        let sync = auto_select_sync_checkpoint(&index).unwrap();
        assert_eq!(sync.height, tip_height - CHECKPOINT_SPAN);
        assert_eq!(sync.hash, block_hash(tip_height - CHECKPOINT_SPAN));
    }

    #[test]
    fn sync_checkpoint_moves_with_tip() {
        // Not cached: advancing the best tip shifts the boundary.
        let tip_height = CHECKPOINT_SPAN + 10;
        let mut index = build_chain(tip_height);
        assert_eq!(auto_select_sync_checkpoint(&index).unwrap().height, 10);

        index
            .insert(block_hash(tip_height + 1), tip_height + 1, Some(block_hash(tip_height)))
            .unwrap();
        index.set_best(&block_hash(tip_height + 1)).unwrap();
        assert_eq!(auto_select_sync_checkpoint(&index).unwrap().height, 11);
    }

    #[test]
    fn sync_checkpoint_none_for_empty_index() {
        let index = BlockIndex::new();
        assert!(auto_select_sync_checkpoint(&index).is_none());
    }

    // ------------------------------------------------------------------
    // check_sync
    // ------------------------------------------------------------------

    #[test]
    fn check_sync_gates_at_boundary() {
        let tip_height = CHECKPOINT_SPAN + 1000;
        let index = build_chain(tip_height);
        let boundary = tip_height - CHECKPOINT_SPAN;

        assert!(!check_sync(&index, 0));
        assert!(!check_sync(&index, boundary - 1));
        assert!(!check_sync(&index, boundary));
        assert!(check_sync(&index, boundary + 1));
        assert!(check_sync(&index, tip_height));
        assert!(check_sync(&index, tip_height + 500));
    }

    #[test]
    fn check_sync_short_chain_rejects_only_genesis() {
        // Boundary is genesis, so every height above 0 is safe.
        let index = build_chain(50);
        assert!(!check_sync(&index, 0));
        assert!(check_sync(&index, 1));
        assert!(check_sync(&index, 50));
    }

    #[test]
    fn check_sync_rejects_without_chain_state() {
        let index = BlockIndex::new();
        assert!(!check_sync(&index, 1));
        assert!(!check_sync(&index, u64::MAX));
    }
}
