//! In-memory block index: every known block header and its ancestry links.
//!
//! The index is an arena of [`BlockIndexEntry`] records addressed by
//! insertion slot, with a hash lookup table and an explicit best-tip
//! pointer. Parent links are arena slots rather than owning pointers, so
//! ancestry forms a strict chain back to genesis with no ownership cycles.
//!
//! The index carries no chain-selection policy: chain management decides
//! which entry is best and moves the tip with [`BlockIndex::set_best`].
//! Checkpoint logic (keel-consensus) only ever reads it.
//!
//! Not thread-safe — callers should wrap in a `RwLock` under the same
//! discipline the node already uses for chain-state reads.

use std::collections::HashMap;

use tracing::debug;

use crate::error::ChainIndexError;
use crate::types::{BlockHeader, Hash256};

/// One known block header in the chain graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockIndexEntry {
    /// Position from genesis.
    pub height: u64,
    /// Block header hash (self-identifier).
    pub hash: Hash256,
    /// Arena slot of the parent entry. `None` only for genesis.
    parent: Option<usize>,
}

/// The node's block index.
pub struct BlockIndex {
    /// Arena of entries in insertion order.
    entries: Vec<BlockIndexEntry>,
    /// Hash → arena slot.
    by_hash: HashMap<Hash256, usize>,
    /// Arena slot of the current best chain tip.
    best: Option<usize>,
}

impl BlockIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_hash: HashMap::new(),
            best: None,
        }
    }

    /// Insert a block record.
    ///
    /// `parent_hash` must reference an already-inserted entry; pass `None`
    /// for genesis. Does not move the best tip.
    ///
    /// # Errors
    ///
    /// - [`ChainIndexError::DuplicateBlock`] if `hash` is already indexed
    /// - [`ChainIndexError::UnknownParent`] if the parent is not indexed
    /// - [`ChainIndexError::HeightMismatch`] if `height` is not parent height + 1
    ///   (or nonzero for a parentless entry)
    pub fn insert(
        &mut self,
        hash: Hash256,
        height: u64,
        parent_hash: Option<Hash256>,
    ) -> Result<(), ChainIndexError> {
        if self.by_hash.contains_key(&hash) {
            return Err(ChainIndexError::DuplicateBlock(hash.to_string()));
        }

        let parent = match parent_hash {
            Some(parent_hash) => {
                let slot = *self
                    .by_hash
                    .get(&parent_hash)
                    .ok_or_else(|| ChainIndexError::UnknownParent(parent_hash.to_string()))?;
                let expected = self.entries[slot].height + 1;
                if height != expected {
                    return Err(ChainIndexError::HeightMismatch {
                        expected,
                        got: height,
                    });
                }
                Some(slot)
            }
            None => {
                if height != 0 {
                    return Err(ChainIndexError::HeightMismatch {
                        expected: 0,
                        got: height,
                    });
                }
                None
            }
        };

        let slot = self.entries.len();
        self.entries.push(BlockIndexEntry {
            height,
            hash,
            parent,
        });
        self.by_hash.insert(hash, slot);
        debug!(height, %hash, "index: inserted block");
        Ok(())
    }

    /// Insert a header, computing its hash and linking it by `prev_hash`.
    ///
    /// A zero `prev_hash` marks genesis. Returns the computed hash.
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert).
    pub fn insert_header(
        &mut self,
        header: &BlockHeader,
        height: u64,
    ) -> Result<Hash256, ChainIndexError> {
        let hash = header.hash();
        let parent_hash = if header.prev_hash.is_zero() {
            None
        } else {
            Some(header.prev_hash)
        };
        self.insert(hash, height, parent_hash)?;
        Ok(hash)
    }

    /// Move the best-tip pointer to an already-indexed entry.
    ///
    /// # Errors
    ///
    /// [`ChainIndexError::UnknownBlock`] if `hash` is not indexed.
    pub fn set_best(&mut self, hash: &Hash256) -> Result<(), ChainIndexError> {
        let slot = *self
            .by_hash
            .get(hash)
            .ok_or_else(|| ChainIndexError::UnknownBlock(hash.to_string()))?;
        self.best = Some(slot);
        debug!(height = self.entries[slot].height, %hash, "index: best tip moved");
        Ok(())
    }

    /// Look up an entry by block hash.
    pub fn get(&self, hash: &Hash256) -> Option<&BlockIndexEntry> {
        self.by_hash.get(hash).map(|&slot| &self.entries[slot])
    }

    /// Whether the given block hash is indexed.
    pub fn contains(&self, hash: &Hash256) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// The entry currently considered the head of the best chain.
    pub fn best_tip(&self) -> Option<&BlockIndexEntry> {
        self.best.map(|slot| &self.entries[slot])
    }

    /// Parent of an entry, `None` at genesis.
    pub fn parent<'a>(&'a self, entry: &BlockIndexEntry) -> Option<&'a BlockIndexEntry> {
        entry.parent.map(|slot| &self.entries[slot])
    }

    /// Iterate from `entry` back to genesis, inclusive.
    pub fn ancestors<'a>(
        &'a self,
        entry: &'a BlockIndexEntry,
    ) -> impl Iterator<Item = &'a BlockIndexEntry> {
        std::iter::successors(Some(entry), move |e| self.parent(e))
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BlockIndex {
    fn default() -> Self {
        Self::new()
    }
}
