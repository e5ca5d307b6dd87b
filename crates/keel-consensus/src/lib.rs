//! # keel-consensus — chain policy for the Keel node.
//!
//! Carries the checkpoint subsystem: hardened checkpoint verification
//! against the compiled-in tables, checkpoint resolution against the block
//! index, and the sync-checkpoint gate bounding reorganization depth.

pub mod checkpoint;

pub use checkpoint::{
    auto_select_sync_checkpoint, check_hardened, check_sync, last_checkpoint,
    total_blocks_estimate,
};
