//! # keel-core
//! Foundation types and chain structures for the Keel node.

pub mod chain_index;
pub mod checkpoints;
pub mod constants;
pub mod error;
pub mod types;
