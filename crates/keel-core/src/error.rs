//! Error types for the Keel node.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainIndexError {
    #[error("duplicate block: {0}")] DuplicateBlock(String),
    #[error("unknown parent: {0}")] UnknownParent(String),
    #[error("unknown block: {0}")] UnknownBlock(String),
    #[error("height mismatch: expected {expected}, got {got}")] HeightMismatch { expected: u64, got: u64 },
}
