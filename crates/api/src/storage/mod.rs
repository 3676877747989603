// Path: crates/api/src/storage/mod.rs

//! API for the durable node store holding committed state and finalized blocks.

use thiserror::Error;
use weft_types::app::{Block, StateRoot, H256};

/// A type alias for a block height.
pub type Height = u64;

/// Encodes a u64 into a big-endian byte array, suitable for ordered key scans.
#[inline]
pub fn be64(x: u64) -> [u8; 8] {
    x.to_be_bytes()
}

/// Represents errors that can occur within the durable storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A generic error originating from the underlying key-value store backend (e.g., redb).
    #[error("backend error: {0}")]
    Backend(String),
    /// An error occurred while serializing data for storage.
    #[error("encode error: {0}")]
    Encode(String),
    /// An error occurred while deserializing data from storage.
    #[error("decode error: {0}")]
    Decode(String),
    /// The requested key or item was not found in the store.
    #[error("not found")]
    NotFound,
}

/// Minimal input required to atomically commit a state delta to the store.
#[derive(Debug, Clone, Default)]
pub struct CommitInput {
    /// The height of the newest version included in this delta.
    pub height: Height,
    /// The state root at that height.
    pub root: StateRoot,
    /// Keys written, with their final values.
    pub inserts: Vec<(Vec<u8>, Vec<u8>)>,
    /// Keys removed.
    pub deletes: Vec<Vec<u8>>,
}

/// The primary trait defining the API for a durable node store.
///
/// This interface abstracts the underlying storage backend (like `redb`). A state
/// commit must be atomic: after a crash either all of `inserts`, `deletes` and the
/// new head are visible, or none are.
pub trait NodeStore: Send + Sync {
    /// Reads a committed state value.
    fn get_state(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Atomically applies a state delta and moves the head to `(height, root)`.
    fn commit_state(&self, input: CommitInput) -> Result<(), StorageError>;

    /// Returns the head: the latest committed height and its root. `None` for an
    /// empty store.
    fn head(&self) -> Result<Option<(Height, StateRoot)>, StorageError>;

    /// Stores a finalized block, indexed by height and by header hash.
    fn put_block(&self, block: &Block) -> Result<(), StorageError>;

    /// Retrieves a block by its height.
    fn get_block_by_height(&self, height: Height) -> Result<Option<Block>, StorageError>;

    /// Retrieves a block by its header hash.
    fn get_block_by_hash(&self, hash: &H256) -> Result<Option<Block>, StorageError>;
}
