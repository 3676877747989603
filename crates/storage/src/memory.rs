// Path: crates/storage/src/memory.rs
//! An in-memory `NodeStore`.

use crate::metrics::metrics;
use ahash::AHashMap;
use std::collections::BTreeMap;
use std::sync::RwLock;
use weft_api::storage::{CommitInput, Height, NodeStore, StorageError};
use weft_types::app::{Block, StateRoot, H256};

#[derive(Default)]
struct Inner {
    state: BTreeMap<Vec<u8>, Vec<u8>>,
    blocks: BTreeMap<Height, Block>,
    hashes: AHashMap<H256, Height>,
    head: Option<(Height, StateRoot)>,
}

/// A `NodeStore` that keeps everything in process memory. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::Backend("memory store lock poisoned".into())
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeStore for MemoryStore {
    fn get_state(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.state.get(key).cloned())
    }

    fn commit_state(&self, input: CommitInput) -> Result<(), StorageError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        for key in &input.deletes {
            inner.state.remove(key);
        }
        let mut bytes_written = 0u64;
        for (key, value) in input.inserts {
            bytes_written += (key.len() + value.len()) as u64;
            inner.state.insert(key, value);
        }
        inner.head = Some((input.height, input.root));
        metrics().inc_bytes_written_total(bytes_written);
        Ok(())
    }

    fn head(&self) -> Result<Option<(Height, StateRoot)>, StorageError> {
        Ok(self.inner.read().map_err(poisoned)?.head)
    }

    fn put_block(&self, block: &Block) -> Result<(), StorageError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let height = block.header.height;
        inner.hashes.insert(block.hash(), height);
        inner.blocks.insert(height, block.clone());
        metrics().inc_blocks_persisted();
        Ok(())
    }

    fn get_block_by_height(&self, height: Height) -> Result<Option<Block>, StorageError> {
        Ok(self.inner.read().map_err(poisoned)?.blocks.get(&height).cloned())
    }

    fn get_block_by_hash(&self, hash: &H256) -> Result<Option<Block>, StorageError> {
        let inner = self.inner.read().map_err(poisoned)?;
        // A height can be rewritten with a different block; the old hash then dangles.
        Ok(inner
            .hashes
            .get(hash)
            .and_then(|h| inner.blocks.get(h))
            .filter(|block| block.hash() == *hash)
            .cloned())
    }
}
