// Path: crates/storage/src/redb_store.rs
use crate::metrics::metrics;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use weft_api::storage::{be64, CommitInput, Height, NodeStore, StorageError};
use weft_types::app::{Block, StateRoot, H256};
use weft_types::codec;

/// ---- Table definitions ----
const STATE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("STATE");
const BLOCKS: TableDefinition<&[u8; 8], &[u8]> = TableDefinition::new("BLOCKS"); // key = height_be
const BLOCK_HASHES: TableDefinition<&[u8; 32], &[u8; 8]> = TableDefinition::new("BLOCK_HASHES");
const HEAD: TableDefinition<&[u8; 4], &[u8; 40]> = TableDefinition::new("HEAD"); // value = [height_be(8)][root(32)]

fn key_head() -> [u8; 4] {
    *b"HEAD"
}

fn backend<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Backend(e.to_string())
}

fn parse_u64(bytes: &[u8; 8]) -> u64 {
    u64::from_be_bytes(*bytes)
}

fn encode_head(height: Height, root: &StateRoot) -> [u8; 40] {
    let mut out = [0u8; 40];
    let (h, r) = out.split_at_mut(8);
    h.copy_from_slice(&be64(height));
    r.copy_from_slice(root.as_bytes());
    out
}

fn decode_head(bytes: &[u8; 40]) -> (Height, StateRoot) {
    let (h, r) = bytes.split_at(8);
    let mut height = [0u8; 8];
    height.copy_from_slice(h);
    (u64::from_be_bytes(height), StateRoot::from_slice(r))
}

/// A `NodeStore` backed by a single redb database file.
///
/// Every state commit is one redb write transaction covering the delta and the head,
/// so a crash leaves either the previous or the new version on disk.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Opens (or creates) the database at `path` and ensures all tables exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(backend)?;
        {
            let w = db.begin_write().map_err(backend)?;
            {
                w.open_table(STATE).map_err(backend)?;
                w.open_table(BLOCKS).map_err(backend)?;
                w.open_table(BLOCK_HASHES).map_err(backend)?;
                w.open_table(HEAD).map_err(backend)?;
            }
            w.commit().map_err(backend)?;
        }
        tracing::info!(target: "storage", event = "opened", path = %path.as_ref().display());
        Ok(Self { db: Arc::new(db) })
    }

    fn block_at(&self, height: Height) -> Result<Option<Block>, StorageError> {
        let r = self.db.begin_read().map_err(backend)?;
        let table = r.open_table(BLOCKS).map_err(backend)?;
        let maybe_value = table.get(&be64(height)).map_err(backend)?;
        match maybe_value {
            Some(value) => {
                let block: Block =
                    codec::from_bytes_canonical(value.value()).map_err(StorageError::Decode)?;
                Ok(Some(block))
            }
            None => Ok(None),
        }
    }
}

impl NodeStore for RedbStore {
    fn get_state(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let r = self.db.begin_read().map_err(backend)?;
        let table = r.open_table(STATE).map_err(backend)?;
        let value = table.get(key).map_err(backend)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn commit_state(&self, input: CommitInput) -> Result<(), StorageError> {
        let bytes_written: u64 = input
            .inserts
            .iter()
            .map(|(k, v)| (k.len() + v.len()) as u64)
            .sum();

        let w = self.db.begin_write().map_err(backend)?;
        {
            let mut state = w.open_table(STATE).map_err(backend)?;
            for key in &input.deletes {
                state.remove(key.as_slice()).map_err(backend)?;
            }
            for (key, value) in &input.inserts {
                state
                    .insert(key.as_slice(), value.as_slice())
                    .map_err(backend)?;
            }
            let mut head = w.open_table(HEAD).map_err(backend)?;
            head.insert(&key_head(), &encode_head(input.height, &input.root))
                .map_err(backend)?;
        }
        w.commit().map_err(backend)?;

        metrics().inc_bytes_written_total(bytes_written);
        tracing::debug!(
            target: "storage",
            event = "state_committed",
            height = input.height,
            inserts = input.inserts.len(),
            deletes = input.deletes.len(),
            bytes = bytes_written
        );
        Ok(())
    }

    fn head(&self) -> Result<Option<(Height, StateRoot)>, StorageError> {
        let r = self.db.begin_read().map_err(backend)?;
        let table = r.open_table(HEAD).map_err(backend)?;
        let value = table.get(&key_head()).map_err(backend)?;
        Ok(value.map(|v| decode_head(v.value())))
    }

    fn put_block(&self, block: &Block) -> Result<(), StorageError> {
        let bytes = codec::to_bytes_canonical(block).map_err(StorageError::Encode)?;
        let height = block.header.height;
        let hash = block.hash();

        let w = self.db.begin_write().map_err(backend)?;
        {
            let mut blocks = w.open_table(BLOCKS).map_err(backend)?;
            blocks
                .insert(&be64(height), bytes.as_slice())
                .map_err(backend)?;
            let mut hashes = w.open_table(BLOCK_HASHES).map_err(backend)?;
            hashes.insert(&hash.0, &be64(height)).map_err(backend)?;
        }
        w.commit().map_err(backend)?;

        metrics().inc_bytes_written_total(bytes.len() as u64);
        metrics().inc_blocks_persisted();
        Ok(())
    }

    fn get_block_by_height(&self, height: Height) -> Result<Option<Block>, StorageError> {
        self.block_at(height)
    }

    fn get_block_by_hash(&self, hash: &H256) -> Result<Option<Block>, StorageError> {
        let height = {
            let r = self.db.begin_read().map_err(backend)?;
            let table = r.open_table(BLOCK_HASHES).map_err(backend)?;
            let value = table.get(&hash.0).map_err(backend)?;
            match value {
                Some(v) => parse_u64(v.value()),
                None => return Ok(None),
            }
        };
        // A height can be rewritten with a different block; the old hash then dangles.
        Ok(self
            .block_at(height)?
            .filter(|block| block.hash() == *hash))
    }
}
