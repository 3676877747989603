// Path: crates/state/src/state_db.rs
//! The state manager backed by a `NodeStore`.

use lru::LruCache;
use parity_scale_codec::Encode;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use weft_api::state::{StateAccess, StateManager};
use weft_api::storage::{CommitInput, NodeStore};
use weft_telemetry::storage_metrics;
use weft_types::app::{keccak256, StateRoot};
use weft_types::error::StateError;

/// Number of store reads kept by default in the read cache.
pub const DEFAULT_CACHE_ENTRIES: usize = 16 * 1024;

type WriteSet = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// Computes the root that follows `prev` after applying `changes` at `height`:
/// `keccak(prev ‖ height_be ‖ SCALE(changes))`, with `changes` in key order.
pub fn chain_root(prev: &StateRoot, height: u64, changes: &WriteSet) -> StateRoot {
    let pairs: Vec<(&Vec<u8>, &Option<Vec<u8>>)> = changes.iter().collect();
    let mut preimage = Vec::with_capacity(40 + changes.len() * 64);
    preimage.extend_from_slice(prev.as_bytes());
    preimage.extend_from_slice(&height.to_be_bytes());
    pairs.encode_to(&mut preimage);
    keccak256(preimage)
}

/// A versioned state store layered over a durable `NodeStore`.
///
/// Reads resolve, in order, against the pending writes of the current block, the
/// versions committed without flushing, an LRU cache of store reads, and finally
/// the store itself.
pub struct StateDb {
    store: Arc<dyn NodeStore>,
    dirty: WriteSet,
    unflushed: WriteSet,
    unflushed_versions: u64,
    cache: Mutex<LruCache<Vec<u8>, Option<Vec<u8>>>>,
    root: StateRoot,
    height: u64,
}

impl StateDb {
    /// Opens the state at the store's head, or empty at height 0 for a fresh store.
    pub fn open(store: Arc<dyn NodeStore>, cache_entries: usize) -> Result<Self, StateError> {
        let (height, root) = store
            .head()
            .map_err(|e| StateError::Backend(e.to_string()))?
            .unwrap_or_default();
        let capacity = NonZeroUsize::new(cache_entries).unwrap_or(NonZeroUsize::MIN);
        tracing::info!(target: "state", event = "opened", height, root = ?root);
        Ok(Self {
            store,
            dirty: WriteSet::new(),
            unflushed: WriteSet::new(),
            unflushed_versions: 0,
            cache: Mutex::new(LruCache::new(capacity)),
            root,
            height,
        })
    }

    /// Number of committed versions held in memory and not yet written to the store.
    pub fn unflushed_versions(&self) -> u64 {
        self.unflushed_versions
    }

    /// Returns true if writes are pending for the next commit.
    pub fn has_pending_writes(&self) -> bool {
        !self.dirty.is_empty()
    }

    fn read_store(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| StateError::Backend("state cache lock poisoned".into()))?;
        if let Some(hit) = cache.get(key) {
            return Ok(hit.clone());
        }
        let value = self
            .store
            .get_state(key)
            .map_err(|e| StateError::Backend(e.to_string()))?;
        cache.put(key.to_vec(), value.clone());
        Ok(value)
    }
}

impl StateAccess for StateDb {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        if let Some(v) = self.dirty.get(key) {
            return Ok(v.clone());
        }
        if let Some(v) = self.unflushed.get(key) {
            return Ok(v.clone());
        }
        self.read_store(key)
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.dirty.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        self.dirty.insert(key.to_vec(), None);
        Ok(())
    }

    fn batch_apply(
        &mut self,
        inserts: &[(Vec<u8>, Vec<u8>)],
        deletes: &[Vec<u8>],
    ) -> Result<(), StateError> {
        for key in deletes {
            self.dirty.insert(key.clone(), None);
        }
        for (key, value) in inserts {
            self.dirty.insert(key.clone(), Some(value.clone()));
        }
        Ok(())
    }
}

impl StateManager for StateDb {
    fn root(&self) -> StateRoot {
        self.root
    }

    fn height(&self) -> u64 {
        self.height
    }

    fn commit(&mut self, height: u64, flush_to_disk: bool) -> Result<StateRoot, StateError> {
        let new_root = chain_root(&self.root, height, &self.dirty);

        if flush_to_disk {
            // Build the delta without consuming anything so a failed write leaves
            // the pending state intact.
            let mut merged = self.unflushed.clone();
            merged.extend(self.dirty.iter().map(|(k, v)| (k.clone(), v.clone())));

            let mut input = CommitInput {
                height,
                root: new_root,
                ..Default::default()
            };
            for (key, value) in &merged {
                match value {
                    Some(v) => input.inserts.push((key.clone(), v.clone())),
                    None => input.deletes.push(key.clone()),
                }
            }
            self.store
                .commit_state(input)
                .map_err(|e| StateError::WriteError(e.to_string()))?;

            match self.cache.lock() {
                Ok(mut cache) => {
                    for (key, value) in merged {
                        // Only refresh keys already cached; the rest are read on demand.
                        if cache.contains(&key) {
                            cache.put(key, value);
                        }
                    }
                }
                Err(poisoned) => {
                    // Entries may predate this commit, so none of them can be trusted.
                    tracing::warn!(target: "state", event = "cache_reset", height);
                    poisoned.into_inner().clear();
                    self.cache.clear_poison();
                }
            }
            self.unflushed.clear();
            self.unflushed_versions = 0;
            self.dirty.clear();
        } else {
            let dirty = std::mem::take(&mut self.dirty);
            self.unflushed.extend(dirty);
            self.unflushed_versions += 1;
        }

        storage_metrics().set_unflushed_versions(self.unflushed_versions);
        tracing::debug!(
            target: "state",
            event = "committed",
            height,
            root = ?new_root,
            flushed = flush_to_disk
        );
        self.root = new_root;
        self.height = height;
        Ok(new_root)
    }

    fn flush_state(&mut self) {
        match self.cache.lock() {
            Ok(mut cache) => cache.clear(),
            Err(poisoned) => {
                poisoned.into_inner().clear();
                self.cache.clear_poison();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_storage::MemoryStore;

    fn fresh() -> (Arc<MemoryStore>, StateDb) {
        let store = Arc::new(MemoryStore::new());
        let db = StateDb::open(store.clone(), 64).unwrap();
        (store, db)
    }

    #[test]
    fn poisoned_cache_is_discarded_by_a_flushing_commit() {
        let (_store, mut db) = fresh();
        db.insert(b"k", b"old").unwrap();
        db.commit(1, true).unwrap();
        assert_eq!(db.get(b"k").unwrap(), Some(b"old".to_vec()));

        let cache = &db.cache;
        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = cache.lock().unwrap();
                    panic!("holding the cache lock");
                })
                .join();
        });
        assert!(db.cache.is_poisoned());

        db.insert(b"k", b"new").unwrap();
        db.commit(2, true).unwrap();
        assert!(!db.cache.is_poisoned());
        assert_eq!(db.get(b"k").unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn reads_see_pending_then_committed_writes() {
        let (_store, mut db) = fresh();
        db.insert(b"k", b"v1").unwrap();
        assert_eq!(db.get(b"k").unwrap(), Some(b"v1".to_vec()));
        db.commit(1, true).unwrap();
        assert_eq!(db.get(b"k").unwrap(), Some(b"v1".to_vec()));
        db.delete(b"k").unwrap();
        assert_eq!(db.get(b"k").unwrap(), None);
    }

    #[test]
    fn root_is_deterministic_and_chained() {
        let (_s1, mut a) = fresh();
        let (_s2, mut b) = fresh();
        for db in [&mut a, &mut b] {
            db.insert(b"x", b"1").unwrap();
            db.insert(b"y", b"2").unwrap();
        }
        let ra = a.commit(1, true).unwrap();
        let rb = b.commit(1, false).unwrap();
        assert_eq!(ra, rb);

        // An empty block still advances the root.
        let ra2 = a.commit(2, true).unwrap();
        assert_ne!(ra, ra2);

        // The same writes at another height give another root.
        let (_s3, mut c) = fresh();
        c.insert(b"x", b"1").unwrap();
        c.insert(b"y", b"2").unwrap();
        assert_ne!(c.commit(7, true).unwrap(), ra);
    }

    #[test]
    fn unflushed_versions_reach_store_on_next_flush() {
        let (store, mut db) = fresh();
        db.insert(b"a", b"1").unwrap();
        db.commit(1, false).unwrap();
        assert_eq!(db.unflushed_versions(), 1);
        assert_eq!(store.get_state(b"a").unwrap(), None);
        assert_eq!(db.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.head().unwrap(), None);

        db.insert(b"b", b"2").unwrap();
        let root = db.commit(2, true).unwrap();
        assert_eq!(db.unflushed_versions(), 0);
        assert_eq!(store.get_state(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get_state(b"b").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.head().unwrap(), Some((2, root)));
    }

    #[test]
    fn reopen_resumes_at_head() {
        let (store, mut db) = fresh();
        db.insert(b"a", b"1").unwrap();
        let root = db.commit(3, true).unwrap();
        drop(db);

        let db = StateDb::open(store, 8).unwrap();
        assert_eq!(db.height(), 3);
        assert_eq!(db.root(), root);
        assert_eq!(db.get(b"a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn flush_state_drops_cache_but_not_data() {
        let (_store, mut db) = fresh();
        db.insert(b"a", b"1").unwrap();
        db.commit(1, true).unwrap();
        db.get(b"a").unwrap();
        db.flush_state();
        assert_eq!(db.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert!(!db.has_pending_writes());
    }

    #[test]
    fn flushed_delete_invalidates_cached_value() {
        let (_store, mut db) = fresh();
        db.insert(b"a", b"1").unwrap();
        db.commit(1, true).unwrap();
        assert_eq!(db.get(b"a").unwrap(), Some(b"1".to_vec()));
        db.delete(b"a").unwrap();
        db.commit(2, true).unwrap();
        assert_eq!(db.get(b"a").unwrap(), None);
    }

    proptest::proptest! {
        #[test]
        fn root_ignores_write_order(
            kvs in proptest::collection::btree_map(
                proptest::collection::vec(proptest::prelude::any::<u8>(), 1..8),
                proptest::collection::vec(proptest::prelude::any::<u8>(), 0..8),
                0..24,
            )
        ) {
            let (_s1, mut forward) = fresh();
            let (_s2, mut backward) = fresh();
            for (k, v) in kvs.iter() {
                forward.insert(k, v).unwrap();
            }
            for (k, v) in kvs.iter().rev() {
                backward.insert(k, v).unwrap();
            }
            proptest::prop_assert_eq!(forward.commit(1, true).unwrap(), backward.commit(1, true).unwrap());
        }
    }
}
