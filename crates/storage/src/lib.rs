// Path: crates/storage/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! Durable and in-memory implementations of the `NodeStore` API.
//!
//! `RedbStore` keeps committed state, finalized blocks and the head pointer in a single
//! redb database. `MemoryStore` offers the same contract without touching disk, for
//! tests and throwaway nodes.

pub mod memory;
pub mod metrics;
pub mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;
