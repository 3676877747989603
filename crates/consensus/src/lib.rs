// Path: crates/consensus/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! Consensus-side bookkeeping for the Weft validator node.
//!
//! The ordering protocol itself lives outside this workspace. What remains here is the
//! state it needs from the node: which validator authored which DAG events, and how
//! much weight those authors carry.

pub mod events_by_peer;

pub use events_by_peer::EventsByPeer;
