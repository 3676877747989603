// Path: crates/api/src/state/manager.rs
//! Defines the `StateManager` trait for versioning and lifecycle management of state.

use crate::state::StateAccess;
use weft_types::app::StateRoot;
use weft_types::error::StateError;

/// The state manager interface, adding versioning and persistence on top of
/// [`StateAccess`].
///
/// Writes made through `StateAccess` are pending until [`StateManager::commit`] folds
/// them into a new root for the given height.
pub trait StateManager: StateAccess {
    /// The root of the last committed version.
    fn root(&self) -> StateRoot;

    /// The height of the last committed version.
    fn height(&self) -> u64;

    /// Commits the pending changes as the version for `height` and returns its root.
    ///
    /// When `flush_to_disk` is false the version may be held in memory and written
    /// out by a later flushing commit.
    fn commit(&mut self, height: u64, flush_to_disk: bool) -> Result<StateRoot, StateError>;

    /// Releases in-memory caches held for the last committed version.
    fn flush_state(&mut self);
}

impl<T: StateManager + ?Sized> StateManager for Box<T> {
    fn root(&self) -> StateRoot {
        (**self).root()
    }

    fn height(&self) -> u64 {
        (**self).height()
    }

    fn commit(&mut self, height: u64, flush_to_disk: bool) -> Result<StateRoot, StateError> {
        (**self).commit(height, flush_to_disk)
    }

    fn flush_state(&mut self) {
        (**self).flush_state()
    }
}
