// Path: crates/execution/src/app/view.rs

//! Read-only queries over the committed chain.

use super::{origination, ExecutionMachine};
use weft_api::state::StateManager;
use weft_types::app::{
    read_validator_sets, Account, Address, Block, ChainStatus, StateRoot, ValidatorId,
    ValidatorSets, H256, U256,
};
use weft_types::codec;
use weft_types::error::{ChainError, LifecycleError, StateError};
use weft_types::keys::{account_key, VALIDATOR_SET_KEY};

impl<S: StateManager> ExecutionMachine<S> {
    /// The status as of the last commit.
    pub fn status(&self) -> &ChainStatus {
        &self.status
    }

    /// The chain ID of the node's descriptor.
    pub fn chain_id(&self) -> u64 {
        self.chain.chain_id
    }

    /// Height of the last committed block.
    pub fn block_number(&self) -> u64 {
        self.status.height
    }

    /// Root of the last committed state.
    pub fn state_root(&self) -> StateRoot {
        self.state.root()
    }

    /// Hash of the last committed header.
    pub fn last_block_hash(&self) -> H256 {
        self.last_block_hash
    }

    /// Looks up a committed block, first in the recent window, then in the store.
    pub fn block_by_height(&self, height: u64) -> Result<Option<Block>, ChainError> {
        if let Some(block) = self
            .recent_blocks
            .iter()
            .rev()
            .find(|b| b.header.height == height)
        {
            return Ok(Some(block.clone()));
        }
        self.store
            .get_block_by_height(height)
            .map_err(|e| StateError::Backend(e.to_string()).into())
    }

    /// Looks up a committed block by header hash.
    pub fn block_by_hash(&self, hash: &H256) -> Result<Option<Block>, ChainError> {
        if let Some(block) = self.recent_blocks.iter().rev().find(|b| b.hash() == *hash) {
            return Ok(Some(block.clone()));
        }
        self.store
            .get_block_by_hash(hash)
            .map_err(|e| StateError::Backend(e.to_string()).into())
    }

    /// The account at `address`. Unknown accounts are empty.
    ///
    /// While a block is open this includes its applied transactions.
    pub fn account(&self, address: &Address) -> Result<Account, ChainError> {
        match self.state.get(&account_key(address))? {
            Some(bytes) => Ok(codec::from_bytes_canonical(&bytes).map_err(StateError::Decode)?),
            None => Ok(Account::default()),
        }
    }

    /// The persisted cumulative origination score of `validator`.
    pub fn origination_score(&self, validator: &ValidatorId) -> Result<U256, ChainError> {
        Ok(origination::read_score(&self.state, validator)?)
    }

    /// The current and staged validator sets.
    pub fn validator_sets(&self) -> Result<ValidatorSets, ChainError> {
        let bytes = self
            .state
            .get(VALIDATOR_SET_KEY)?
            .ok_or(LifecycleError::NotBootstrapped)?;
        Ok(read_validator_sets(&bytes)?)
    }
}
