// Path: crates/execution/src/app/context.rs

//! The per-block accumulators threaded through the block lifecycle.

use super::origination::OriginationScores;
use weft_api::executor::GasPool;
use weft_types::app::{
    BlockHeader, BlockResult, Receipt, StateRoot, Transaction, ValidatorUpdate, H256, U256,
};

/// The in-progress block, created by `begin_block` and consumed by `end_block`.
///
/// Only successfully applied transactions leave a trace here. The context owns no
/// state handle of its own: pending writes live in the machine's state manager,
/// which is exclusively borrowed by every call that takes the context.
#[derive(Debug)]
pub struct BlockContext {
    pub(crate) header: BlockHeader,
    pub(crate) gas_pool: GasPool,
    pub(crate) cumulative_gas: u64,
    pub(crate) tx_count: u32,
    pub(crate) log_count: u32,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) receipts: Vec<Receipt>,
    pub(crate) total_fee: U256,
    pub(crate) origination: OriginationScores,
}

impl BlockContext {
    pub(crate) fn new(header: BlockHeader) -> Self {
        let gas_pool = GasPool::new(header.gas_limit);
        Self {
            header,
            gas_pool,
            cumulative_gas: 0,
            tx_count: 0,
            log_count: 0,
            transactions: Vec::new(),
            receipts: Vec::new(),
            total_fee: U256::zero(),
            origination: OriginationScores::default(),
        }
    }

    /// The height this context was opened for.
    pub fn height(&self) -> u64 {
        self.header.height
    }

    /// The header under construction.
    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    /// Gas still available to the block.
    pub fn gas_available(&self) -> u64 {
        self.gas_pool.available()
    }

    /// Gas consumed by the applied transactions so far.
    pub fn cumulative_gas(&self) -> u64 {
        self.cumulative_gas
    }

    /// Number of applied transactions.
    pub fn tx_count(&self) -> u32 {
        self.tx_count
    }

    /// The applied transactions, in application order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Receipts parallel to [`BlockContext::transactions`].
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    /// Sum of the fees of the applied transactions.
    pub fn total_fee(&self) -> U256 {
        self.total_fee
    }

    /// Fees credited per originating validator in this block.
    pub fn origination(&self) -> &OriginationScores {
        &self.origination
    }
}

/// Consensus parameter changes requested at the end of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusParamUpdate {
    /// A new block gas limit.
    pub block_gas_limit: Option<u64>,
}

/// A closed block awaiting commit.
#[derive(Debug)]
pub struct SealedBlock {
    pub(crate) header: BlockHeader,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) receipts: Vec<Receipt>,
    pub(crate) origination: OriginationScores,
    pub(crate) seal_epoch: bool,
    pub(crate) validator_updates: Vec<ValidatorUpdate>,
    pub(crate) consensus_params: Option<ConsensusParamUpdate>,
}

impl SealedBlock {
    /// The height of the block.
    pub fn height(&self) -> u64 {
        self.header.height
    }

    /// The finalized header. The state root is filled in at commit.
    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    /// The applied transactions.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// The receipts, in application order.
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    /// Fees credited per originating validator.
    pub fn origination(&self) -> &OriginationScores {
        &self.origination
    }

    /// Whether this block closes its epoch.
    pub fn seal_epoch(&self) -> bool {
        self.seal_epoch
    }

    /// Validator weight changes promoted by the epoch seal.
    pub fn validator_updates(&self) -> &[ValidatorUpdate] {
        &self.validator_updates
    }

    /// Consensus parameter changes. Currently never requested.
    pub fn consensus_params(&self) -> Option<&ConsensusParamUpdate> {
        self.consensus_params.as_ref()
    }
}

/// What a successful commit reports back.
#[derive(Debug, Clone)]
pub struct CommitResponse {
    /// The committed height.
    pub height: u64,
    /// The new state root.
    pub state_root: StateRoot,
    /// Hash of the committed header.
    pub block_hash: H256,
    /// Receipts of the committed block.
    pub receipts: Vec<Receipt>,
    /// Whether the block sealed its epoch.
    pub seal_epoch: bool,
    /// Validator weight changes taking effect after this block.
    pub validator_updates: Vec<ValidatorUpdate>,
}

impl CommitResponse {
    /// Converts into the result reported to the ordering layer.
    pub fn into_block_result(self) -> BlockResult {
        BlockResult {
            height: self.height,
            state_root: self.state_root,
            receipts: self.receipts,
            seal_epoch: self.seal_epoch,
            validator_updates: self.validator_updates,
        }
    }
}
