// Path: crates/execution/src/app/mod.rs
mod context;
mod end_block;
mod notify;
mod origination;
mod state_machine;
mod view;

pub use context::{BlockContext, CommitResponse, ConsensusParamUpdate, SealedBlock};
pub use notify::{flatten_logs, Notifier};
pub use origination::{read_score, OriginationScores};

use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::Arc;
use weft_api::epoch::EpochSealPolicy;
use weft_api::executor::{ExecutionConfig, TransactionExecutor};
use weft_api::state::StateManager;
use weft_api::storage::NodeStore;
use weft_types::app::{
    write_validator_sets, Account, Block, BlockHeader, ChainInfo, ChainStatus, StateRoot,
    ValidatorSet, ValidatorSets, ValidatorWeight, H256,
};
use weft_types::codec;
use weft_types::config::NodeConfig;
use weft_types::error::{ChainError, FatalError, LifecycleError, StateError};
use weft_types::keys::{account_key, GENESIS_KEY, STATUS_KEY, VALIDATOR_SET_KEY};

/// Represents the initialization state of the chain's genesis block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenesisState {
    /// The chain has not yet loaded or committed the genesis block.
    Pending,
    /// Genesis is present in the store.
    Ready {
        /// Hash of the genesis descriptor stored under the genesis marker.
        genesis_hash: H256,
        /// The chain ID as loaded from configuration.
        chain_id: u64,
    },
}

/// Tunables of the execution machine that do not affect consensus.
#[derive(Debug, Clone)]
pub struct MachineOptions {
    /// Whether every commit is written through to disk.
    pub flush_to_disk: bool,
    /// How many committed blocks are kept in memory for queries.
    pub max_recent_blocks: usize,
    /// Parameters handed to the executor. The machine always clears `strict`.
    pub execution: ExecutionConfig,
}

impl Default for MachineOptions {
    fn default() -> Self {
        Self {
            flush_to_disk: true,
            max_recent_blocks: 100,
            execution: ExecutionConfig::default(),
        }
    }
}

impl From<&NodeConfig> for MachineOptions {
    fn from(config: &NodeConfig) -> Self {
        Self {
            flush_to_disk: config.flush_to_disk,
            max_recent_blocks: config.recent_blocks,
            execution: config.execution.clone(),
        }
    }
}

/// The single-writer state machine that turns the finalized transaction stream into
/// blocks, receipts and state roots.
///
/// Every operation takes `&mut self`. The open block is an explicit [`BlockContext`]
/// handed back by [`ExecutionMachine::begin_block`], so at most one caller can be
/// driving a block at any time.
pub struct ExecutionMachine<S: StateManager> {
    chain: ChainInfo,
    state: S,
    store: Arc<dyn NodeStore>,
    executor: Arc<dyn TransactionExecutor>,
    epoch_policy: Box<dyn EpochSealPolicy>,
    notifier: Notifier,
    options: MachineOptions,
    status: ChainStatus,
    last_block_hash: H256,
    recent_blocks: VecDeque<Block>,
    genesis_state: GenesisState,
    bootstrapped: bool,
    open_height: Option<u64>,
}

impl<S: StateManager> Debug for ExecutionMachine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionMachine")
            .field("chain_id", &self.chain.chain_id)
            .field("status", &self.status)
            .field("genesis_state", &self.genesis_state)
            .field("bootstrapped", &self.bootstrapped)
            .field("open_height", &self.open_height)
            .field("recent_blocks", &self.recent_blocks.len())
            .finish()
    }
}

impl<S: StateManager> ExecutionMachine<S> {
    /// Creates a machine over `state`, resuming from the last committed status if the
    /// store already holds a chain.
    pub fn new(
        chain: ChainInfo,
        state: S,
        store: Arc<dyn NodeStore>,
        executor: Arc<dyn TransactionExecutor>,
        epoch_policy: Box<dyn EpochSealPolicy>,
        notifier: Notifier,
        mut options: MachineOptions,
    ) -> Result<Self, ChainError> {
        options.execution.strict = false;
        let mut machine = Self {
            chain,
            state,
            store,
            executor,
            epoch_policy,
            notifier,
            options,
            status: ChainStatus::default(),
            last_block_hash: H256::zero(),
            recent_blocks: VecDeque::new(),
            genesis_state: GenesisState::Pending,
            bootstrapped: false,
            open_height: None,
        };
        machine.load_or_initialize_status()?;
        Ok(machine)
    }

    fn load_or_initialize_status(&mut self) -> Result<(), ChainError> {
        let Some(marker) = self.state.get(GENESIS_KEY)? else {
            tracing::info!(
                target: "execution",
                event = "genesis_pending",
                chain_id = self.chain.chain_id,
            );
            return Ok(());
        };
        let genesis_hash = decode_genesis_marker(&marker)?;
        let status_bytes = self
            .state
            .get(STATUS_KEY)?
            .ok_or(StateError::KeyNotFound)?;
        self.status = codec::from_bytes_canonical(&status_bytes).map_err(StateError::Decode)?;

        // The node store may hold blocks past the state head when commits were not
        // flushed. The status is authoritative.
        let head = self
            .store
            .get_block_by_height(self.status.height)
            .map_err(|e| StateError::Backend(e.to_string()))?;
        if let Some(block) = head {
            self.last_block_hash = block.hash();
            self.recent_blocks.push_back(block);
        }
        self.genesis_state = GenesisState::Ready {
            genesis_hash,
            chain_id: self.chain.chain_id,
        };
        tracing::info!(
            target: "execution",
            event = "resume",
            height = self.status.height,
            epoch = self.status.epoch,
            root = ?self.state.root(),
        );
        Ok(())
    }

    /// Initializes the chain from the genesis descriptor supplied by consensus.
    ///
    /// The descriptor must equal the node's own field for field. If the store already
    /// holds genesis, the stored marker is checked and nothing is written.
    pub fn bootstrap(&mut self, genesis: &ChainInfo) -> Result<StateRoot, ChainError> {
        if self.bootstrapped {
            return Err(LifecycleError::AlreadyBootstrapped.into());
        }
        let fields = self.chain.mismatched_fields(genesis);
        if !fields.is_empty() {
            tracing::error!(
                target: "execution",
                event = "genesis_mismatch",
                fields = ?fields,
            );
            return Err(FatalError::GenesisMismatch { fields }.into());
        }
        let genesis_hash = self.chain.hash();

        if let GenesisState::Ready {
            genesis_hash: stored,
            ..
        } = &self.genesis_state
        {
            if *stored != genesis_hash {
                tracing::error!(
                    target: "execution",
                    event = "genesis_mismatch",
                    stored = %stored,
                    supplied = %genesis_hash,
                );
                return Err(FatalError::GenesisMismatch {
                    fields: vec!["genesis_hash"],
                }
                .into());
            }
            self.bootstrapped = true;
            tracing::info!(
                target: "execution",
                event = "genesis_replay",
                height = self.status.height,
            );
            return Ok(self.state.root());
        }

        let root = self.write_genesis(genesis_hash)?;
        self.genesis_state = GenesisState::Ready {
            genesis_hash,
            chain_id: self.chain.chain_id,
        };
        self.bootstrapped = true;
        Ok(root)
    }

    fn write_genesis(&mut self, genesis_hash: H256) -> Result<StateRoot, ChainError> {
        for allocation in &self.chain.allocations {
            let account = Account {
                nonce: 0,
                balance: allocation.balance,
            };
            let bytes = codec::to_bytes_canonical(&account).map_err(StateError::InvalidValue)?;
            self.state.insert(&account_key(&allocation.address), &bytes)?;
        }

        let sets = ValidatorSets {
            current: ValidatorSet::new(
                self.chain
                    .validators
                    .iter()
                    .map(ValidatorWeight::from)
                    .collect(),
            ),
            next: None,
        };
        self.state
            .insert(VALIDATOR_SET_KEY, &write_validator_sets(&sets)?)?;
        self.state.insert(GENESIS_KEY, genesis_hash.as_bytes())?;

        let status = ChainStatus {
            height: 0,
            epoch: 0,
            latest_timestamp: self.chain.genesis_time,
            total_transactions: 0,
        };
        let status_bytes = codec::to_bytes_canonical(&status).map_err(StateError::InvalidValue)?;
        self.state.insert(STATUS_KEY, &status_bytes)?;

        let root = self
            .state
            .commit(0, true)
            .map_err(|e| FatalError::PersistenceFailed(e.to_string()))?;

        let block = Block {
            header: BlockHeader {
                height: 0,
                parent_hash: H256::zero(),
                timestamp: self.chain.genesis_time,
                epoch: 0,
                gas_limit: self.chain.block_gas_limit,
                state_root: root,
                ..Default::default()
            },
            transactions: Vec::new(),
        };
        self.store
            .put_block(&block)
            .map_err(|e| FatalError::PersistenceFailed(e.to_string()))?;

        self.status = status;
        self.last_block_hash = block.hash();
        self.remember_block(block);

        tracing::info!(
            target: "execution",
            event = "genesis",
            chain_id = self.chain.chain_id,
            validators = sets.current.len(),
            allocations = self.chain.allocations.len(),
            root = ?root,
        );
        Ok(root)
    }

    fn remember_block(&mut self, block: Block) {
        if self.options.max_recent_blocks == 0 {
            return;
        }
        if self.recent_blocks.len() >= self.options.max_recent_blocks {
            self.recent_blocks.pop_front();
        }
        self.recent_blocks.push_back(block);
    }

    /// Stages `next` to replace the current validator set at the next epoch seal.
    ///
    /// The write joins the pending state and becomes durable with the next commit.
    pub fn stage_validator_set(&mut self, next: ValidatorSet) -> Result<(), ChainError> {
        if !self.bootstrapped {
            return Err(LifecycleError::NotBootstrapped.into());
        }
        tracing::info!(
            target: "execution",
            event = "validator_set_staged",
            height = self.status.height,
            validators = next.len(),
            total_weight = next.total_weight,
        );
        Ok(end_block::stage_next_validator_set(&mut self.state, next)?)
    }

    /// Subscription handle for commit notifications.
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Returns true once `bootstrap` has succeeded on this machine.
    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrapped
    }

    /// The genesis state as found in, or written to, the store.
    pub fn genesis_state(&self) -> &GenesisState {
        &self.genesis_state
    }

    /// The underlying state manager.
    pub fn state(&self) -> &S {
        &self.state
    }
}

fn decode_genesis_marker(bytes: &[u8]) -> Result<H256, StateError> {
    let raw: [u8; 32] = bytes
        .try_into()
        .map_err(|_| StateError::Decode(format!("genesis marker has {} bytes", bytes.len())))?;
    Ok(H256::from(raw))
}
