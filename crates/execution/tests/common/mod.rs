// Path: crates/execution/tests/common/mod.rs
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use weft_api::epoch::EpochSealPolicy;
use weft_api::executor::{ExecutionConfig, GasPool, ProcessOutcome, TransactionExecutor};
use weft_api::state::{StateAccess, StateManager};
use weft_api::storage::{CommitInput, Height, NodeStore, StorageError};
use weft_execution::{ExecutionMachine, MachineOptions, NeverSeal, Notifier, TransferExecutor};
use weft_state::StateDb;
use weft_storage::MemoryStore;
use weft_types::app::{
    Address, Block, BlockHeader, ChainInfo, DagTransaction, GenesisAllocation,
    GenesisValidator, StateRoot, Transaction, ValidatorId, H256, U256,
};
use weft_types::error::{StateError, TransactionError};
use weft_types::keys::VALIDATOR_SET_KEY;

pub const GAS_PRICE: u64 = 1_000;

pub fn validator(b: u8) -> ValidatorId {
    ValidatorId([b; 32])
}

pub fn alice() -> Address {
    Address::repeat_byte(0xa1)
}

pub fn bob() -> Address {
    Address::repeat_byte(0xb0)
}

pub fn chain() -> ChainInfo {
    ChainInfo {
        chain_id: 4_242,
        name: "weft-test".into(),
        genesis_time: 1_700_000_000,
        block_gas_limit: 1_000_000,
        validators: (1..=3)
            .map(|b| GenesisValidator {
                id: validator(b),
                weight: 10,
            })
            .collect(),
        allocations: vec![
            GenesisAllocation {
                address: alice(),
                balance: U256::exp10(18),
            },
            GenesisAllocation {
                address: bob(),
                balance: U256::exp10(18),
            },
        ],
    }
}

pub fn transfer(from: Address, to: Address, nonce: u64, value: u64) -> Transaction {
    Transaction {
        nonce,
        from,
        to: Some(to),
        value: U256::from(value),
        gas: 21_000,
        gas_price: U256::from(GAS_PRICE),
        data: vec![],
    }
}

pub fn payload(originator: u8, transaction: Transaction) -> Vec<u8> {
    DagTransaction {
        originator: validator(originator),
        transaction,
    }
    .to_bytes()
}

/// Transfers, except that a transaction whose data is `b"skip"` scribbles into state
/// and then asks to be skipped, and one whose data is `b"whale"` claims the largest
/// possible fee. Strict mode rejects everything.
#[derive(Debug, Default)]
pub struct ScriptedExecutor;

impl TransactionExecutor for ScriptedExecutor {
    fn process_tx(
        &self,
        tx: &Transaction,
        tx_index: u32,
        gas_pool: &mut GasPool,
        cumulative_gas: &mut u64,
        header: &BlockHeader,
        state: &mut dyn StateAccess,
        config: &ExecutionConfig,
    ) -> Result<ProcessOutcome, TransactionError> {
        if config.strict {
            return Err(TransactionError::Invalid("strict mode".into()));
        }
        if tx.data == b"skip" {
            state.insert(b"scribble", b"should not survive")?;
            gas_pool.sub_gas(tx.gas)?;
            *cumulative_gas += tx.gas;
            return Ok(ProcessOutcome::Skipped {
                reason: "scripted".into(),
            });
        }
        let outcome = TransferExecutor.process_tx(
            tx,
            tx_index,
            gas_pool,
            cumulative_gas,
            header,
            state,
            config,
        )?;
        match outcome {
            ProcessOutcome::Applied { receipt, .. } if tx.data == b"whale" => {
                Ok(ProcessOutcome::Applied {
                    receipt,
                    fee: U256::MAX,
                })
            }
            other => Ok(other),
        }
    }
}

/// Switches that make a [`FlakyState`] fail.
#[derive(Debug, Clone, Default)]
pub struct StateFaults {
    pub validator_reads: Arc<AtomicBool>,
    pub merges: Arc<AtomicBool>,
}

/// A `StateDb` whose validator set reads and batch merges can be made to fail.
pub struct FlakyState {
    inner: StateDb,
    faults: StateFaults,
}

fn io_error() -> StateError {
    StateError::Backend("io".into())
}

impl StateAccess for FlakyState {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        if key == VALIDATOR_SET_KEY && self.faults.validator_reads.load(Ordering::SeqCst) {
            return Err(io_error());
        }
        self.inner.get(key)
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.inner.insert(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        self.inner.delete(key)
    }

    fn batch_apply(
        &mut self,
        inserts: &[(Vec<u8>, Vec<u8>)],
        deletes: &[Vec<u8>],
    ) -> Result<(), StateError> {
        if self.faults.merges.load(Ordering::SeqCst) {
            return Err(io_error());
        }
        self.inner.batch_apply(inserts, deletes)
    }
}

impl StateManager for FlakyState {
    fn root(&self) -> StateRoot {
        self.inner.root()
    }

    fn height(&self) -> u64 {
        self.inner.height()
    }

    fn commit(&mut self, height: u64, flush_to_disk: bool) -> Result<StateRoot, StateError> {
        self.inner.commit(height, flush_to_disk)
    }

    fn flush_state(&mut self) {
        self.inner.flush_state()
    }
}

/// A bootstrapped machine over a [`FlakyState`], with the switches that control it.
pub fn flaky_machine(
    policy: Box<dyn EpochSealPolicy>,
) -> (ExecutionMachine<FlakyState>, StateFaults) {
    let store: Arc<dyn NodeStore> = Arc::new(MemoryStore::new());
    let faults = StateFaults::default();
    let state = FlakyState {
        inner: StateDb::open(store.clone(), 256).unwrap(),
        faults: faults.clone(),
    };
    let mut machine = ExecutionMachine::new(
        chain(),
        state,
        store,
        Arc::new(ScriptedExecutor),
        policy,
        Notifier::new(16),
        MachineOptions::default(),
    )
    .unwrap();
    machine.bootstrap(&chain()).unwrap();
    (machine, faults)
}

/// A `MemoryStore` whose writes can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    pub fail_state: AtomicBool,
    pub fail_blocks: AtomicBool,
}

impl NodeStore for FlakyStore {
    fn get_state(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        self.inner.get_state(key)
    }

    fn commit_state(&self, input: CommitInput) -> Result<(), StorageError> {
        if self.fail_state.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("disk full".into()));
        }
        self.inner.commit_state(input)
    }

    fn head(&self) -> Result<Option<(Height, StateRoot)>, StorageError> {
        self.inner.head()
    }

    fn put_block(&self, block: &Block) -> Result<(), StorageError> {
        if self.fail_blocks.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("disk full".into()));
        }
        self.inner.put_block(block)
    }

    fn get_block_by_height(&self, height: Height) -> Result<Option<Block>, StorageError> {
        self.inner.get_block_by_height(height)
    }

    fn get_block_by_hash(&self, hash: &H256) -> Result<Option<Block>, StorageError> {
        self.inner.get_block_by_hash(hash)
    }
}

pub fn machine_over(
    store: Arc<dyn NodeStore>,
    executor: Arc<dyn TransactionExecutor>,
    policy: Box<dyn EpochSealPolicy>,
) -> ExecutionMachine<StateDb> {
    machine_with(store, executor, policy, MachineOptions::default())
}

pub fn machine_with(
    store: Arc<dyn NodeStore>,
    executor: Arc<dyn TransactionExecutor>,
    policy: Box<dyn EpochSealPolicy>,
    options: MachineOptions,
) -> ExecutionMachine<StateDb> {
    let state = StateDb::open(store.clone(), 256).unwrap();
    ExecutionMachine::new(
        chain(),
        state,
        store,
        executor,
        policy,
        Notifier::new(16),
        options,
    )
    .unwrap()
}

pub fn fresh_machine() -> ExecutionMachine<StateDb> {
    machine_over(
        Arc::new(MemoryStore::new()),
        Arc::new(ScriptedExecutor),
        Box::new(NeverSeal),
    )
}

pub fn bootstrapped() -> ExecutionMachine<StateDb> {
    let mut machine = fresh_machine();
    machine.bootstrap(&chain()).unwrap();
    machine
}
