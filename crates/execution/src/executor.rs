// Path: crates/execution/src/executor.rs
//! A value-transfer transaction executor.

use weft_api::executor::{ExecutionConfig, GasPool, ProcessOutcome, TransactionExecutor};
use weft_api::state::StateAccess;
use weft_types::app::{
    keccak256, Account, Address, BlockHeader, Log, Receipt, ReceiptStatus, Transaction, H256,
    U256,
};
use weft_types::codec;
use weft_types::error::{StateError, TransactionError};
use weft_types::keys::account_key;

/// Base gas charged for every transaction.
pub const TX_GAS: u64 = 21_000;
/// Gas charged per byte of transaction data.
pub const TX_DATA_GAS_PER_BYTE: u64 = 16;

/// Intrinsic gas of a transaction carrying `data`, or `None` on overflow.
pub fn intrinsic_gas(data: &[u8]) -> Option<u64> {
    let len = u64::try_from(data.len()).ok()?;
    len.checked_mul(TX_DATA_GAS_PER_BYTE)?.checked_add(TX_GAS)
}

/// Topic 0 of the log emitted for every transfer.
pub fn transfer_topic() -> H256 {
    keccak256(b"Transfer(address,address,uint256)")
}

fn load_account(state: &dyn StateAccess, address: &Address) -> Result<Account, StateError> {
    match state.get(&account_key(address))? {
        Some(bytes) => codec::from_bytes_canonical(&bytes).map_err(StateError::Decode),
        None => Ok(Account::default()),
    }
}

fn store_account(
    state: &mut dyn StateAccess,
    address: &Address,
    account: &Account,
) -> Result<(), StateError> {
    let bytes = codec::to_bytes_canonical(account).map_err(StateError::InvalidValue)?;
    state.insert(&account_key(address), &bytes)
}

/// Moves value between accounts and charges intrinsic gas.
///
/// Contract creation is not supported: it is skipped, or rejected in strict mode.
/// The fee is `intrinsic gas × gas price`; the unused part of the gas limit is
/// returned to the block pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferExecutor;

impl TransactionExecutor for TransferExecutor {
    fn process_tx(
        &self,
        tx: &Transaction,
        _tx_index: u32,
        gas_pool: &mut GasPool,
        cumulative_gas: &mut u64,
        _header: &BlockHeader,
        state: &mut dyn StateAccess,
        config: &ExecutionConfig,
    ) -> Result<ProcessOutcome, TransactionError> {
        let Some(to) = tx.to else {
            if config.strict {
                return Err(TransactionError::Invalid(
                    "contract creation is not supported".into(),
                ));
            }
            return Ok(ProcessOutcome::Skipped {
                reason: "contract creation is not supported".into(),
            });
        };
        if tx.gas_price < U256::from(config.min_gas_price) {
            return Err(TransactionError::GasPriceTooLow);
        }
        let intrinsic = intrinsic_gas(&tx.data)
            .ok_or_else(|| TransactionError::Invalid("intrinsic gas overflow".into()))?;
        if tx.gas < intrinsic {
            return Err(TransactionError::IntrinsicGas {
                required: intrinsic,
                provided: tx.gas,
            });
        }

        let mut sender = load_account(state, &tx.from)?;
        if tx.nonce < sender.nonce {
            return Err(TransactionError::NonceTooLow {
                expected: sender.nonce,
                got: tx.nonce,
            });
        }
        if tx.nonce > sender.nonce {
            return Err(TransactionError::NonceTooHigh {
                expected: sender.nonce,
                got: tx.nonce,
            });
        }
        let max_cost = tx
            .max_cost()
            .ok_or_else(|| TransactionError::Invalid("cost overflows 256 bits".into()))?;
        if sender.balance < max_cost {
            return Err(TransactionError::InsufficientFunds {
                balance: sender.balance.to_string(),
                required: max_cost.to_string(),
            });
        }

        gas_pool.sub_gas(tx.gas)?;
        gas_pool.add_gas(tx.gas - intrinsic);

        // Bounded by max_cost, which was checked above.
        let fee = U256::from(intrinsic) * tx.gas_price;
        sender.balance = sender.balance - tx.value - fee;
        sender.nonce += 1;
        store_account(state, &tx.from, &sender)?;

        let mut recipient = load_account(state, &to)?;
        recipient.balance = recipient
            .balance
            .checked_add(tx.value)
            .ok_or_else(|| TransactionError::Invalid("recipient balance overflow".into()))?;
        store_account(state, &to, &recipient)?;

        *cumulative_gas += intrinsic;

        let mut amount = [0u8; 32];
        tx.value.to_big_endian(&mut amount);
        let log = Log {
            address: to,
            topics: vec![transfer_topic(), H256::from(tx.from), H256::from(to)],
            data: amount.to_vec(),
            ..Default::default()
        };

        Ok(ProcessOutcome::Applied {
            receipt: Receipt {
                tx_hash: tx.hash(),
                status: ReceiptStatus::Success,
                gas_used: intrinsic,
                cumulative_gas_used: *cumulative_gas,
                logs: vec![log],
            },
            fee,
        })
    }
}
