// Path: crates/execution/tests/block_lifecycle.rs

mod common;

use common::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use weft_api::executor::ExecutionConfig;
use weft_api::state::StateAccess;
use weft_api::storage::NodeStore;
use weft_execution::{FixedLengthEpochs, MachineOptions, NeverSeal, TransferExecutor};
use weft_storage::MemoryStore;
use weft_types::app::{
    Address, ChainInfo, GenesisAllocation, TxCode, ValidatorSet, ValidatorWeight, U256,
};
use weft_types::error::{ChainError, FatalError, LifecycleError};

fn fee(gas: u64, price: u64) -> U256 {
    U256::from(gas) * U256::from(price)
}

fn mutated(field: &str) -> ChainInfo {
    let mut supplied = chain();
    match field {
        "chain_id" => supplied.chain_id += 1,
        "name" => supplied.name.push('x'),
        "genesis_time" => supplied.genesis_time += 1,
        "block_gas_limit" => supplied.block_gas_limit -= 1,
        "validators" => supplied.validators[0].weight += 1,
        "allocations" => supplied.allocations.push(GenesisAllocation {
            address: Address::repeat_byte(0xcc),
            balance: U256::one(),
        }),
        other => panic!("no mutation for {other}"),
    }
    supplied
}

#[test]
fn genesis_mismatch_in_any_field_is_fatal() {
    let mut machine = fresh_machine();
    for field in [
        "chain_id",
        "name",
        "genesis_time",
        "block_gas_limit",
        "validators",
        "allocations",
    ] {
        let err = machine.bootstrap(&mutated(field)).unwrap_err();
        assert!(err.is_fatal(), "{field} mismatch must be fatal");
        match err {
            ChainError::Fatal(FatalError::GenesisMismatch { fields }) => {
                assert_eq!(fields, vec![field])
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(!machine.is_bootstrapped());
    }

    machine.bootstrap(&chain()).unwrap();
    assert!(machine.is_bootstrapped());
}

#[test]
fn genesis_initializes_state_and_block_zero() {
    let mut machine = fresh_machine();
    let root = machine.bootstrap(&chain()).unwrap();

    assert_eq!(machine.block_number(), 0);
    assert_eq!(machine.state_root(), root);
    let genesis = machine.block_by_height(0).unwrap().unwrap();
    assert_eq!(genesis.header.state_root, root);
    assert_eq!(genesis.header.timestamp, chain().genesis_time);
    assert_eq!(machine.last_block_hash(), genesis.hash());

    assert_eq!(machine.account(&alice()).unwrap().balance, U256::exp10(18));
    let sets = machine.validator_sets().unwrap();
    assert_eq!(sets.current.len(), 3);
    assert_eq!(sets.current.total_weight, 30);
    assert!(sets.next.is_none());

    let again = machine.bootstrap(&chain()).unwrap_err();
    assert!(matches!(
        again,
        ChainError::Lifecycle(LifecycleError::AlreadyBootstrapped)
    ));
}

#[test]
fn genesis_replay_writes_nothing() {
    let store: Arc<dyn NodeStore> = Arc::new(MemoryStore::new());
    let root = {
        let mut machine = machine_over(
            store.clone(),
            Arc::new(TransferExecutor),
            Box::new(NeverSeal),
        );
        machine.bootstrap(&chain()).unwrap();
        let mut ctx = machine.begin_block(1, 1_700_000_010).unwrap();
        machine
            .apply_transaction(&mut ctx, &payload(1, transfer(alice(), bob(), 0, 5)))
            .unwrap();
        let sealed = machine.end_block(ctx, 1).unwrap();
        machine.commit(sealed).unwrap().state_root
    };

    let mut restarted = machine_over(
        store.clone(),
        Arc::new(TransferExecutor),
        Box::new(NeverSeal),
    );
    assert_eq!(restarted.block_number(), 1);
    assert_eq!(restarted.bootstrap(&chain()).unwrap(), root);
    assert!(!restarted.state().has_pending_writes());
    assert_eq!(store.head().unwrap(), Some((1, root)));

    // The mismatch guard still applies on replay.
    let mut other = machine_over(store, Arc::new(TransferExecutor), Box::new(NeverSeal));
    let mut supplied = chain();
    supplied.chain_id += 1;
    assert!(other.bootstrap(&supplied).unwrap_err().is_fatal());
}

#[test]
fn end_block_height_mismatch_is_fatal() {
    for supplied in [2u64, 0] {
        let mut machine = bootstrapped();
        let ctx = machine.begin_block(1, 1_700_000_010).unwrap();
        let err = machine.end_block(ctx, supplied).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(
            err,
            ChainError::Fatal(FatalError::HeightMismatch { expected: 1, got }) if got == supplied
        ));
    }
}

#[test]
fn begin_block_requires_the_next_height() {
    let mut unbooted = fresh_machine();
    assert!(matches!(
        unbooted.begin_block(1, 0).unwrap_err(),
        ChainError::Lifecycle(LifecycleError::NotBootstrapped)
    ));

    let mut machine = bootstrapped();
    let err = machine.begin_block(2, 0).unwrap_err();
    assert!(matches!(
        err,
        ChainError::Fatal(FatalError::HeightMismatch {
            expected: 1,
            got: 2
        })
    ));

    let _ctx = machine.begin_block(1, 0).unwrap();
    assert!(matches!(
        machine.begin_block(1, 0).unwrap_err(),
        ChainError::Lifecycle(LifecycleError::BlockAlreadyOpen { height: 1 })
    ));
}

#[test]
fn skipped_transaction_leaves_no_trace() {
    let mut machine = bootstrapped();
    let t1 = transfer(alice(), bob(), 0, 100);
    let mut t2 = transfer(bob(), alice(), 0, 50);
    t2.data = b"skip".to_vec();
    t2.gas = 30_000;
    let t3 = transfer(bob(), alice(), 0, 7);

    let mut ctx = machine.begin_block(1, 1_700_000_010).unwrap();
    let o1 = machine.apply_transaction(&mut ctx, &payload(1, t1.clone())).unwrap();
    let o2 = machine.apply_transaction(&mut ctx, &payload(2, t2.clone())).unwrap();
    let o3 = machine.apply_transaction(&mut ctx, &payload(3, t3.clone())).unwrap();

    assert_eq!(o1.code, TxCode::Ok);
    assert_eq!(o1.info(), "ok");
    assert_eq!(o1.gas_used, 21_000);
    assert_eq!(o2.code, TxCode::Skipped);
    assert_eq!(o2.info(), "skipped");
    assert_eq!(o2.gas_wanted, 30_000);
    assert_eq!(o2.gas_used, 0);
    assert_eq!(o2.tx_hash, t2.hash());
    assert_eq!(o3.code, TxCode::Ok);

    assert_eq!(ctx.transactions(), &[t1, t3][..]);
    assert_eq!(ctx.receipts().len(), 2);
    assert_eq!(ctx.tx_count(), 2);
    assert_eq!(ctx.cumulative_gas(), 42_000);
    assert_eq!(ctx.gas_available(), 1_000_000 - 42_000);
    let expected_fee = fee(21_000, GAS_PRICE) * 2;
    assert_eq!(ctx.total_fee(), expected_fee);
    assert_eq!(ctx.origination().get(&validator(1)), fee(21_000, GAS_PRICE));
    assert_eq!(ctx.origination().get(&validator(2)), U256::zero());
    assert_eq!(ctx.origination().get(&validator(3)), fee(21_000, GAS_PRICE));
    assert_eq!(ctx.receipts()[1].logs[0].tx_index, 1);
    assert_eq!(ctx.receipts()[1].cumulative_gas_used, 42_000);
    assert_eq!(machine.state().get(b"scribble").unwrap(), None);

    let sealed = machine.end_block(ctx, 1).unwrap();
    assert_eq!(sealed.header().tx_count, 2);
    assert_eq!(sealed.header().gas_used, 42_000);
    assert_eq!(sealed.header().total_fee, expected_fee);
    let response = machine.commit(sealed).unwrap();
    assert_eq!(response.receipts.len(), 2);

    assert_eq!(
        machine.origination_score(&validator(2)).unwrap(),
        U256::zero()
    );
    assert_eq!(machine.status().total_transactions, 2);
    assert_eq!(machine.state().get(b"scribble").unwrap(), None);
    // Bob's skipped transfer did not consume his nonce.
    assert_eq!(machine.account(&bob()).unwrap().nonce, 1);
}

#[test]
fn executor_errors_are_skipped_too() {
    let mut machine = bootstrapped();
    let mut ctx = machine.begin_block(1, 1_700_000_010).unwrap();

    let stale = transfer(alice(), bob(), 5, 1);
    let mut broke = transfer(alice(), bob(), 0, 1);
    broke.value = U256::exp10(19);
    let outcomes = [
        machine.apply_transaction(&mut ctx, &payload(1, stale)).unwrap(),
        machine.apply_transaction(&mut ctx, &payload(1, broke)).unwrap(),
    ];
    assert!(outcomes.iter().all(|o| o.code == TxCode::Skipped && o.gas_used == 0));
    assert_eq!(ctx.tx_count(), 0);
    assert_eq!(ctx.total_fee(), U256::zero());
    assert!(ctx.origination().is_empty());

    let ok = machine
        .apply_transaction(&mut ctx, &payload(2, transfer(alice(), bob(), 0, 1)))
        .unwrap();
    assert!(ok.is_ok());
    assert_eq!(ctx.receipts()[0].logs[0].tx_index, 0);
}

#[test]
fn fee_total_overflow_skips_the_transaction() {
    let mut machine = bootstrapped();
    let mut ctx = machine.begin_block(1, 0).unwrap();
    machine
        .apply_transaction(&mut ctx, &payload(1, transfer(alice(), bob(), 0, 1)))
        .unwrap();

    let mut whale = transfer(bob(), alice(), 0, 1);
    whale.data = b"whale".to_vec();
    whale.gas = 30_000;
    let outcome = machine.apply_transaction(&mut ctx, &payload(2, whale)).unwrap();
    assert_eq!(outcome.code, TxCode::Skipped);
    assert_eq!(outcome.gas_used, 0);
    assert_eq!(ctx.tx_count(), 1);
    assert_eq!(ctx.total_fee(), fee(21_000, GAS_PRICE));
    assert_eq!(ctx.origination().get(&validator(2)), U256::zero());

    let sealed = machine.end_block(ctx, 1).unwrap();
    machine.commit(sealed).unwrap();
    assert_eq!(machine.account(&bob()).unwrap().nonce, 0);
}

#[test]
fn executor_always_runs_non_strict() {
    let options = MachineOptions {
        execution: ExecutionConfig {
            strict: true,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut machine = machine_with(
        Arc::new(MemoryStore::new()),
        Arc::new(ScriptedExecutor),
        Box::new(NeverSeal),
        options,
    );
    machine.bootstrap(&chain()).unwrap();
    let mut ctx = machine.begin_block(1, 0).unwrap();
    let outcome = machine
        .apply_transaction(&mut ctx, &payload(1, transfer(alice(), bob(), 0, 1)))
        .unwrap();
    assert!(outcome.is_ok());
}

#[test]
fn merge_failure_after_execution_is_fatal() {
    let (mut machine, faults) = flaky_machine(Box::new(NeverSeal));
    let mut ctx = machine.begin_block(1, 0).unwrap();
    faults.merges.store(true, Ordering::SeqCst);

    // A skipped transaction has nothing to merge.
    let mut skipped = transfer(bob(), alice(), 0, 1);
    skipped.data = b"skip".to_vec();
    let outcome = machine.apply_transaction(&mut ctx, &payload(2, skipped)).unwrap();
    assert_eq!(outcome.code, TxCode::Skipped);

    let err = machine
        .apply_transaction(&mut ctx, &payload(1, transfer(alice(), bob(), 0, 1)))
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        ChainError::Fatal(FatalError::BlockAborted { height: 1, .. })
    ));
    assert_eq!(ctx.tx_count(), 0);
}

#[test]
fn state_failure_while_closing_is_fatal() {
    let (mut machine, faults) =
        flaky_machine(Box::new(FixedLengthEpochs { blocks_per_epoch: 1 }));
    let ctx = machine.begin_block(1, 0).unwrap();
    faults.validator_reads.store(true, Ordering::SeqCst);

    let err = machine.end_block(ctx, 1).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        ChainError::Fatal(FatalError::BlockAborted { height: 1, .. })
    ));
}

#[test]
fn malformed_payload_is_fatal() {
    let mut machine = bootstrapped();
    let mut ctx = machine.begin_block(1, 0).unwrap();
    let err = machine
        .apply_transaction(&mut ctx, &[0xde, 0xad])
        .unwrap_err();
    assert!(matches!(
        err,
        ChainError::Fatal(FatalError::MalformedPayload(_))
    ));
}

#[test]
fn fees_sum_exactly_into_origination_scores() {
    let mut machine = bootstrapped();
    let prices = [1_000u64, 3_333, 7, 1_000_000_007, 42];
    let mut expected = U256::zero();

    for round in 0..2u64 {
        let height = round + 1;
        let before: Vec<U256> = (1..=3)
            .map(|v| machine.origination_score(&validator(v)).unwrap())
            .collect();

        let mut ctx = machine.begin_block(height, 1_700_000_000 + height).unwrap();
        let mut block_fee = U256::zero();
        for (i, price) in prices.iter().enumerate() {
            let mut tx = transfer(alice(), bob(), round * 5 + i as u64, 1);
            tx.gas_price = U256::from(*price);
            tx.data = vec![0u8; i];
            let intrinsic = 21_000 + 16 * i as u64;
            tx.gas = intrinsic + 500;
            let originator = (i % 3) as u8 + 1;
            let outcome = machine
                .apply_transaction(&mut ctx, &payload(originator, tx))
                .unwrap();
            assert!(outcome.is_ok());
            assert_eq!(outcome.gas_used, intrinsic);
            block_fee += fee(intrinsic, *price);
        }
        assert_eq!(ctx.total_fee(), block_fee);
        assert_eq!(ctx.origination().total(), Some(block_fee));
        expected += block_fee;

        let sealed = machine.end_block(ctx, height).unwrap();
        machine.commit(sealed).unwrap();

        let delta = (1..=3).fold(U256::zero(), |acc, v| {
            acc + machine.origination_score(&validator(v)).unwrap() - before[v as usize - 1]
        });
        assert_eq!(delta, block_fee);
        let header = machine.block_by_height(height).unwrap().unwrap().header;
        assert_eq!(header.total_fee, block_fee);
    }

    let total = (1..=3).fold(U256::zero(), |acc, v| {
        acc + machine.origination_score(&validator(v)).unwrap()
    });
    assert_eq!(total, expected);
}

#[test]
fn commit_links_blocks_and_tracks_status() {
    let mut machine = bootstrapped();
    let genesis_hash = machine.last_block_hash();

    let ctx = machine.begin_block(1, 1_700_000_001).unwrap();
    assert_eq!(ctx.header().parent_hash, genesis_hash);
    let sealed = machine.end_block(ctx, 1).unwrap();
    let response = machine.commit(sealed).unwrap();
    assert_eq!(response.height, 1);
    assert_eq!(response.state_root, machine.state_root());

    let ctx = machine.begin_block(2, 1_700_000_002).unwrap();
    assert_eq!(ctx.header().parent_hash, response.block_hash);
    let sealed = machine.end_block(ctx, 2).unwrap();
    let second = machine.commit(sealed).unwrap();
    assert_ne!(second.state_root, response.state_root);

    let by_hash = machine.block_by_hash(&second.block_hash).unwrap().unwrap();
    assert_eq!(by_hash.header.height, 2);
    assert_eq!(machine.status().latest_timestamp, 1_700_000_002);
}

#[test]
fn persistence_failure_is_fatal() {
    let store = Arc::new(FlakyStore::default());
    let mut machine = machine_over(
        store.clone(),
        Arc::new(TransferExecutor),
        Box::new(NeverSeal),
    );
    machine.bootstrap(&chain()).unwrap();

    let mut ctx = machine.begin_block(1, 0).unwrap();
    machine
        .apply_transaction(&mut ctx, &payload(1, transfer(alice(), bob(), 0, 1)))
        .unwrap();
    let sealed = machine.end_block(ctx, 1).unwrap();
    store.fail_state.store(true, Ordering::SeqCst);
    let err = machine.commit(sealed).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        ChainError::Fatal(FatalError::PersistenceFailed(_))
    ));
    assert_eq!(machine.block_number(), 0);
}

#[test]
fn block_store_failure_is_fatal() {
    let store = Arc::new(FlakyStore::default());
    let mut machine = machine_over(
        store.clone(),
        Arc::new(TransferExecutor),
        Box::new(NeverSeal),
    );
    machine.bootstrap(&chain()).unwrap();

    let ctx = machine.begin_block(1, 0).unwrap();
    let sealed = machine.end_block(ctx, 1).unwrap();
    store.fail_blocks.store(true, Ordering::SeqCst);
    assert!(matches!(
        machine.commit(sealed).unwrap_err(),
        ChainError::Fatal(FatalError::PersistenceFailed(_))
    ));
}

#[test]
fn epoch_seal_promotes_staged_validators() {
    let mut machine = machine_over(
        Arc::new(MemoryStore::new()),
        Arc::new(TransferExecutor),
        Box::new(FixedLengthEpochs { blocks_per_epoch: 2 }),
    );
    machine.bootstrap(&chain()).unwrap();
    machine
        .stage_validator_set(ValidatorSet::new(vec![
            ValidatorWeight {
                id: validator(1),
                weight: 10,
            },
            ValidatorWeight {
                id: validator(2),
                weight: 25,
            },
        ]))
        .unwrap();

    let ctx = machine.begin_block(1, 0).unwrap();
    let sealed = machine.end_block(ctx, 1).unwrap();
    assert!(!sealed.seal_epoch());
    assert!(sealed.validator_updates().is_empty());
    machine.commit(sealed).unwrap();
    assert_eq!(machine.status().epoch, 0);

    let ctx = machine.begin_block(2, 0).unwrap();
    assert_eq!(ctx.header().epoch, 0);
    let sealed = machine.end_block(ctx, 2).unwrap();
    assert!(sealed.seal_epoch());
    assert!(sealed.consensus_params().is_none());
    let updates: Vec<(u8, u64)> = sealed
        .validator_updates()
        .iter()
        .map(|u| (u.id.0[0], u.weight))
        .collect();
    assert_eq!(updates, vec![(2, 25), (3, 0)]);
    let response = machine.commit(sealed).unwrap();
    assert!(response.seal_epoch);
    assert_eq!(machine.status().epoch, 1);

    let sets = machine.validator_sets().unwrap();
    assert_eq!(sets.current.total_weight, 35);
    assert!(sets.next.is_none());

    let ctx = machine.begin_block(3, 0).unwrap();
    assert_eq!(ctx.header().epoch, 1);
}

#[test]
fn restart_resumes_from_the_last_commit() {
    let store: Arc<dyn NodeStore> = Arc::new(MemoryStore::new());
    let (hash, root) = {
        let mut machine = machine_over(
            store.clone(),
            Arc::new(TransferExecutor),
            Box::new(NeverSeal),
        );
        machine.bootstrap(&chain()).unwrap();
        for height in 1..=2 {
            let mut ctx = machine.begin_block(height, height).unwrap();
            machine
                .apply_transaction(
                    &mut ctx,
                    &payload(1, transfer(alice(), bob(), height - 1, 10)),
                )
                .unwrap();
            let sealed = machine.end_block(ctx, height).unwrap();
            machine.commit(sealed).unwrap();
        }
        (machine.last_block_hash(), machine.state_root())
    };

    let mut machine = machine_over(store, Arc::new(TransferExecutor), Box::new(NeverSeal));
    assert_eq!(machine.block_number(), 2);
    assert_eq!(machine.last_block_hash(), hash);
    assert_eq!(machine.state_root(), root);
    assert_eq!(machine.status().total_transactions, 2);
    machine.bootstrap(&chain()).unwrap();

    let ctx = machine.begin_block(3, 3).unwrap();
    assert_eq!(ctx.header().parent_hash, hash);
    assert_eq!(machine.account(&alice()).unwrap().nonce, 2);
}
