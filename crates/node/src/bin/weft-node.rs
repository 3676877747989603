// Path: crates/node/src/bin/weft-node.rs
#![forbid(unsafe_code)]

//! The main binary for a Weft validator node.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use weft_api::storage::NodeStore;
use weft_execution::epoch::policy_from_config;
use weft_execution::{
    Application, ExecutionMachine, MachineOptions, Notifier, TransferExecutor,
};
use weft_node::{parse_batches, run_batch};
use weft_state::state_db::DEFAULT_CACHE_ENTRIES;
use weft_state::StateDb;
use weft_storage::RedbStore;
use weft_types::app::ChainInfo;
use weft_types::config::NodeConfig;

const DB_FILE: &str = "weft.redb";

#[derive(Parser, Debug)]
struct NodeOpts {
    #[clap(long, help = "Path to the node.toml configuration file.")]
    config: PathBuf,
    #[clap(
        long,
        help = "Genesis descriptor delivered by consensus (JSON). Defaults to the node's own."
    )]
    genesis: Option<PathBuf>,
    #[clap(long, help = "Ordered batches to apply, one JSON object per line.")]
    batches: Option<PathBuf>,
}

fn spawn_subscribers(notifier: &Notifier) {
    let mut blocks = notifier.subscribe_blocks();
    tokio::spawn(async move {
        loop {
            match blocks.recv().await {
                Ok(block) => tracing::debug!(
                    target: "notify",
                    event = "block",
                    height = block.header.height,
                    txs = block.transactions.len(),
                    hash = %hex::encode(block.hash().as_bytes()),
                ),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(target: "notify", event = "lagged", stream = "blocks", missed)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut logs = notifier.subscribe_logs();
    tokio::spawn(async move {
        loop {
            match logs.recv().await {
                Ok(batch) => {
                    for log in batch.iter() {
                        tracing::trace!(
                            target: "notify",
                            event = "log",
                            height = log.block_height,
                            tx_index = log.tx_index,
                            log_index = log.log_index,
                        );
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(target: "notify", event = "lagged", stream = "logs", missed)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    weft_telemetry::init::init_tracing()?;

    let opts = NodeOpts::parse();
    tracing::info!(target: "node", event = "startup", config = ?opts.config);

    let config_str = fs::read_to_string(&opts.config)
        .with_context(|| format!("reading {}", opts.config.display()))?;
    let config: NodeConfig = toml::from_str(&config_str)?;
    config.validate().map_err(|e| anyhow!(e))?;

    let readiness = Arc::new(AtomicBool::new(false));
    if let Some(addr) = &config.telemetry_addr {
        let metrics_sink = weft_telemetry::prometheus::install()?;
        weft_telemetry::sinks::SINK
            .set(metrics_sink)
            .map_err(|_| anyhow!("metrics sink must only be set once"))?;
        let telemetry_addr = addr.parse()?;
        tokio::spawn(weft_telemetry::http::run_server(
            telemetry_addr,
            readiness.clone(),
        ));
    }

    fs::create_dir_all(&config.data_dir)?;
    let store: Arc<dyn NodeStore> = Arc::new(RedbStore::open(config.data_dir.join(DB_FILE))?);
    let state = StateDb::open(store.clone(), DEFAULT_CACHE_ENTRIES)?;
    let notifier = Notifier::new(config.notifications.channel_capacity);
    spawn_subscribers(&notifier);

    let machine = ExecutionMachine::new(
        config.chain.clone(),
        state,
        store,
        Arc::new(TransferExecutor),
        policy_from_config(&config.epoch),
        notifier,
        MachineOptions::from(&config),
    )?;
    let mut app = Application::new(machine);

    let genesis: ChainInfo = match &opts.genesis {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)
            .with_context(|| format!("parsing genesis {}", path.display()))?,
        None => config.chain.clone(),
    };
    let root = app.init_chain(&genesis)?;
    readiness.store(true, Ordering::SeqCst);
    tracing::info!(
        target: "node",
        event = "ready",
        chain_id = genesis.chain_id,
        height = app.machine().block_number(),
        root = %hex::encode(root.as_bytes()),
    );

    let Some(path) = &opts.batches else {
        return Ok(());
    };
    let batches = parse_batches(&fs::read_to_string(path)?)?;
    for batch in &batches {
        if batch.height <= app.machine().block_number() {
            tracing::debug!(target: "node", event = "already_committed", height = batch.height);
            continue;
        }
        if let Err(e) = run_batch(&mut app, batch) {
            if e.is_fatal() {
                tracing::error!(target: "node", event = "fatal", height = batch.height, error = %e);
                std::process::exit(1);
            }
            return Err(e.into());
        }
    }
    tracing::info!(
        target: "node",
        event = "replayed",
        batches = batches.len(),
        height = app.machine().block_number(),
    );
    Ok(())
}
