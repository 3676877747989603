// Path: crates/telemetry/src/prometheus.rs
//! A concrete implementation of the metrics sinks using the Prometheus crate.

use crate::sinks::*;
use once_cell::sync::OnceCell;
use prometheus::{
    exponential_buckets, register_gauge, register_histogram, register_int_counter,
    register_int_counter_vec, Gauge, Histogram, IntCounter, IntCounterVec,
};

// --- Metric Statics ---
// The collectors are initialized exactly once by the `install` function.

static STORAGE_BYTES_WRITTEN_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static STORAGE_BLOCKS_PERSISTED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static STORAGE_UNFLUSHED_VERSIONS: OnceCell<Gauge> = OnceCell::new();
static EXECUTION_TRANSACTIONS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static EXECUTION_BLOCKS_COMMITTED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static EXECUTION_EPOCHS_SEALED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static EXECUTION_BLOCK_HEIGHT: OnceCell<Gauge> = OnceCell::new();
static EXECUTION_BLOCK_GAS_USED: OnceCell<Histogram> = OnceCell::new();
static EXECUTION_COMMIT_DURATION_SECONDS: OnceCell<Histogram> = OnceCell::new();
static ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

/// The Prometheus-backed metrics sink.
#[derive(Debug, Clone, Copy)]
pub struct PrometheusSink;

/// Resolves a collector, skipping the observation if `install()` has not run.
macro_rules! get_metric {
    ($metric:ident) => {
        match $metric.get() {
            Some(m) => m,
            None => return,
        }
    };
}

impl StorageMetricsSink for PrometheusSink {
    fn inc_bytes_written_total(&self, bytes: u64) {
        get_metric!(STORAGE_BYTES_WRITTEN_TOTAL).inc_by(bytes);
    }
    fn inc_blocks_persisted(&self) {
        get_metric!(STORAGE_BLOCKS_PERSISTED_TOTAL).inc();
    }
    fn set_unflushed_versions(&self, count: u64) {
        get_metric!(STORAGE_UNFLUSHED_VERSIONS).set(count as f64);
    }
}

impl ExecutionMetricsSink for PrometheusSink {
    fn inc_transactions(&self, outcome: &'static str) {
        get_metric!(EXECUTION_TRANSACTIONS_TOTAL)
            .with_label_values(&[outcome])
            .inc();
    }
    fn inc_blocks_committed(&self) {
        get_metric!(EXECUTION_BLOCKS_COMMITTED_TOTAL).inc();
    }
    fn inc_epochs_sealed(&self) {
        get_metric!(EXECUTION_EPOCHS_SEALED_TOTAL).inc();
    }
    fn set_block_height(&self, height: u64) {
        get_metric!(EXECUTION_BLOCK_HEIGHT).set(height as f64);
    }
    fn observe_block_gas_used(&self, gas: u64) {
        get_metric!(EXECUTION_BLOCK_GAS_USED).observe(gas as f64);
    }
    fn observe_commit_duration(&self, duration_secs: f64) {
        get_metric!(EXECUTION_COMMIT_DURATION_SECONDS).observe(duration_secs);
    }
}

impl ErrorMetricsSink for PrometheusSink {
    fn inc_error(&self, kind: &'static str, variant: &'static str) {
        get_metric!(ERRORS_TOTAL)
            .with_label_values(&[kind, variant])
            .inc();
    }
}

/// Initializes all Prometheus metrics collectors and returns a static reference to the sink.
/// This function must be called only once at application startup.
#[allow(clippy::expect_used)]
pub fn install() -> Result<&'static dyn MetricsSink, prometheus::Error> {
    STORAGE_BYTES_WRITTEN_TOTAL
        .set(register_int_counter!(
            "weft_storage_bytes_written_total",
            "Total bytes written to the storage backend."
        )?)
        .expect("static already initialized");
    STORAGE_BLOCKS_PERSISTED_TOTAL
        .set(register_int_counter!(
            "weft_storage_blocks_persisted_total",
            "Total number of blocks written to the node store."
        )?)
        .expect("static already initialized");
    STORAGE_UNFLUSHED_VERSIONS
        .set(register_gauge!(
            "weft_storage_unflushed_versions",
            "State versions committed in memory and not yet written to disk."
        )?)
        .expect("static already initialized");
    EXECUTION_TRANSACTIONS_TOTAL
        .set(register_int_counter_vec!(
            "weft_execution_transactions_total",
            "Delivered transactions by outcome.",
            &["outcome"]
        )?)
        .expect("static already initialized");
    EXECUTION_BLOCKS_COMMITTED_TOTAL
        .set(register_int_counter!(
            "weft_execution_blocks_committed_total",
            "Total number of committed blocks."
        )?)
        .expect("static already initialized");
    EXECUTION_EPOCHS_SEALED_TOTAL
        .set(register_int_counter!(
            "weft_execution_epochs_sealed_total",
            "Total number of sealed epochs."
        )?)
        .expect("static already initialized");
    EXECUTION_BLOCK_HEIGHT
        .set(register_gauge!(
            "weft_execution_block_height",
            "Height of the latest committed block."
        )?)
        .expect("static already initialized");
    EXECUTION_BLOCK_GAS_USED
        .set(register_histogram!(
            "weft_execution_block_gas_used",
            "Gas used per committed block.",
            exponential_buckets(21_000.0, 2.0, 16)?
        )?)
        .expect("static already initialized");
    EXECUTION_COMMIT_DURATION_SECONDS
        .set(register_histogram!(
            "weft_execution_commit_duration_seconds",
            "Latency of a block commit, including persistence.",
            exponential_buckets(0.0005, 2.0, 16)?
        )?)
        .expect("static already initialized");
    ERRORS_TOTAL
        .set(register_int_counter_vec!(
            "weft_errors_total",
            "Total number of errors, categorized by type and variant.",
            &["kind", "variant"]
        )?)
        .expect("static already initialized");

    static SINK: PrometheusSink = PrometheusSink;
    Ok(&SINK)
}
