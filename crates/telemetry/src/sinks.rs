// Path: crates/telemetry/src/sinks.rs
//! Defines abstract traits for metrics reporting, decoupling core logic from the backend.

use once_cell::sync::OnceCell;

// --- Static Sink Access ---

/// A no-op sink for use in tests or when telemetry is disabled.
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

/// A lazily-initialized static reference to the global `MetricsSink` implementation.
pub static SINK: OnceCell<&'static dyn MetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

/// Returns a static reference to the configured error metrics sink.
/// If no sink has been initialized, it returns a no-op sink.
pub fn error_metrics() -> &'static dyn ErrorMetricsSink {
    match SINK.get().copied() {
        Some(sink) => sink.as_error_sink(),
        None => &NOP_SINK,
    }
}

/// Returns a static reference to the configured execution metrics sink.
/// If no sink has been initialized, it returns a no-op sink.
pub fn execution_metrics() -> &'static dyn ExecutionMetricsSink {
    match SINK.get().copied() {
        Some(sink) => sink.as_execution_sink(),
        None => &NOP_SINK,
    }
}

/// Returns a static reference to the configured storage metrics sink.
/// If no sink has been initialized, it returns a no-op sink.
pub fn storage_metrics() -> &'static dyn StorageMetricsSink {
    match SINK.get().copied() {
        Some(sink) => sink.as_storage_sink(),
        None => &NOP_SINK,
    }
}

// --- Trait Definitions ---

/// A sink for metrics related to the persistent storage layer.
pub trait StorageMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments the total number of bytes written to the storage backend.
    fn inc_bytes_written_total(&self, bytes: u64);
    /// Increments the total number of blocks persisted.
    fn inc_blocks_persisted(&self);
    /// Sets the gauge for the number of state versions held in memory awaiting flush.
    fn set_unflushed_versions(&self, count: u64);
}
impl StorageMetricsSink for NopSink {
    fn inc_bytes_written_total(&self, _bytes: u64) {}
    fn inc_blocks_persisted(&self) {}
    fn set_unflushed_versions(&self, _count: u64) {}
}

/// A sink for metrics related to block application.
pub trait ExecutionMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments the counter of delivered transactions, labeled `ok` or `skipped`.
    fn inc_transactions(&self, outcome: &'static str);
    /// Increments the counter of committed blocks.
    fn inc_blocks_committed(&self);
    /// Increments the counter of sealed epochs.
    fn inc_epochs_sealed(&self);
    /// Sets the gauge for the latest committed height.
    fn set_block_height(&self, height: u64);
    /// Observes the gas used by a committed block.
    fn observe_block_gas_used(&self, gas: u64);
    /// Observes the duration of a commit.
    fn observe_commit_duration(&self, duration_secs: f64);
}
impl ExecutionMetricsSink for NopSink {
    fn inc_transactions(&self, _outcome: &'static str) {}
    fn inc_blocks_committed(&self) {}
    fn inc_epochs_sealed(&self) {}
    fn set_block_height(&self, _height: u64) {}
    fn observe_block_gas_used(&self, _gas: u64) {}
    fn observe_commit_duration(&self, _duration_secs: f64) {}
}

/// A sink for recording structured error metrics.
pub trait ErrorMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for a specific error, categorized by its kind and variant.
    fn inc_error(&self, kind: &'static str, variant: &'static str);
}
impl ErrorMetricsSink for NopSink {
    fn inc_error(&self, _kind: &'static str, _variant: &'static str) {}
}

/// A unified sink that implements all domain-specific traits, providing a single
/// point of implementation for metrics backends like Prometheus.
pub trait MetricsSink: StorageMetricsSink + ExecutionMetricsSink + ErrorMetricsSink {
    /// Views this sink as a storage sink.
    fn as_storage_sink(&self) -> &dyn StorageMetricsSink;
    /// Views this sink as an execution sink.
    fn as_execution_sink(&self) -> &dyn ExecutionMetricsSink;
    /// Views this sink as an error sink.
    fn as_error_sink(&self) -> &dyn ErrorMetricsSink;
}

// Blanket implementation to allow any type that implements all sub-traits
// to be used as a `MetricsSink`.
impl<T> MetricsSink for T
where
    T: StorageMetricsSink + ExecutionMetricsSink + ErrorMetricsSink,
{
    fn as_storage_sink(&self) -> &dyn StorageMetricsSink {
        self
    }
    fn as_execution_sink(&self) -> &dyn ExecutionMetricsSink {
        self
    }
    fn as_error_sink(&self) -> &dyn ErrorMetricsSink {
        self
    }
}
