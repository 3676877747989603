// Path: crates/storage/src/metrics.rs
use once_cell::sync::OnceCell;
use weft_telemetry::sinks::{NopSink, StorageMetricsSink};

static NOP_SINK: NopSink = NopSink;
/// The storage sink used by this crate. Falls back to the global telemetry sink.
pub static SINK: OnceCell<&'static dyn StorageMetricsSink> = OnceCell::new();

/// Returns the sink storage metrics are reported to.
pub fn metrics() -> &'static dyn StorageMetricsSink {
    match SINK.get().copied() {
        Some(sink) => sink,
        None => match weft_telemetry::sinks::SINK.get().copied() {
            Some(global) => global.as_storage_sink(),
            None => &NOP_SINK,
        },
    }
}
