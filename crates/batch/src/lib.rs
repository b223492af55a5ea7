//! Ripple batch accumulation: collect translated operations, track payload
//! size, flush through the bulk-write gateway.

#![forbid(unsafe_code)]

pub mod gateway;
pub mod pipeline;

use metrics::{counter, histogram};
use ripple_translate::IndexOperation;
use tracing::{error, info, warn};

use crate::gateway::validate;

pub use gateway::{BulkGateway, BulkOutcome, GatewayError, ItemFailure, LogGateway, SkippedOperation};
pub use pipeline::{forward, ForwardReport};

/// Flush threshold override, in bytes.
const THRESHOLD_ENV: &str = "RIPPLE_MAX_BATCH_BYTES";

// Aiming for roughly 5-15 MiB per bulk body, where index throughput is best.
const DEFAULT_THRESHOLD_BYTES: u64 = 5 * 1024 * 1024;

fn default_threshold() -> u64 {
    std::env::var(THRESHOLD_ENV)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_THRESHOLD_BYTES)
}

/// Size-bounded buffer of bulk operations for one invocation.
///
/// The size counter tracks the source records' reported byte sizes as a
/// proxy for operation size; operations themselves are never measured.
pub struct Accumulator {
    ops: Vec<IndexOperation>,
    size_bytes: u64,
    threshold_bytes: u64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::with_threshold(default_threshold())
    }

    pub fn with_threshold(threshold_bytes: u64) -> Self {
        Self { ops: Vec::new(), size_bytes: 0, threshold_bytes }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Append one operation, counting `size_bytes` toward the threshold.
    pub fn add(&mut self, op: IndexOperation, size_bytes: u64) {
        self.ops.push(op);
        self.size_bytes += size_bytes;
    }

    /// True once the running size exceeds the threshold, or when the last
    /// translation demanded an immediate flush.
    pub fn should_flush(&self, force: bool) -> bool {
        force || self.size_bytes > self.threshold_bytes
    }

    /// Hand the buffer to the gateway and reset. State is taken before the
    /// call, so a failed batch is discarded rather than silently retried;
    /// transport errors and per-item failures are logged, never propagated.
    /// Returns whether a non-empty buffer was flushed.
    pub async fn flush(&mut self, gateway: &dyn BulkGateway) -> bool {
        if self.ops.is_empty() {
            return false;
        }
        let ops = std::mem::take(&mut self.ops);
        let size_bytes = self.size_bytes;
        self.size_bytes = 0;

        let (valid, skipped) = validate(ops);
        for skip in &skipped {
            warn!(position = skip.position, reason = skip.reason, "operation excluded from bulk body");
            counter!("bulk_ops_skipped_total", 1u64);
        }
        if valid.is_empty() {
            warn!("no valid operations in batch; nothing sent");
            return true;
        }

        counter!("bulk_flush_total", 1u64);
        histogram!("bulk_batch_bytes", size_bytes as f64);
        histogram!("bulk_batch_ops", valid.len() as f64);

        match gateway.bulk(&valid).await {
            Ok(outcome) => {
                info!(ops = valid.len(), took_ms = outcome.took_ms, "bulk write acknowledged");
                for failure in &outcome.failures {
                    warn!(doc_id = %failure.doc_id, reason = %failure.reason, "bulk item failed");
                    counter!("bulk_item_failures_total", 1u64);
                }
            }
            Err(e) => {
                // Redelivery is the upstream trigger's job; this batch is gone.
                error!(error = %e, dropped = valid.len(), "bulk write failed; batch discarded");
                counter!("bulk_write_errors_total", 1u64);
            }
        }
        true
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}
