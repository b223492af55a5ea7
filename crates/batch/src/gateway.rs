//! The bulk-write boundary: validation gate, gateway trait, and the dry-run
//! gateway used by local tooling. Network transports implement [`BulkGateway`]
//! out of tree.

use async_trait::async_trait;
use ripple_translate::{op::render_bulk_body, IndexOperation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Transport-level failure of one bulk call.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("transport: {0}")]
    Transport(String),
}

/// Per-item failure reported by the index engine inside an otherwise
/// successful bulk call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemFailure {
    pub doc_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub took_ms: u64,
    pub failures: Vec<ItemFailure>,
}

/// Executes one bulk call per flush. Implementations report per-item
/// failures in the outcome and transport failures as errors; they must not
/// retry on Ripple's behalf.
#[async_trait]
pub trait BulkGateway: Send + Sync {
    async fn bulk(&self, operations: &[IndexOperation]) -> Result<BulkOutcome, GatewayError>;
}

/// Operation excluded at the transmission boundary, reported rather than
/// silently dropped.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedOperation {
    /// Position within the flushed batch.
    pub position: usize,
    pub reason: &'static str,
}

/// Keep only operations with a non-empty target index and document id.
pub fn validate(ops: Vec<IndexOperation>) -> (Vec<IndexOperation>, Vec<SkippedOperation>) {
    let mut valid = Vec::with_capacity(ops.len());
    let mut skipped = Vec::new();
    for (position, op) in ops.into_iter().enumerate() {
        if op.action.is_valid() {
            valid.push(op);
        } else {
            skipped.push(SkippedOperation { position, reason: "missing target index or document id" });
        }
    }
    (valid, skipped)
}

/// Dry-run gateway: renders the NDJSON bulk body into the log and
/// acknowledges everything.
#[derive(Debug, Default)]
pub struct LogGateway;

#[async_trait]
impl BulkGateway for LogGateway {
    async fn bulk(&self, operations: &[IndexOperation]) -> Result<BulkOutcome, GatewayError> {
        match render_bulk_body(operations) {
            Ok(body) => debug!(ops = operations.len(), body = %body, "bulk body (dry run)"),
            Err(e) => warn!(error = %e, "bulk body rendering failed"),
        }
        info!(ops = operations.len(), "bulk write skipped (dry run)");
        Ok(BulkOutcome::default())
    }
}
