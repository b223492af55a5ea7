//! Invocation driver: route each delivered record, translate it, accumulate,
//! flush on threshold or signal, and always flush once more at the end.

use chrono::{DateTime, Utc};
use metrics::counter;
use ripple_core::ChangeRecord;
use ripple_translate::Registry;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::gateway::BulkGateway;
use crate::Accumulator;

/// Per-invocation summary.
#[derive(Debug, Clone, Serialize)]
pub struct ForwardReport {
    pub invocation: Uuid,
    pub started_at: DateTime<Utc>,
    /// Records delivered by the trigger.
    pub records: usize,
    /// Records that produced an operation.
    pub translated: usize,
    /// Records no processor claimed.
    pub unrouted: usize,
    /// Claimed records whose translation produced nothing.
    pub untranslated: usize,
    /// Non-empty flushes, terminal flush included.
    pub flushes: usize,
}

/// Process one delivered batch of change records, strictly in order.
///
/// Failures below the gateway boundary never abort the invocation; the
/// report always covers the whole input.
pub async fn forward<I>(
    records: I,
    registry: &Registry,
    accumulator: &mut Accumulator,
    gateway: &dyn BulkGateway,
) -> ForwardReport
where
    I: IntoIterator<Item = ChangeRecord>,
{
    let mut report = ForwardReport {
        invocation: Uuid::new_v4(),
        started_at: Utc::now(),
        records: 0,
        translated: 0,
        unrouted: 0,
        untranslated: 0,
        flushes: 0,
    };
    info!(invocation = %report.invocation, "forwarding change batch");

    for record in records {
        report.records += 1;
        let Some(processor) = registry.route(&record) else {
            debug!(partition = %record.key.partition, "no processor claims record");
            counter!("records_unrouted_total", 1u64);
            report.unrouted += 1;
            continue;
        };
        let translation = processor.prepare(&record);
        match translation.operation {
            Some(op) => {
                accumulator.add(op, record.size_bytes);
                report.translated += 1;
            }
            None => {
                debug!(
                    partition = %record.key.partition,
                    sort = %record.key.sort,
                    "change not translatable; skipped"
                );
                report.untranslated += 1;
            }
        }
        if accumulator.should_flush(translation.flush_after) && accumulator.flush(gateway).await {
            report.flushes += 1;
        }
    }

    // Partial batches never outlive the invocation.
    if accumulator.flush(gateway).await {
        report.flushes += 1;
    }

    info!(
        invocation = %report.invocation,
        records = report.records,
        translated = report.translated,
        unrouted = report.unrouted,
        untranslated = report.untranslated,
        flushes = report.flushes,
        "change batch forwarded"
    );
    report
}
