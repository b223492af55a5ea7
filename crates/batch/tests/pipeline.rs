#![forbid(unsafe_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use ripple_batch::{forward, Accumulator, BulkGateway, BulkOutcome, GatewayError};
use ripple_core::{Attr, AttrMap, ChangeKey, ChangeKind, ChangeRecord};
use ripple_translate::{
    ActionBody, ActionHeader, EntityProcessor, IndexOperation, Registry, Translation,
};

/// Captures every flushed batch.
#[derive(Default)]
struct RecordingGateway {
    batches: Mutex<Vec<Vec<IndexOperation>>>,
}

impl RecordingGateway {
    fn batches(&self) -> Vec<Vec<IndexOperation>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl BulkGateway for RecordingGateway {
    async fn bulk(&self, operations: &[IndexOperation]) -> Result<BulkOutcome, GatewayError> {
        self.batches.lock().unwrap().push(operations.to_vec());
        Ok(BulkOutcome::default())
    }
}

/// Counts calls, fails every one of them.
#[derive(Default)]
struct FailingGateway {
    calls: Mutex<usize>,
}

#[async_trait]
impl BulkGateway for FailingGateway {
    async fn bulk(&self, _operations: &[IndexOperation]) -> Result<BulkOutcome, GatewayError> {
        *self.calls.lock().unwrap() += 1;
        Err(GatewayError::Transport("connection refused".into()))
    }
}

fn order_record(id: &str, size_bytes: u64) -> ChangeRecord {
    let mut image = AttrMap::new();
    image.insert("orderId".to_string(), Attr::Str(id.to_string()));
    image.insert("status".to_string(), Attr::Str("placed".to_string()));
    ChangeRecord {
        kind: ChangeKind::Created,
        key: ChangeKey { partition: format!("ORDER#{id}"), sort: format!("ORDER#{id}") },
        old_image: AttrMap::new(),
        new_image: image,
        size_bytes,
    }
}

fn unknown_record() -> ChangeRecord {
    ChangeRecord {
        kind: ChangeKind::Created,
        key: ChangeKey { partition: "AUDIT#1".into(), sort: "AUDIT#1".into() },
        old_image: AttrMap::new(),
        new_image: AttrMap::from([("auditId".to_string(), Attr::Str("1".into()))]),
        size_bytes: 10,
    }
}

#[tokio::test]
async fn flushes_on_size_threshold_and_at_end() {
    let registry = Registry::with_default_processors();
    let mut acc = Accumulator::with_threshold(100);
    let gateway = RecordingGateway::default();

    // 40-byte records against a 100-byte threshold: the counter first
    // exceeds the threshold on the third add (120 > 100).
    let records: Vec<_> = (1..=7).map(|i| order_record(&i.to_string(), 40)).collect();
    let report = forward(records, &registry, &mut acc, &gateway).await;

    let batches = gateway.batches();
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[0].len(), 3);
    assert_eq!(batches[1].len(), 3);
    assert_eq!(batches[2].len(), 1, "terminal flush ships the partial batch");
    assert_eq!(report.flushes, 3);
    assert_eq!(report.translated, 7);
    assert!(acc.is_empty());
    assert_eq!(acc.size_bytes(), 0);
}

#[tokio::test]
async fn oversized_record_flushes_alone() {
    let registry = Registry::with_default_processors();
    let mut acc = Accumulator::with_threshold(100);
    let gateway = RecordingGateway::default();

    let records = vec![order_record("big", 10_000), order_record("small", 10)];
    forward(records, &registry, &mut acc, &gateway).await;

    let batches = gateway.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].len(), 1);
    assert_eq!(batches[0][0].action.doc_id, "big");
    assert_eq!(batches[1][0].action.doc_id, "small");
}

#[tokio::test]
async fn failed_flush_clears_and_never_resends() {
    let registry = Registry::with_default_processors();
    let mut acc = Accumulator::with_threshold(1_000_000);
    let gateway = FailingGateway::default();

    let report = forward(vec![order_record("1", 10)], &registry, &mut acc, &gateway).await;

    assert_eq!(*gateway.calls.lock().unwrap(), 1);
    assert!(acc.is_empty(), "failure still clears the buffer");
    assert_eq!(acc.size_bytes(), 0);
    assert_eq!(report.flushes, 1);

    // Nothing left to retry.
    assert!(!acc.flush(&gateway).await);
    assert_eq!(*gateway.calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn unrouted_and_untranslated_records_are_skipped() {
    let registry = Registry::with_default_processors();
    let mut acc = Accumulator::with_threshold(1_000_000);
    let gateway = RecordingGateway::default();

    let deleted_order = ChangeRecord {
        kind: ChangeKind::Deleted,
        key: ChangeKey { partition: "ORDER#9".into(), sort: "ORDER#9".into() },
        old_image: AttrMap::from([("orderId".to_string(), Attr::Str("9".into()))]),
        new_image: AttrMap::new(),
        size_bytes: 50,
    };
    let records = vec![unknown_record(), deleted_order, order_record("1", 10)];
    let report = forward(records, &registry, &mut acc, &gateway).await;

    assert_eq!(report.records, 3);
    assert_eq!(report.unrouted, 1);
    assert_eq!(report.untranslated, 1);
    assert_eq!(report.translated, 1);
    let batches = gateway.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);
}

#[tokio::test]
async fn malformed_operations_are_excluded_at_the_boundary() {
    let registry = Registry::with_default_processors();
    let mut acc = Accumulator::with_threshold(1_000_000);
    let gateway = RecordingGateway::default();

    // No orderId attribute: the document id comes out empty and the
    // validation gate drops the operation instead of shipping it.
    let mut missing_id = order_record("1", 10);
    missing_id.new_image.remove("orderId");

    forward(vec![missing_id, order_record("2", 10)], &registry, &mut acc, &gateway).await;

    let batches = gateway.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);
    assert_eq!(batches[0][0].action.doc_id, "2");
}

#[tokio::test]
async fn translation_can_demand_an_immediate_flush() {
    struct FlushEvery;
    impl EntityProcessor for FlushEvery {
        fn index_name(&self) -> &'static str {
            "things"
        }
        fn id_field(&self) -> &'static str {
            "id"
        }
        fn can_handle(&self, _record: &ChangeRecord) -> bool {
            true
        }
        fn prepare(&self, record: &ChangeRecord) -> Translation {
            Translation {
                operation: Some(IndexOperation {
                    action: ActionHeader::new("things", record.key.partition.clone()),
                    body: ActionBody::Doc { doc: serde_json::json!({}), doc_as_upsert: true },
                }),
                flush_after: true,
            }
        }
    }

    let registry = Registry::new(vec![Box::new(FlushEvery)]);
    let mut acc = Accumulator::with_threshold(1_000_000);
    let gateway = RecordingGateway::default();

    let records = vec![order_record("1", 1), order_record("2", 1)];
    let report = forward(records, &registry, &mut acc, &gateway).await;

    // One flush per record, well under the size threshold.
    assert_eq!(gateway.batches().len(), 2);
    assert_eq!(report.flushes, 2);
}
