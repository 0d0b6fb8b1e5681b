//! 🧪 End-to-end batch runs against in-memory backends.
//!
//! 🎬 *[five messages. one cursed store key. the report must name exactly one.]*

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::json;
use svmig::app_config::MigrationConfig;
use svmig::backends::{Collaborators, DocumentStore, InMemorySource, InMemoryStore, SourceBackend, StoredDocument};
use svmig::batch::{BatchProcessor, queue_batch};
use svmig::error::StoreError;
use svmig::model::{LegacyDataset, LegacyServiceRecord, MigrationState, QueueBatch, ServiceType};
use svmig::processor::ServiceMigrationProcessor;
use tracing::Level;

fn a_practice(id: i64, odscode: &str) -> LegacyServiceRecord {
    LegacyServiceRecord {
        id,
        uid: format!("{}", 138_000 + id),
        name: format!("Practice {id}"),
        odscode: Some(odscode.to_string()),
        typeid: 100,
        statusid: Some(1),
        publicname: Some(format!("Practice {id}")),
        address: Some(format!("{id} High Street")),
        town: Some("Leeds".to_string()),
        postcode: Some("LS1 4AP".to_string()),
        email: Some(format!("practice{id}@nhs.net")),
        ..Default::default()
    }
}

fn the_source(services: Vec<LegacyServiceRecord>) -> InMemorySource {
    InMemorySource::from_dataset(LegacyDataset {
        services,
        service_types: vec![ServiceType {
            id: 100,
            name: "GP Practice".to_string(),
        }],
        ..Default::default()
    })
}

/// 💣 Wraps a real store; writes to the cursed keys fail as if the store were throttling.
#[derive(Debug)]
struct CursedStore {
    inner: InMemoryStore,
    cursed_keys: HashSet<String>,
    armed: AtomicBool,
}

#[async_trait]
impl DocumentStore for CursedStore {
    async fn get(&self, key: &str) -> Result<Option<StoredDocument>, StoreError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, document: StoredDocument, expected_version: Option<u64>) -> Result<(), StoreError> {
        if self.armed.load(Ordering::SeqCst) && self.cursed_keys.contains(key) {
            return Err(StoreError::Unavailable(anyhow::anyhow!("ProvisionedThroughputExceeded")));
        }
        self.inner.put(key, document, expected_version).await
    }
}

/// 🏎️ Wraps a real store; just before the first write to `raced_key`, a rival engine
/// with its own state store commits to the same key, leaving our expected version stale.
#[derive(Debug)]
struct RacedStore {
    inner: InMemoryStore,
    raced_key: String,
    rival: tokio::sync::Mutex<Option<(BatchProcessor, QueueBatch)>>,
}

#[async_trait]
impl DocumentStore for RacedStore {
    async fn get(&self, key: &str) -> Result<Option<StoredDocument>, StoreError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, document: StoredDocument, expected_version: Option<u64>) -> Result<(), StoreError> {
        if key == self.raced_key {
            let rival = self.rival.lock().await.take();
            if let Some((rival_engine, rival_batch)) = rival {
                rival_engine.handle_batch(rival_batch, not_cancelled()).await;
            }
        }
        self.inner.put(key, document, expected_version).await
    }
}

fn the_engine(source: InMemorySource, store: Arc<dyn DocumentStore>) -> BatchProcessor {
    let collaborators = Collaborators {
        source: Arc::new(SourceBackend::InMemory(source)),
        store,
    };
    let config = MigrationConfig::default();
    BatchProcessor::new(
        Arc::new(ServiceMigrationProcessor::from_collaborators(&collaborators, &config)),
        config.concurrency,
    )
}

fn services_event(message_id: &str, record_id: i64, method: &str) -> (String, String) {
    (
        message_id.to_string(),
        json!({"record_id": record_id, "table_name": "services", "method": method}).to_string(),
    )
}

fn not_cancelled() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

async fn the_state(store: &InMemoryStore, key: &str) -> anyhow::Result<MigrationState> {
    let the_document = store
        .snapshot()
        .await
        .remove(key)
        .ok_or_else(|| anyhow::anyhow!("no state stored under {key}"))?;
    Ok(serde_json::from_value(the_document.body)?)
}

#[tokio::test]
async fn the_one_where_item_three_of_five_is_the_only_one_sent_back() -> anyhow::Result<()> {
    let the_services = (1..=5).map(|id| a_practice(id, &format!("A1234{id}"))).collect();
    let the_backing = InMemoryStore::default();
    let the_store = Arc::new(CursedStore {
        inner: the_backing.clone(),
        cursed_keys: HashSet::from(["services#3".to_string()]),
        armed: AtomicBool::new(true),
    });
    let the_engine = the_engine(the_source(the_services), the_store.clone());

    let the_batch = queue_batch((1..=5).map(|id| services_event(&format!("item{id}"), id, "insert")));
    let the_report = the_engine.handle_batch(the_batch.clone(), not_cancelled()).await;

    assert_eq!(the_report.failed_ids(), vec!["item3"]);
    let the_snapshot = the_backing.snapshot().await;
    for committed in [1, 2, 4, 5] {
        assert!(the_snapshot.contains_key(&format!("services#{committed}")), "services#{committed} missing");
    }
    assert!(!the_snapshot.contains_key("services#3"));
    let the_metrics = the_engine.metrics();
    assert_eq!((the_metrics.total, the_metrics.inserted, the_metrics.errored), (5, 4, 1));

    // 🔁 the store recovers and the queue redelivers everything
    the_store.armed.store(false, Ordering::SeqCst);
    let the_report = the_engine.handle_batch(the_batch, not_cancelled()).await;
    assert!(the_report.failed_ids().is_empty());
    let the_metrics = the_engine.metrics();
    assert_eq!((the_metrics.inserted, the_metrics.skipped), (1, 4));
    Ok(())
}

#[tokio::test]
async fn the_one_where_permanent_failures_stay_out_of_the_report() -> anyhow::Result<()> {
    let the_services = vec![
        a_practice(1, "A12345"),
        a_practice(2, "X12345"),
        LegacyServiceRecord {
            statusid: Some(2),
            ..a_practice(3, "B12345")
        },
    ];
    let the_backing = InMemoryStore::default();
    let the_engine = the_engine(the_source(the_services), Arc::new(the_backing.clone()));

    let mut the_messages = vec![
        services_event("ok", 1, "insert"),
        services_event("unsupported", 2, "insert"),
        services_event("closed", 3, "update"),
        services_event("missing", 404, "update"),
    ];
    the_messages.push(("garbage".to_string(), "this is not json".to_string()));
    the_messages.push((
        "other-table".to_string(),
        json!({"record_id": 1, "table_name": "openingtimes", "method": "update"}).to_string(),
    ));
    let the_report = the_engine.handle_batch(queue_batch(the_messages), not_cancelled()).await;

    assert!(the_report.failed_ids().is_empty(), "{:?}", the_report.failed_ids());
    assert_eq!(the_backing.len().await, 1);
    let the_metrics = the_engine.metrics();
    assert_eq!(the_metrics.total, 6);
    assert_eq!(the_metrics.inserted, 1);
    assert_eq!(the_metrics.unsupported, 1);
    assert_eq!(the_metrics.skipped, 1);
    // 🔍 missing record + bad body + unknown table
    assert_eq!(the_metrics.errored, 3);

    let the_org = the_state(&the_backing, "services#1")
        .await?
        .organisation
        .ok_or_else(|| anyhow::anyhow!("no organisation"))?;
    assert_eq!(the_org.identifier_ods_ods_code.as_deref(), Some("A12345"));
    Ok(())
}

#[tokio::test]
async fn the_one_where_a_redelivery_is_a_no_op() -> anyhow::Result<()> {
    let the_backing = InMemoryStore::default();
    let the_engine = the_engine(the_source(vec![a_practice(1, "A12345")]), Arc::new(the_backing.clone()));
    let the_batch = queue_batch([services_event("m-1", 1, "insert")]);

    the_engine.handle_batch(the_batch.clone(), not_cancelled()).await;
    the_engine.handle_batch(the_batch, not_cancelled()).await;

    assert_eq!(the_state(&the_backing, "services#1").await?.version, 1);
    assert_eq!(the_engine.metrics().skipped, 1);
    assert_eq!(the_engine.metrics().inserted, 0);
    Ok(())
}

#[tokio::test]
async fn the_one_where_delete_tombstones_and_endpoints_resync() -> anyhow::Result<()> {
    let the_source = the_source(vec![a_practice(1, "A12345")]);
    let the_backing = InMemoryStore::default();
    let the_engine = the_engine(the_source.clone(), Arc::new(the_backing.clone()));

    the_engine
        .handle_batch(queue_batch([services_event("m-1", 1, "insert")]), not_cancelled())
        .await;

    // 🔌 the phone on the service changed via an endpoint row touch
    the_source
        .upsert_service(LegacyServiceRecord {
            publicphone: Some("0113 234 5678".to_string()),
            ..a_practice(1, "A12345")
        })
        .await;
    let the_endpoint_event = (
        "m-2".to_string(),
        json!({"record_id": 77, "service_id": 1, "table_name": "serviceendpoints", "method": "update"}).to_string(),
    );
    let the_report = the_engine.handle_batch(queue_batch([the_endpoint_event]), not_cancelled()).await;
    assert!(the_report.failed_ids().is_empty());
    assert_eq!(the_engine.metrics().updated, 1);
    assert_eq!(the_state(&the_backing, "services#1").await?.version, 2);

    the_engine
        .handle_batch(queue_batch([services_event("m-3", 1, "delete")]), not_cancelled())
        .await;
    let the_state = the_state(&the_backing, "services#1").await?;
    assert!(the_state.deleted);
    assert_eq!(the_state.version, 3);
    assert!(the_state.organisation.is_some());
    Ok(())
}

#[tokio::test]
async fn the_one_where_cancellation_sends_everything_back_untouched() {
    let the_services = (1..=3).map(|id| a_practice(id, &format!("A1234{id}"))).collect();
    let the_backing = InMemoryStore::default();
    let the_engine = the_engine(the_source(the_services), Arc::new(the_backing.clone()));

    let the_batch = queue_batch((1..=3).map(|id| services_event(&format!("item{id}"), id, "insert")));
    let the_report = the_engine.handle_batch(the_batch, Arc::new(AtomicBool::new(true))).await;

    assert_eq!(the_report.failed_ids(), vec!["item1", "item2", "item3"]);
    assert!(the_backing.is_empty().await);
    assert_eq!(the_engine.metrics().total, 0);
}

#[tokio::test]
async fn the_one_where_the_report_speaks_the_queue_dialect() -> anyhow::Result<()> {
    let the_batch: QueueBatch = serde_json::from_value(json!({
        "Records": [
            {"messageId": "abc-1", "body": "{\"record_id\":1,\"table_name\":\"services\",\"method\":\"insert\"}"}
        ]
    }))?;
    let the_store = Arc::new(CursedStore {
        inner: InMemoryStore::default(),
        cursed_keys: HashSet::from(["services#1".to_string()]),
        armed: AtomicBool::new(true),
    });
    let the_engine = the_engine(the_source(vec![a_practice(1, "A12345")]), the_store);

    let the_report = the_engine.handle_batch(the_batch, not_cancelled()).await;
    assert_eq!(
        serde_json::to_value(&the_report)?,
        json!({"batchItemFailures": [{"itemIdentifier": "abc-1"}]})
    );
    Ok(())
}

#[tokio::test]
async fn the_one_where_another_process_got_there_first() -> anyhow::Result<()> {
    let the_backing = InMemoryStore::default();

    // 🥈 the rival process already migrated record 2 once
    let the_rival_source = the_source(vec![a_practice(2, "A12342")]);
    let the_rival = the_engine(the_rival_source.clone(), Arc::new(the_backing.clone()));
    the_rival
        .handle_batch(queue_batch([services_event("rival-1", 2, "insert")]), not_cancelled())
        .await;
    the_rival_source
        .upsert_service(LegacyServiceRecord {
            name: "Practice 2 (their edit)".to_string(),
            ..a_practice(2, "A12342")
        })
        .await;

    let our_services = vec![
        a_practice(1, "A12341"),
        LegacyServiceRecord {
            name: "Practice 2 (our edit)".to_string(),
            ..a_practice(2, "A12342")
        },
        a_practice(3, "A12343"),
    ];
    let the_store = Arc::new(RacedStore {
        inner: the_backing.clone(),
        raced_key: "services#2".to_string(),
        rival: tokio::sync::Mutex::new(Some((
            the_rival,
            queue_batch([services_event("rival-2", 2, "update")]),
        ))),
    });
    let the_engine = the_engine(the_source(our_services), the_store);

    let the_batch = queue_batch((1..=3).map(|id| services_event(&format!("item{id}"), id, "update")));
    let the_report = the_engine.handle_batch(the_batch, not_cancelled()).await;

    assert_eq!(the_report.failed_ids(), vec!["item2"]);
    assert_eq!(the_state(&the_backing, "services#1").await?.version, 1);
    assert_eq!(the_state(&the_backing, "services#3").await?.version, 1);
    // 🏁 the rival's write stands, ours did not land on top of it
    let the_winner = the_state(&the_backing, "services#2").await?;
    assert_eq!(the_winner.version, 2);
    assert_eq!(
        the_winner.organisation.map(|o| o.name),
        Some("Practice 2 (their edit)".to_string())
    );
    let the_metrics = the_engine.metrics();
    assert_eq!((the_metrics.inserted, the_metrics.errored), (2, 1));
    Ok(())
}

#[tokio::test]
async fn the_one_where_two_batches_at_once_each_get_their_own_count() -> anyhow::Result<()> {
    let the_services = (1..=4).map(|id| a_practice(id, &format!("A1234{id}"))).collect();
    let the_backing = InMemoryStore::default();
    let the_engine = the_engine(the_source(the_services), Arc::new(the_backing.clone()));
    let the_other_handle = the_engine.clone();

    let the_first = queue_batch([services_event("a-1", 1, "insert"), services_event("a-2", 2, "insert")]);
    let the_second = queue_batch([services_event("b-3", 3, "insert"), services_event("b-4", 4, "insert")]);
    let (first_report, second_report) = tokio::join!(
        the_engine.handle_batch(the_first, not_cancelled()),
        the_other_handle.handle_batch(the_second, not_cancelled()),
    );

    assert!(first_report.failed_ids().is_empty());
    assert!(second_report.failed_ids().is_empty());
    assert_eq!(the_backing.len().await, 4);
    // 📸 whichever ran last owns the counters, and nobody zeroed them mid-run
    let the_metrics = the_engine.metrics();
    assert_eq!((the_metrics.total, the_metrics.inserted), (2, 2));
    Ok(())
}

/// 📝 In-memory log sink for counting what got said.
#[derive(Debug, Clone, Default)]
struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log sink poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn text(&self) -> String {
        self.0
            .lock()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }
}

#[tokio::test]
async fn the_one_where_each_failure_is_told_once() -> anyhow::Result<()> {
    let the_logs = CapturedLogs::default();
    let the_writer = the_logs.clone();
    let the_subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_ansi(false)
        .with_writer(move || the_writer.clone())
        .finish();
    let _default = tracing::subscriber::set_default(the_subscriber);

    let the_store = Arc::new(CursedStore {
        inner: InMemoryStore::default(),
        cursed_keys: HashSet::from(["services#1".to_string()]),
        armed: AtomicBool::new(true),
    });
    let the_engine = the_engine(the_source(vec![a_practice(1, "A12345")]), the_store);
    let the_batch = queue_batch([
        services_event("retry-me", 1, "insert"),
        (
            "other-table".to_string(),
            json!({"record_id": 1, "table_name": "openingtimes", "method": "update"}).to_string(),
        ),
    ]);

    let the_report = the_engine.handle_batch(the_batch, not_cancelled()).await;
    assert_eq!(the_report.failed_ids(), vec!["retry-me"]);

    let the_text = the_logs.text();
    assert_eq!(the_text.matches("SM_PROC_009").count(), 1, "{the_text}");
    assert_eq!(the_text.matches("SM_PROC_015").count(), 1, "{the_text}");
    assert_eq!(the_text.matches("SM_APP_004").count(), 0, "{the_text}");
    Ok(())
}
