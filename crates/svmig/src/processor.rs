//! 🏭 ServiceMigrationProcessor: one legacy record in, at most one meaningful write out.
//!
//! 🎬 *[a change event arrives. the processor cracks its knuckles.]*
//! *["fetch, select, filter, validate, transform, save." it has said this before.]*
//!
//! 🧠 Knowledge graph:
//! - Per record: fetch → select transformer → business filter → validate/sanitise →
//!   fatal check → transform the sanitised clone → attach issues → save.
//! - Every step either moves on or returns a classified [`MigrationError`]. The metrics
//!   bucket is chosen once, here, in [`ServiceMigrationProcessor::sync_service`]; callers
//!   never count twice.
//! - The processor is the explicit dependency object: source, caches, registry, state
//!   store and metrics all hang off it, built once per process and shared behind an `Arc`.
//! - Counted runs (a batch, a full sync) take turns through
//!   [`start_run`](ServiceMigrationProcessor::start_run), so one run never zeroes
//!   another's counters halfway through.
//! - [`handle_event`](ServiceMigrationProcessor::handle_event) routes a parsed change
//!   event: `services` insert/update → sync, `services` delete → tombstone,
//!   `serviceendpoints` → resync the owning service, anything else → `UnsupportedEvent`.
//!
//! 🦆 The duck passes validation. The duck always passes validation.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::app_config::MigrationConfig;
use crate::backends::{Collaborators, RecordSource};
use crate::cache::DosMetadata;
use crate::error::MigrationError;
use crate::metrics::{MetricsSnapshot, MigrationMetrics};
use crate::model::event::{SERVICE_ENDPOINTS_TABLE, SERVICES_TABLE};
use crate::model::{ChangeEvent, ChangeMethod, LegacyServiceRecord};
use crate::progress::{SyncProgress, metrics_table};
use crate::state::{MigrationStateStore, SaveOutcome};
use crate::transformers::{Eligibility, Transformer, TransformerRegistry};
use crate::validation::{FatalPolicy, Severity};

/// 📒 What a full sync leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncAllReport {
    pub metrics: MetricsSnapshot,
    /// 🔁 Records that hit a retryable failure, in source order.
    pub retryable: Vec<i64>,
}

#[derive(Debug)]
pub struct ServiceMigrationProcessor {
    source: Arc<dyn RecordSource>,
    metadata: DosMetadata,
    registry: TransformerRegistry,
    state: MigrationStateStore,
    policy: FatalPolicy,
    metrics: Arc<MigrationMetrics>,
    run_guard: Mutex<()>,
}

impl ServiceMigrationProcessor {
    pub fn new(
        source: Arc<dyn RecordSource>,
        metadata: DosMetadata,
        registry: TransformerRegistry,
        state: MigrationStateStore,
        policy: FatalPolicy,
    ) -> Self {
        Self {
            source,
            metadata,
            registry,
            state,
            policy,
            metrics: Arc::new(MigrationMetrics::default()),
            run_guard: Mutex::new(()),
        }
    }

    /// 🔧 Wire the processor from resolved backends and the engine knobs.
    pub fn from_collaborators(collaborators: &Collaborators, config: &MigrationConfig) -> Self {
        Self::new(
            collaborators.source.clone(),
            DosMetadata::new(collaborators.source.clone()),
            TransformerRegistry::from_config(config),
            MigrationStateStore::new(collaborators.store.clone(), config.state_table.clone()),
            FatalPolicy::new(config.fatal_issue_codes.iter().cloned()),
        )
    }

    pub fn metrics(&self) -> &Arc<MigrationMetrics> {
        &self.metrics
    }

    pub fn state(&self) -> &MigrationStateStore {
        &self.state
    }

    /// 🔒 Start a counted run: waits for any other run to finish, then zeroes the
    /// counters. Keep the guard alive until the run's snapshot has been read.
    pub async fn start_run(&self) -> MutexGuard<'_, ()> {
        let guard = self.run_guard.lock().await;
        self.metrics.reset();
        guard
    }

    /// 🚚 Migrate one service record and count the result.
    pub async fn sync_service(&self, record_id: i64) -> Result<SaveOutcome, MigrationError> {
        let span = info_span!("sync_service", record_id);
        async {
            self.metrics.inc_total();
            let outcome = self.migrate(record_id).await;
            match &outcome {
                Ok(saved) => self.record_outcome(saved),
                Err(err) => self.record_failure(record_id, err),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    /// 🪦 The source row is gone: tombstone its history.
    pub async fn delete_service(&self, record_id: i64) -> Result<SaveOutcome, MigrationError> {
        let span = info_span!("delete_service", record_id);
        async {
            self.metrics.inc_total();
            let outcome = self.state.tombstone(record_id).await;
            match &outcome {
                Ok(saved) => {
                    info!(code = "SM_PROC_011", record_id, outcome = ?saved, "🪦 delete event applied");
                    self.record_outcome(saved);
                }
                Err(err) => self.record_failure(record_id, err),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    /// 🧭 Route a parsed change event to the right operation.
    pub async fn handle_event(&self, event: &ChangeEvent) -> Result<SaveOutcome, MigrationError> {
        match (event.table_name.as_str(), event.method) {
            (SERVICES_TABLE, ChangeMethod::Insert | ChangeMethod::Update) => {
                self.sync_service(event.record_id).await
            }
            (SERVICES_TABLE, ChangeMethod::Delete) => self.delete_service(event.record_id).await,
            (SERVICE_ENDPOINTS_TABLE, _) => match event.service_id {
                Some(service_id) => {
                    debug!(
                        code = "SM_PROC_014",
                        endpoint_id = event.record_id,
                        service_id,
                        "🔌 endpoint changed, resyncing its service"
                    );
                    self.sync_service(service_id).await
                }
                None => Err(self.reject_event(MigrationError::unsupported_event(format!(
                    "endpoint change {} has no service_id",
                    event.record_id
                )))),
            },
            (table, _) => Err(self.reject_event(MigrationError::unsupported_event(format!(
                "table '{table}' is not migrated"
            )))),
        }
    }

    /// 📭 Count an event that never reached a record. Hands the error back for propagation.
    pub fn reject_event(&self, err: MigrationError) -> MigrationError {
        self.metrics.inc_total();
        self.metrics.record_error(&err);
        warn!(code = "SM_PROC_015", error = %err, "📭 change event rejected");
        err
    }

    /// 🌍 Walk every service in the source through the same path as a change event.
    ///
    /// Per-record failures are counted and logged, not returned. Records that failed
    /// retryably come back in the report for another go. Only failing to list the
    /// source is an error.
    pub async fn sync_all(&self, show_progress: bool) -> Result<SyncAllReport, MigrationError> {
        let _run = self.start_run().await;
        let ids = self
            .source
            .list_service_ids()
            .await
            .map_err(|err| MigrationError::transient("failed to list service ids", err))?;
        info!(code = "SM_PROC_012", records = ids.len(), "🌍 full sync started");

        let total = ids.len() as u64;
        let mut progress = if show_progress {
            SyncProgress::new(total)
        } else {
            SyncProgress::hidden(total)
        };
        let mut retryable = Vec::new();
        for id in ids {
            match self.sync_service(id).await {
                Ok(_) => {}
                Err(err) if err.is_retryable() => retryable.push(id),
                // 🧾 permanent: counted and logged by sync_service, nothing to chase
                Err(_) => {}
            }
            progress.advance(&self.metrics.snapshot());
        }
        progress.finish();

        let metrics = self.metrics.snapshot();
        info!(
            code = "SM_PROC_012",
            metrics = ?metrics,
            retryable = retryable.len(),
            "🏁 full sync finished"
        );
        debug!("\n{}", metrics_table(&metrics));
        Ok(SyncAllReport { metrics, retryable })
    }

    async fn migrate(&self, record_id: i64) -> Result<SaveOutcome, MigrationError> {
        let record = self.fetch(record_id).await?;
        info!(code = "SM_PROC_001", record_id, odscode = ?record.odscode, "🚚 processing service");

        let transformer = self.registry.select(&record)?;
        self.metrics.inc_supported();

        if let Eligibility::Ineligible(reason) = transformer.should_include_service(&record) {
            return Err(MigrationError::ExcludedService {
                record_id,
                reason: reason.to_string(),
            });
        }

        let validation = transformer.validate(&record);
        for issue in &validation.issues {
            let fatal = self.policy.is_fatal(issue);
            match issue.severity {
                Severity::Warning if !fatal => debug!(
                    code = "SM_PROC_013",
                    record_id,
                    issue_code = %issue.code,
                    field = %issue.field,
                    "🧐 validation issue: {}",
                    issue.message
                ),
                _ => warn!(
                    code = "SM_PROC_013",
                    record_id,
                    issue_code = %issue.code,
                    field = %issue.field,
                    fatal,
                    "🧐 validation issue: {}",
                    issue.message
                ),
            }
        }
        if validation.is_fatal(&self.policy) {
            return Err(MigrationError::FatalValidation {
                record_id,
                issues: validation.issues,
            });
        }

        let mut result = transformer
            .transform(&validation.sanitised, &self.metadata)
            .await?;
        result.validation_issues = validation.issues;
        self.metrics.inc_transformed();
        debug!(
            code = "SM_PROC_008",
            record_id,
            transformer = transformer.name(),
            issues = result.validation_issues.len(),
            "🔄 record transformed"
        );

        let outcome = self.state.save(record_id, &result).await?;
        info!(code = "SM_PROC_010", record_id, outcome = ?outcome, "💾 migration state saved");
        Ok(outcome)
    }

    async fn fetch(&self, record_id: i64) -> Result<LegacyServiceRecord, MigrationError> {
        self.source
            .get_service(record_id)
            .await
            .map_err(|err| MigrationError::transient(format!("failed to fetch service {record_id}"), err))?
            .ok_or(MigrationError::NotFound {
                entity: "service",
                id: record_id,
            })
    }

    fn record_outcome(&self, outcome: &SaveOutcome) {
        match outcome {
            SaveOutcome::Inserted { .. } => self.metrics.inc_inserted(),
            SaveOutcome::Updated { .. } | SaveOutcome::Tombstoned { .. } => self.metrics.inc_updated(),
            SaveOutcome::Unchanged { .. } | SaveOutcome::Absent => self.metrics.inc_skipped(),
        }
    }

    fn record_failure(&self, record_id: i64, err: &MigrationError) {
        self.metrics.record_error(err);
        match err {
            MigrationError::UnsupportedService { reason, .. } => {
                info!(code = "SM_PROC_005", record_id, reason = %reason, "🚫 service not supported")
            }
            MigrationError::ExcludedService { reason, .. } => {
                info!(code = "SM_PROC_006", record_id, reason = %reason, "🙅 service excluded")
            }
            MigrationError::FatalValidation { issues, .. } => warn!(
                code = "SM_PROC_007",
                record_id,
                issues = issues.len(),
                "🧱 fatal validation, nothing persisted"
            ),
            MigrationError::NotFound { .. } => {
                warn!(code = "SM_PROC_004", record_id, error = %err, "🔍 not found")
            }
            _ if err.is_retryable() => {
                error!(code = "SM_PROC_009", record_id, error = ?err, "🌩️ retryable failure")
            }
            _ => warn!(code = "SM_PROC_009", record_id, error = %err, "💀 permanent failure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{DocumentStore, InMemorySource, InMemoryStore, StoredDocument};
    use crate::error::StoreError;
    use crate::mapping::fixtures::{the_lookups, the_practice};
    use crate::model::{LegacyDataset, MigrationState};

    fn the_dataset(services: Vec<LegacyServiceRecord>) -> LegacyDataset {
        let the_lookups = the_lookups();
        LegacyDataset {
            services,
            service_types: the_lookups.service_type.into_iter().collect(),
            opening_days: the_lookups.opening_days.into_values().collect(),
            symptom_groups: the_lookups.symptom_groups.into_values().collect(),
            dispositions: the_lookups.dispositions.into_values().collect(),
        }
    }

    fn the_processor(
        services: Vec<LegacyServiceRecord>,
        config: &MigrationConfig,
    ) -> (InMemorySource, InMemoryStore, ServiceMigrationProcessor) {
        let the_source = InMemorySource::from_dataset(the_dataset(services));
        let the_store = InMemoryStore::default();
        let the_processor = ServiceMigrationProcessor::new(
            Arc::new(the_source.clone()),
            DosMetadata::new(Arc::new(the_source.clone())),
            TransformerRegistry::from_config(config),
            MigrationStateStore::new(Arc::new(the_store.clone()), config.state_table.clone()),
            FatalPolicy::new(config.fatal_issue_codes.iter().cloned()),
        );
        (the_source, the_store, the_processor)
    }

    async fn the_state(processor: &ServiceMigrationProcessor, id: i64) -> anyhow::Result<MigrationState> {
        processor
            .state()
            .load(&processor.state().source_record_id(id))
            .await?
            .ok_or_else(|| anyhow::anyhow!("no state for {id}"))
    }

    #[tokio::test]
    async fn the_one_where_a12345_gets_migrated() -> anyhow::Result<()> {
        let (_, the_store, the_processor) = the_processor(vec![the_practice()], &MigrationConfig::default());

        assert_eq!(the_processor.sync_service(1).await?, SaveOutcome::Inserted { version: 1 });

        let the_state = the_state(&the_processor, 1).await?;
        let the_org = the_state.organisation.ok_or_else(|| anyhow::anyhow!("no org"))?;
        assert_eq!(the_org.identifier_ods_ods_code.as_deref(), Some("A12345"));
        assert_eq!(the_store.len().await, 1);
        assert_eq!(
            the_processor.metrics().snapshot(),
            MetricsSnapshot {
                total: 1,
                supported: 1,
                transformed: 1,
                inserted: 1,
                ..Default::default()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_second_delivery_is_a_shrug() -> anyhow::Result<()> {
        let (_, _, the_processor) = the_processor(vec![the_practice()], &MigrationConfig::default());

        the_processor.sync_service(1).await?;
        assert_eq!(the_processor.sync_service(1).await?, SaveOutcome::Unchanged { version: 1 });
        assert_eq!(the_state(&the_processor, 1).await?.version, 1);
        assert_eq!(the_processor.metrics().snapshot().skipped, 1);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_same_rows_in_a_new_order_are_still_a_shrug() -> anyhow::Result<()> {
        let (the_source, the_store, the_processor) =
            the_processor(vec![the_practice()], &MigrationConfig::default());
        the_processor.sync_service(1).await?;

        let mut the_shuffle = the_practice();
        the_shuffle.endpoints.reverse();
        the_shuffle.scheduled_opening_times.reverse();
        for day in &mut the_shuffle.scheduled_opening_times {
            day.times.reverse();
        }
        the_shuffle.sgsds.reverse();
        the_shuffle.dispositions.reverse();
        the_source.upsert_service(the_shuffle).await;

        assert_eq!(the_processor.sync_service(1).await?, SaveOutcome::Unchanged { version: 1 });
        assert_eq!(the_state(&the_processor, 1).await?.version, 1);
        assert_eq!(the_store.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_an_edit_upstream_bumps_the_version() -> anyhow::Result<()> {
        let (the_source, _, the_processor) = the_processor(vec![the_practice()], &MigrationConfig::default());
        the_processor.sync_service(1).await?;

        the_source
            .upsert_service(LegacyServiceRecord {
                web: Some("www.ducklane.nhs.uk".to_string()),
                ..the_practice()
            })
            .await;

        match the_processor.sync_service(1).await? {
            SaveOutcome::Updated { version, changed } => {
                assert_eq!(version, 2);
                assert!(changed.iter().any(|path| path.ends_with("web")), "{changed:?}");
            }
            other => panic!("💀 expected an update, got {other:?}"),
        }
        assert_eq!(the_processor.metrics().snapshot().updated, 1);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_x12345_never_touches_the_store() -> anyhow::Result<()> {
        let the_record = LegacyServiceRecord {
            odscode: Some("X12345".to_string()),
            ..the_practice()
        };
        let (_, the_store, the_processor) = the_processor(vec![the_record], &MigrationConfig::default());

        match the_processor.sync_service(1).await {
            Err(MigrationError::UnsupportedService { reason, .. }) => {
                assert_eq!(reason, "ODS code does not match the required format")
            }
            other => panic!("💀 expected unsupported, got {other:?}"),
        }
        assert!(the_store.is_empty().await);
        let the_metrics = the_processor.metrics().snapshot();
        assert_eq!((the_metrics.total, the_metrics.unsupported, the_metrics.supported), (1, 1, 0));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_closed_means_skipped() -> anyhow::Result<()> {
        let the_record = LegacyServiceRecord {
            statusid: Some(2),
            ..the_practice()
        };
        let (_, the_store, the_processor) = the_processor(vec![the_record], &MigrationConfig::default());

        match the_processor.sync_service(1).await {
            Err(MigrationError::ExcludedService { reason, .. }) => assert_eq!(reason, "Service is not active"),
            other => panic!("💀 expected excluded, got {other:?}"),
        }
        assert!(the_store.is_empty().await);
        assert_eq!(the_processor.metrics().snapshot().skipped, 1);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_record_has_left_the_building() {
        let (_, _, the_processor) = the_processor(vec![], &MigrationConfig::default());

        match the_processor.sync_service(42).await {
            Err(err @ MigrationError::NotFound { .. }) => assert!(!err.is_retryable()),
            other => panic!("💀 expected not found, got {other:?}"),
        }
        assert_eq!(the_processor.metrics().snapshot().errored, 1);
    }

    #[tokio::test]
    async fn the_one_where_no_address_means_no_write() -> anyhow::Result<()> {
        let the_record = LegacyServiceRecord {
            address: Some("Not Available".to_string()),
            ..the_practice()
        };
        let (_, the_store, the_processor) = the_processor(vec![the_record], &MigrationConfig::default());

        match the_processor.sync_service(1).await {
            Err(MigrationError::FatalValidation { issues, .. }) => {
                assert!(issues.iter().any(|issue| issue.code == "invalid_address"), "{issues:?}")
            }
            other => panic!("💀 expected fatal validation, got {other:?}"),
        }
        assert!(the_store.is_empty().await);
        assert_eq!(the_processor.metrics().snapshot().invalid, 1);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_soft_issues_ride_along_unless_promoted() -> anyhow::Result<()> {
        let the_record = LegacyServiceRecord {
            email: Some("someone@gmail.com".to_string()),
            ..the_practice()
        };

        let (_, _, the_lenient) = the_processor(vec![the_record.clone()], &MigrationConfig::default());
        the_lenient.sync_service(1).await?;
        let the_issues = the_state(&the_lenient, 1).await?.validation_issues;
        assert!(the_issues.iter().any(|issue| issue.code == "not_nhs_email"), "{the_issues:?}");

        let the_strict_config = MigrationConfig {
            fatal_issue_codes: vec!["not_nhs_email".to_string()],
            ..Default::default()
        };
        let (_, the_store, the_strict) = the_processor(vec![the_record], &the_strict_config);
        assert!(matches!(
            the_strict.sync_service(1).await,
            Err(MigrationError::FatalValidation { .. })
        ));
        assert!(the_store.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_events_find_their_way() -> anyhow::Result<()> {
        let (_, _, the_processor) = the_processor(vec![the_practice()], &MigrationConfig::default());
        let event = |table: &str, method, record_id, service_id| ChangeEvent {
            record_id,
            service_id,
            table_name: table.to_string(),
            method,
        };

        assert_eq!(
            the_processor.handle_event(&event("services", ChangeMethod::Insert, 1, None)).await?,
            SaveOutcome::Inserted { version: 1 }
        );
        // 🔌 endpoint row 501 belongs to service 1; nothing in the service changed
        assert_eq!(
            the_processor
                .handle_event(&event("serviceendpoints", ChangeMethod::Update, 501, Some(1)))
                .await?,
            SaveOutcome::Unchanged { version: 1 }
        );
        assert_eq!(
            the_processor.handle_event(&event("services", ChangeMethod::Delete, 1, None)).await?,
            SaveOutcome::Tombstoned { version: 2 }
        );
        assert!(the_state(&the_processor, 1).await?.deleted);

        for the_odd_one in [
            event("serviceendpoints", ChangeMethod::Update, 501, None),
            event("openingtimes", ChangeMethod::Update, 1, None),
        ] {
            match the_processor.handle_event(&the_odd_one).await {
                Err(err @ MigrationError::UnsupportedEvent { .. }) => assert!(!err.is_retryable()),
                other => panic!("💀 expected unsupported event, got {other:?}"),
            }
        }

        let the_metrics = the_processor.metrics().snapshot();
        assert_eq!(the_metrics.total, 5);
        assert_eq!(the_metrics.errored, 2);
        Ok(())
    }

    #[derive(Debug)]
    struct StubbornStore {
        inner: InMemoryStore,
        stubborn_key: String,
    }

    #[async_trait::async_trait]
    impl DocumentStore for StubbornStore {
        async fn get(&self, key: &str) -> Result<Option<StoredDocument>, StoreError> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, document: StoredDocument, expected_version: Option<u64>) -> Result<(), StoreError> {
            if key == self.stubborn_key {
                return Err(StoreError::Unavailable(anyhow::anyhow!("ProvisionedThroughputExceeded")));
            }
            self.inner.put(key, document, expected_version).await
        }
    }

    #[tokio::test]
    async fn the_one_where_a_full_sync_remembers_who_to_retry() -> anyhow::Result<()> {
        let the_services = vec![
            the_practice(),
            LegacyServiceRecord { id: 2, ..the_practice() },
            LegacyServiceRecord {
                id: 3,
                odscode: Some("X12345".to_string()),
                ..the_practice()
            },
        ];
        let config = MigrationConfig::default();
        let the_source = InMemorySource::from_dataset(the_dataset(the_services));
        let the_backing = InMemoryStore::default();
        let the_store = StubbornStore {
            inner: the_backing.clone(),
            stubborn_key: "services#2".to_string(),
        };
        let the_processor = ServiceMigrationProcessor::new(
            Arc::new(the_source.clone()),
            DosMetadata::new(Arc::new(the_source)),
            TransformerRegistry::from_config(&config),
            MigrationStateStore::new(Arc::new(the_store), config.state_table.clone()),
            FatalPolicy::default(),
        );

        let the_report = the_processor.sync_all(false).await?;

        // 🚫 record 3 failed too, but permanently: no point asking again
        assert_eq!(the_report.retryable, vec![2]);
        assert_eq!(
            (the_report.metrics.inserted, the_report.metrics.errored, the_report.metrics.unsupported),
            (1, 1, 1)
        );
        assert_eq!(the_backing.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_runs_take_turns() -> anyhow::Result<()> {
        let (_, _, the_processor) = the_processor(vec![the_practice()], &MigrationConfig::default());

        let the_run = the_processor.start_run().await;
        the_processor.sync_service(1).await?;
        let the_queue_jumper =
            tokio::time::timeout(std::time::Duration::from_millis(20), the_processor.start_run()).await;
        assert!(the_queue_jumper.is_err(), "a second run started while the first was live");
        assert_eq!(the_processor.metrics().snapshot().inserted, 1);

        drop(the_run);
        let _next_run = the_processor.start_run().await;
        assert_eq!(the_processor.metrics().snapshot(), MetricsSnapshot::default());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_everyone_gets_synced() -> anyhow::Result<()> {
        let the_services = vec![
            the_practice(),
            LegacyServiceRecord {
                id: 2,
                odscode: Some("X12345".to_string()),
                ..the_practice()
            },
            LegacyServiceRecord {
                id: 3,
                statusid: Some(2),
                ..the_practice()
            },
        ];
        let (_, the_store, the_processor) = the_processor(the_services, &MigrationConfig::default());

        let the_report = the_processor.sync_all(false).await?;
        let the_snapshot = the_report.metrics;
        assert!(the_report.retryable.is_empty());
        assert_eq!(the_snapshot.total, 3);
        assert_eq!(the_snapshot.inserted, 1);
        assert_eq!(the_snapshot.unsupported, 1);
        assert_eq!(the_snapshot.skipped, 1);
        assert_eq!(the_store.len().await, 1);
        Ok(())
    }
}
