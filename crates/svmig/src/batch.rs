//! 📬 Batch Processor: a queue delivers N messages, we hand back the ones worth redelivering.
//!
//! 🎬 *[ten messages walk into a worker pool. nine walk out. the tenth is re-queued.
//! nobody blames anybody. this is a healthy workplace.]*
//!
//! 🧠 Knowledge graph:
//! - Items are independent. A bounded pool of workers (`migration.concurrency`) drains an
//!   `async_channel` of `(position, message)` pairs; no item ever waits on another.
//! - Each item ends as one of: done, dropped (permanent failure), requeue (retryable
//!   failure), or not started (cancelled before a worker picked it up). Failures are
//!   counted and logged once, by the processor.
//! - The report lists requeue + not-started items in delivery order. An item whose worker
//!   died without answering is reported too, since losing data silently is worse than a
//!   redelivery.
//! - [`BatchProcessor::handle_batch`] never errors. The queue runtime always gets a report.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_channel::Receiver;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span};

use crate::error::{MigrationError, Retry};
use crate::metrics::MetricsSnapshot;
use crate::model::{BatchItemFailure, BatchReport, ChangeEvent, QueueBatch, QueueMessage};
use crate::processor::ServiceMigrationProcessor;

/// 🏁 How one item finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Done,
    Dropped,
    Requeue,
    NotStarted,
}

impl ItemOutcome {
    fn needs_redelivery(self) -> bool {
        matches!(self, ItemOutcome::Requeue | ItemOutcome::NotStarted)
    }
}

#[derive(Debug, Clone)]
pub struct BatchProcessor {
    processor: Arc<ServiceMigrationProcessor>,
    concurrency: usize,
}

impl BatchProcessor {
    pub fn new(processor: Arc<ServiceMigrationProcessor>, concurrency: usize) -> Self {
        Self {
            processor,
            concurrency: concurrency.max(1),
        }
    }

    pub fn processor(&self) -> &Arc<ServiceMigrationProcessor> {
        &self.processor
    }

    /// 📸 Counters for the most recent run.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.processor.metrics().snapshot()
    }

    /// 📬 Process a delivered batch and report the items to redeliver.
    ///
    /// `cancel` may be tripped at any time; in-flight items finish, unstarted ones are reported.
    /// Batches handed to one engine at once are processed one after the other, each
    /// with its own counters.
    pub async fn handle_batch(&self, batch: QueueBatch, cancel: Arc<AtomicBool>) -> BatchReport {
        let messages = batch.records;
        let _run = self.processor.start_run().await;
        info!(code = "SM_APP_002", messages = messages.len(), "📬 batch received");

        if messages.is_empty() {
            return BatchReport::default();
        }

        let ids: Vec<String> = messages.iter().map(|m| m.message_id.clone()).collect();
        let (tx, rx) = async_channel::bounded::<(usize, QueueMessage)>(messages.len());
        for item in messages.into_iter().enumerate() {
            // 📦 capacity == batch size, so this never waits
            if tx.send(item).await.is_err() {
                break;
            }
        }
        tx.close();

        let workers: Vec<JoinHandle<Vec<(usize, ItemOutcome)>>> = (0..self.concurrency.min(ids.len()))
            .map(|_| spawn_worker(self.processor.clone(), rx.clone(), cancel.clone()))
            .collect();
        drop(rx);

        let mut outcomes: Vec<Option<ItemOutcome>> = vec![None; ids.len()];
        for joined in futures::future::join_all(workers).await {
            match joined {
                Ok(results) => {
                    for (position, outcome) in results {
                        outcomes[position] = Some(outcome);
                    }
                }
                Err(err) => error!(code = "SM_APP_007", error = %err, "💥 batch worker died"),
            }
        }

        let batch_item_failures: Vec<BatchItemFailure> = outcomes
            .into_iter()
            .zip(ids)
            .filter(|(outcome, _)| outcome.is_none_or(ItemOutcome::needs_redelivery))
            .map(|(_, item_identifier)| BatchItemFailure { item_identifier })
            .collect();

        let metrics = self.metrics();
        info!(
            code = "SM_APP_005",
            failures = batch_item_failures.len(),
            metrics = ?metrics,
            "🏁 batch finished"
        );
        BatchReport { batch_item_failures }
    }
}

fn spawn_worker(
    processor: Arc<ServiceMigrationProcessor>,
    rx: Receiver<(usize, QueueMessage)>,
    cancel: Arc<AtomicBool>,
) -> JoinHandle<Vec<(usize, ItemOutcome)>> {
    tokio::spawn(async move {
        let mut results = Vec::new();
        while let Ok((position, message)) = rx.recv().await {
            if cancel.load(Ordering::SeqCst) {
                debug!(code = "SM_APP_006", message_id = %message.message_id, "⏹️ cancelled before start");
                results.push((position, ItemOutcome::NotStarted));
                continue;
            }
            let span = info_span!("queue_message", message_id = %message.message_id);
            let outcome = process_message(&processor, &message).instrument(span).await;
            results.push((position, outcome));
        }
        results
    })
}

async fn process_message(processor: &ServiceMigrationProcessor, message: &QueueMessage) -> ItemOutcome {
    let result = match serde_json::from_str::<ChangeEvent>(&message.body) {
        Ok(event) => processor.handle_event(&event).await,
        Err(err) => Err(processor.reject_event(MigrationError::unsupported_event(format!(
            "message body is not a change event: {err}"
        )))),
    };

    match result {
        Ok(outcome) => {
            debug!(code = "SM_APP_003", outcome = ?outcome, "✅ message processed");
            ItemOutcome::Done
        }
        // 🧾 the processor already logged the failure itself, only the verdict is new here
        Err(err) => {
            let retry = err.retry();
            debug!(code = "SM_APP_004", retry = ?retry, "📮 message failed");
            match retry {
                Retry::Requeue => ItemOutcome::Requeue,
                Retry::Drop => ItemOutcome::Dropped,
            }
        }
    }
}

/// 🧪 `(message_id, body)` pairs → a [`QueueBatch`].
pub fn queue_batch<I, S>(bodies: I) -> QueueBatch
where
    I: IntoIterator<Item = (S, S)>,
    S: Into<String>,
{
    QueueBatch {
        records: bodies
            .into_iter()
            .map(|(message_id, body)| QueueMessage {
                message_id: message_id.into(),
                body: body.into(),
            })
            .collect(),
    }
}
