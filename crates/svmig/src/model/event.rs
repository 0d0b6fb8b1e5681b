//! 📨 Queue-facing shapes: change events in, partial-failure report out.
//!
//! 🎬 *[a queue delivers ten messages. nine are fine. one is haunted.]*
//! Only the haunted one goes back in the report.

use serde::{Deserialize, Serialize};

pub const SERVICES_TABLE: &str = "services";
pub const SERVICE_ENDPOINTS_TABLE: &str = "serviceendpoints";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeMethod {
    Insert,
    Update,
    Delete,
}

/// 🔔 One captured row change.
///
/// For a `services` row `record_id` is the service id. For a `serviceendpoints`
/// row it's the endpoint id, and `service_id` carries the owning service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub record_id: i64,
    #[serde(default)]
    pub service_id: Option<i64>,
    pub table_name: String,
    pub method: ChangeMethod,
}

/// ✉️ One queue message. `body` is a JSON-encoded [`ChangeEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMessage {
    #[serde(rename = "messageId")]
    pub message_id: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueBatch {
    #[serde(rename = "Records", default)]
    pub records: Vec<QueueMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemFailure {
    #[serde(rename = "itemIdentifier")]
    pub item_identifier: String,
}

/// 📋 What the queue runtime gets back: only these message ids are redelivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    #[serde(rename = "batchItemFailures")]
    pub batch_item_failures: Vec<BatchItemFailure>,
}

impl BatchReport {
    pub fn failed_ids(&self) -> Vec<&str> {
        self.batch_item_failures
            .iter()
            .map(|failure| failure.item_identifier.as_str())
            .collect()
    }
}
