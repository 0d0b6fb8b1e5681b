//! 📚 Migration State Store: remembers what we migrated, and only writes when it matters.
//!
//! 🎬 *[the same change event arrives for the fourth time today. the store checks its notes.
//! "nothing's different." it does nothing. this is its finest work.]*
//!
//! 🧠 Knowledge graph:
//! - Keyed by `source_record_id` (`"<table>#<id>"`).
//! - `save` is load → diff → conditional put. No material diff → no write, version unchanged.
//!   Material diff → version + 1. First save → version 1.
//! - Per-key serialisation is belt and braces: an in-process async lock per key, plus the
//!   store's optimistic `expected_version` check for writers in other processes. Losing that
//!   race surfaces as a retryable conflict.
//! - `tombstone` marks a state deleted (version + 1) and keeps all history.
//! - The single `put` is the commit point. Nothing else writes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::backends::{DocumentStore, StoredDocument};
use crate::error::MigrationError;
use crate::model::{MigrationState, TransformResult};

pub mod diff;

/// 📬 What one save or tombstone did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted { version: u64 },
    Updated { version: u64, changed: Vec<String> },
    Unchanged { version: u64 },
    Tombstoned { version: u64 },
    /// 🕳️ Tombstone requested for a record we never migrated (or already tombstoned).
    Absent,
}

#[derive(Debug)]
pub struct MigrationStateStore {
    store: Arc<dyn DocumentStore>,
    table: String,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

fn unclassified(context: &str, err: serde_json::Error) -> MigrationError {
    MigrationError::Unclassified(anyhow::Error::new(err).context(context.to_string()))
}

impl MigrationStateStore {
    pub fn new(store: Arc<dyn DocumentStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn source_record_id(&self, record_id: i64) -> String {
        MigrationState::format_source_record_id(&self.table, record_id)
    }

    /// 🔍 Current state for a key, if any.
    pub async fn load(&self, source_record_id: &str) -> Result<Option<MigrationState>, MigrationError> {
        let Some(document) = self.store.get(source_record_id).await? else {
            return Ok(None);
        };
        let state = serde_json::from_value(document.body)
            .map_err(|err| unclassified("stored migration state is unreadable", err))?;
        Ok(Some(state))
    }

    /// 💾 Fold `result` into the stored state for `record_id`, writing only on material change.
    pub async fn save(&self, record_id: i64, result: &TransformResult) -> Result<SaveOutcome, MigrationError> {
        let key = self.source_record_id(record_id);
        let lock = self.key_lock(&key).await;
        let outcome = {
            let _guard = lock.lock().await;
            self.save_locked(&key, result).await
        };
        self.release_key_lock(&key, lock).await;
        outcome
    }

    /// 🪦 Mark the state for `record_id` deleted. History stays.
    pub async fn tombstone(&self, record_id: i64) -> Result<SaveOutcome, MigrationError> {
        let key = self.source_record_id(record_id);
        let lock = self.key_lock(&key).await;
        let outcome = {
            let _guard = lock.lock().await;
            self.tombstone_locked(&key).await
        };
        self.release_key_lock(&key, lock).await;
        outcome
    }

    async fn save_locked(&self, key: &str, result: &TransformResult) -> Result<SaveOutcome, MigrationError> {
        let Some(previous) = self.load(key).await? else {
            let state = MigrationState::from_result(key.to_string(), result);
            self.put(&state, None).await?;
            info!(code = "SM_STATE_001", source_record_id = key, version = 1, "🐣 migration state created");
            return Ok(SaveOutcome::Inserted { version: 1 });
        };

        let mut changed = diff::entity_changes(&previous, result)
            .map_err(|err| unclassified("could not diff migration state", err))?;
        if previous.deleted {
            changed.push("deleted".to_string());
        }

        if changed.is_empty() {
            debug!(
                code = "SM_STATE_003",
                source_record_id = key,
                version = previous.version,
                "😴 no material change, nothing written"
            );
            return Ok(SaveOutcome::Unchanged {
                version: previous.version,
            });
        }

        let next = previous.next_version(result);
        self.put(&next, Some(previous.version)).await?;
        info!(
            code = "SM_STATE_002",
            source_record_id = key,
            version = next.version,
            changed = ?changed,
            "📝 migration state updated"
        );
        Ok(SaveOutcome::Updated {
            version: next.version,
            changed,
        })
    }

    async fn tombstone_locked(&self, key: &str) -> Result<SaveOutcome, MigrationError> {
        let previous = match self.load(key).await? {
            Some(previous) if !previous.deleted => previous,
            _ => {
                debug!(code = "SM_STATE_005", source_record_id = key, "🕳️ nothing to tombstone");
                return Ok(SaveOutcome::Absent);
            }
        };

        let mut next = previous.clone();
        next.version = previous.version + 1;
        next.deleted = true;
        self.put(&next, Some(previous.version)).await?;
        info!(
            code = "SM_STATE_004",
            source_record_id = key,
            version = next.version,
            "🪦 migration state tombstoned"
        );
        Ok(SaveOutcome::Tombstoned {
            version: next.version,
        })
    }

    async fn put(&self, state: &MigrationState, expected_version: Option<u64>) -> Result<(), MigrationError> {
        let body = serde_json::to_value(state)
            .map_err(|err| unclassified("could not serialise migration state", err))?;
        let document = StoredDocument {
            version: state.version,
            body,
        };
        self.store
            .put(&state.source_record_id, document, expected_version)
            .await?;
        Ok(())
    }

    async fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    async fn release_key_lock(&self, key: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // 🧹 only the map and this caller still hold it → nobody is waiting
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }
}
