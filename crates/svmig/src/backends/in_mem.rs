//! # Previously, on svmig...
//!
//! 🎬 The legacy database was far away, behind a VPN, guarded by a DBA with strong
//! opinions about read replicas. Tests needed something closer. Something that lives
//! entirely in RAM and forgets everything the moment the process ends.
//!
//! [`InMemorySource`] serves a [`LegacyDataset`] snapshot: service rows plus the four
//! reference tables. [`InMemoryStore`] is a conditional-write document store behind an
//! `Arc<Mutex<...>>` so tests can peek at exactly what got committed.
//!
//! ⚠️ Not for production. For tests, local runs, and the file backends, which load
//! into these and pretend that's what they were all along. 🦆

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::backends::{
    DocumentStore, RecordSource, ReferenceProvider, StoredDocument, check_expected_version,
};
use crate::error::StoreError;
use crate::model::{
    Disposition, LegacyDataset, LegacyServiceRecord, OpeningDay, ServiceType, SymptomGroup,
};

#[derive(Debug, Default)]
struct Tables {
    services: BTreeMap<i64, LegacyServiceRecord>,
    service_types: HashMap<i64, ServiceType>,
    dispositions: HashMap<i64, Disposition>,
    opening_days: HashMap<i64, OpeningDay>,
    symptom_groups: HashMap<i64, SymptomGroup>,
}

/// 📦 A legacy source that fits in your pocket.
///
/// Clone-able; clones share the same tables, so a test can keep a handle and
/// edit a row between two syncs.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    tables: Arc<RwLock<Tables>>,
}

impl InMemorySource {
    pub fn from_dataset(dataset: LegacyDataset) -> Self {
        let tables = Tables {
            services: dataset.services.into_iter().map(|s| (s.id, s)).collect(),
            service_types: dataset.service_types.into_iter().map(|r| (r.id, r)).collect(),
            dispositions: dataset.dispositions.into_iter().map(|r| (r.id, r)).collect(),
            opening_days: dataset.opening_days.into_iter().map(|r| (r.id, r)).collect(),
            symptom_groups: dataset.symptom_groups.into_iter().map(|r| (r.id, r)).collect(),
        };
        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }

    /// ✏️ Insert or replace a service row, as the change-capture side would.
    pub async fn upsert_service(&self, record: LegacyServiceRecord) {
        self.tables.write().await.services.insert(record.id, record);
    }

    pub async fn remove_service(&self, id: i64) -> Option<LegacyServiceRecord> {
        self.tables.write().await.services.remove(&id)
    }
}

#[async_trait]
impl RecordSource for InMemorySource {
    async fn get_service(&self, id: i64) -> Result<Option<LegacyServiceRecord>> {
        Ok(self.tables.read().await.services.get(&id).cloned())
    }

    async fn list_service_ids(&self) -> Result<Vec<i64>> {
        // 📜 BTreeMap keys are already ascending
        Ok(self.tables.read().await.services.keys().copied().collect())
    }
}

macro_rules! reference_table {
    ($row:ty, $field:ident) => {
        #[async_trait]
        impl ReferenceProvider<$row> for InMemorySource {
            async fn get_by_id(&self, id: i64) -> Result<Option<$row>> {
                Ok(self.tables.read().await.$field.get(&id).cloned())
            }
        }
    };
}

reference_table!(ServiceType, service_types);
reference_table!(Disposition, dispositions);
reference_table!(OpeningDay, opening_days);
reference_table!(SymptomGroup, symptom_groups);

/// 🗄️ A document store that holds grudges (and versions) until the process exits.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    pub(crate) documents: Arc<Mutex<HashMap<String, StoredDocument>>>,
}

impl InMemoryStore {
    /// 🔍 Copy of everything committed so far. For assertions.
    pub async fn snapshot(&self) -> HashMap<String, StoredDocument> {
        self.documents.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.lock().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<StoredDocument>, StoreError> {
        Ok(self.documents.lock().await.get(key).cloned())
    }

    async fn put(
        &self,
        key: &str,
        document: StoredDocument,
        expected_version: Option<u64>,
    ) -> Result<(), StoreError> {
        let mut documents = self.documents.lock().await;
        check_expected_version(key, documents.get(key), expected_version)?;
        documents.insert(key.to_string(), document);
        Ok(())
    }
}
