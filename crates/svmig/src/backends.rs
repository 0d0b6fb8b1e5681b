//! 🔌 Backends: the collaborators the engine talks to but never owns.
//!
//! 🚰 A [`RecordSource`] hands over legacy service rows. [`ReferenceProvider`]s
//! serve lookup tables to the Cache. A [`DocumentStore`] keeps the versioned
//! migration state and enforces optimistic writes.
//!
//! 🎭 Same casting agency as always: a trait per seam, concrete impls in submodules,
//! an enum that dispatches, and a `from_config` resolver that picks the variant.
//! The engine itself only ever sees `Arc<dyn ...>`, so tests can slip a saboteur in.
//!
//! 🦆 The duck is stored at version 1. It has never materially changed.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app_config::{SourceConfig, StoreConfig};
use crate::error::StoreError;
use crate::model::{Disposition, LegacyServiceRecord, OpeningDay, ServiceType, SymptomGroup};

pub mod file;
pub mod in_mem;

pub use file::{FileSource, FileStore};
pub use in_mem::{InMemorySource, InMemoryStore};

// ===== Source side =====

/// 🏚️ Where legacy service records come from.
///
/// `Ok(None)` means "not there". `Err` means "couldn't ask", which the engine
/// treats as transient.
#[async_trait]
pub trait RecordSource: Send + Sync + std::fmt::Debug {
    async fn get_service(&self, id: i64) -> Result<Option<LegacyServiceRecord>>;

    /// 📜 Every service id, ascending. Drives the full sync.
    async fn list_service_ids(&self) -> Result<Vec<i64>>;
}

/// 📚 Lookup-table rows by id. Same shape as [`RecordSource::get_service`].
#[async_trait]
pub trait ReferenceProvider<T>: Send + Sync + std::fmt::Debug {
    async fn get_by_id(&self, id: i64) -> Result<Option<T>>;
}

/// 🎭 Config-resolved source. Serves records and every reference table.
#[derive(Debug, Clone)]
pub enum SourceBackend {
    InMemory(InMemorySource),
    File(FileSource),
}

impl SourceBackend {
    /// 🔧 Resolve the configured source. The file variant reads its snapshot up front.
    pub async fn from_config(config: &SourceConfig) -> Result<Self> {
        match config {
            SourceConfig::InMemory => Ok(SourceBackend::InMemory(InMemorySource::default())),
            SourceConfig::File(file_config) => {
                Ok(SourceBackend::File(FileSource::open(&file_config.file_name).await?))
            }
        }
    }

    fn tables(&self) -> &InMemorySource {
        match self {
            SourceBackend::InMemory(source) => source,
            SourceBackend::File(source) => source.tables(),
        }
    }
}

#[async_trait]
impl RecordSource for SourceBackend {
    async fn get_service(&self, id: i64) -> Result<Option<LegacyServiceRecord>> {
        self.tables().get_service(id).await
    }

    async fn list_service_ids(&self) -> Result<Vec<i64>> {
        self.tables().list_service_ids().await
    }
}

macro_rules! dispatch_reference_provider {
    ($($row:ty),+ $(,)?) => {
        $(
            #[async_trait]
            impl ReferenceProvider<$row> for SourceBackend {
                async fn get_by_id(&self, id: i64) -> Result<Option<$row>> {
                    <InMemorySource as ReferenceProvider<$row>>::get_by_id(self.tables(), id).await
                }
            }
        )+
    };
}

dispatch_reference_provider!(ServiceType, Disposition, OpeningDay, SymptomGroup);

// ===== Store side =====

/// 📄 One stored item: the body plus the version the store conditions writes on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub version: u64,
    pub body: serde_json::Value,
}

/// 🗄️ Key-value document store with conditional writes.
///
/// # Contract
/// - `put` with `expected_version == None` only succeeds if the key is absent.
/// - `put` with `Some(v)` only succeeds if the stored version is exactly `v`.
/// - Anything else is [`StoreError::Conflict`]. Reachability problems are
///   [`StoreError::Unavailable`].
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    async fn get(&self, key: &str) -> Result<Option<StoredDocument>, StoreError>;

    async fn put(
        &self,
        key: &str,
        document: StoredDocument,
        expected_version: Option<u64>,
    ) -> Result<(), StoreError>;
}

/// 🎭 Config-resolved store.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    InMemory(InMemoryStore),
    File(FileStore),
}

impl StoreBackend {
    pub async fn from_config(config: &StoreConfig) -> Result<Self> {
        match config {
            StoreConfig::InMemory => Ok(StoreBackend::InMemory(InMemoryStore::default())),
            StoreConfig::File(file_config) => {
                Ok(StoreBackend::File(FileStore::open(&file_config.file_name).await?))
            }
        }
    }
}

#[async_trait]
impl DocumentStore for StoreBackend {
    async fn get(&self, key: &str) -> Result<Option<StoredDocument>, StoreError> {
        match self {
            StoreBackend::InMemory(store) => store.get(key).await,
            StoreBackend::File(store) => store.get(key).await,
        }
    }

    async fn put(
        &self,
        key: &str,
        document: StoredDocument,
        expected_version: Option<u64>,
    ) -> Result<(), StoreError> {
        match self {
            StoreBackend::InMemory(store) => store.put(key, document, expected_version).await,
            StoreBackend::File(store) => store.put(key, document, expected_version).await,
        }
    }
}

/// ⚔️ The shared optimistic-concurrency check every store applies before writing.
pub(crate) fn check_expected_version(
    key: &str,
    current: Option<&StoredDocument>,
    expected_version: Option<u64>,
) -> Result<(), StoreError> {
    let actual = current.map(|doc| doc.version);
    if actual == expected_version {
        Ok(())
    } else {
        Err(StoreError::Conflict {
            key: key.to_string(),
            expected: expected_version,
            actual,
        })
    }
}

/// 🧰 Everything the engine needs from the outside world, resolved once per process.
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub source: Arc<SourceBackend>,
    pub store: Arc<dyn DocumentStore>,
}

impl Collaborators {
    pub async fn from_config(source: &SourceConfig, store: &StoreConfig) -> Result<Self> {
        Ok(Self {
            source: Arc::new(SourceBackend::from_config(source).await?),
            store: Arc::new(StoreBackend::from_config(store).await?),
        })
    }
}
