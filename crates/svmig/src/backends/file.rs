//! 📂 File backends: a JSON snapshot of the legacy tables, and a JSON file of migration state.
//!
//! The source file is read once at startup into an [`InMemorySource`]. The store file is
//! read on open and rewritten whole on every successful put (write to a sibling temp
//! file, then rename), so a crash mid-write leaves the previous state intact.
//!
//! 💀 Disk full → `StoreError::Unavailable` → retryable. The disk may get better. 🦆

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::backends::{DocumentStore, InMemorySource, StoredDocument, check_expected_version};
use crate::error::StoreError;
use crate::model::LegacyDataset;

/// 🚰 `[source.File]` table.
#[derive(Debug, Deserialize, Clone)]
pub struct FileSourceConfig {
    pub file_name: PathBuf,
}

/// 🗄️ `[store.File]` table.
#[derive(Debug, Deserialize, Clone)]
pub struct FileStoreConfig {
    pub file_name: PathBuf,
}

/// 📖 Legacy tables loaded from a JSON [`LegacyDataset`] file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    tables: InMemorySource,
}

impl FileSource {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = tokio::fs::read_to_string(&path).await.with_context(|| {
            format!(
                "💀 Could not read the legacy snapshot at '{}'. Is the path relative to somewhere surprising?",
                path.display()
            )
        })?;
        let dataset: LegacyDataset = serde_json::from_str(&raw).with_context(|| {
            format!("💀 '{}' is not a valid legacy dataset", path.display())
        })?;
        info!(
            path = %path.display(),
            services = dataset.services.len(),
            "📖 loaded legacy snapshot"
        );
        Ok(Self {
            path,
            tables: InMemorySource::from_dataset(dataset),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn tables(&self) -> &InMemorySource {
        &self.tables
    }
}

/// 💾 Document store persisted as one JSON object keyed by document key.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    documents: Arc<Mutex<HashMap<String, StoredDocument>>>,
}

impl FileStore {
    /// 🚀 Open (or lazily create) the store file. Missing file = empty store.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let documents = match tokio::fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => HashMap::new(),
            Ok(raw) => serde_json::from_str(&raw).with_context(|| {
                format!("💀 '{}' is not a valid state store file", path.display())
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("💀 Could not read the state store at '{}'", path.display())
                });
            }
        };
        Ok(Self {
            path,
            documents: Arc::new(Mutex::new(documents)),
        })
    }

    async fn persist(&self, documents: &HashMap<String, StoredDocument>) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(documents)?;
        let mut temp_path = self.path.clone().into_os_string();
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);
        tokio::fs::write(&temp_path, serialized)
            .await
            .with_context(|| format!("writing '{}'", temp_path.display()))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .with_context(|| format!("replacing '{}'", self.path.display()))?;
        debug!(path = %self.path.display(), documents = documents.len(), "💾 state store flushed");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FileStore {
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

        let previous = documents.insert(key.to_string(), document);
        if let Err(err) = self.persist(&documents).await {
            // 🔙 the disk said no, so memory says no too
            match previous {
                Some(previous) => documents.insert(key.to_string(), previous),
                None => documents.remove(key),
            };
            return Err(StoreError::Unavailable(err));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::RecordSource;
    use serde_json::json;

    #[tokio::test]
    async fn the_one_where_the_snapshot_comes_off_the_disk() -> anyhow::Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_path = the_dir.path().join("legacy.json");
        tokio::fs::write(
            &the_path,
            json!({
                "services": [{"id": 1, "typeid": 100, "odscode": "A12345", "statusid": 1}],
                "service_types": [{"id": 100, "name": "GP Practice"}]
            })
            .to_string(),
        )
        .await?;

        let the_source = FileSource::open(&the_path).await?;
        assert_eq!(the_source.path(), the_path.as_path());
        let the_record = the_source.tables().get_service(1).await?;
        assert_eq!(the_record.and_then(|r| r.odscode), Some("A12345".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_missing_snapshot_names_the_culprit() {
        match FileSource::open("/definitely/not/here.json").await {
            Ok(source) => panic!("💀 expected a missing file, got {source:?}"),
            Err(err) => assert!(format!("{err:#}").contains("/definitely/not/here.json")),
        }
    }

    #[tokio::test]
    async fn the_one_where_state_survives_a_restart() -> anyhow::Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_path = the_dir.path().join("state.json");

        let the_store = FileStore::open(&the_path).await?;
        the_store
            .put(
                "services#1",
                StoredDocument {
                    version: 1,
                    body: json!({"hello": "duck"}),
                },
                None,
            )
            .await?;

        let the_reopened = FileStore::open(&the_path).await?;
        let the_doc = the_reopened.get("services#1").await?;
        assert_eq!(the_doc.map(|d| d.version), Some(1));

        let the_conflict = the_reopened
            .put(
                "services#1",
                StoredDocument {
                    version: 2,
                    body: json!({}),
                },
                Some(5),
            )
            .await;
        assert!(matches!(the_conflict, Err(StoreError::Conflict { .. })));
        Ok(())
    }
}
