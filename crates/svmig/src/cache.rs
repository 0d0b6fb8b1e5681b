//! 🗃️ Reference cache: ask the database once, remember forever (well, per process).
//!
//! Lazy key→row memoiser over a [`ReferenceProvider`]. No eviction: reference tables
//! are small and immutable for the life of a run. Shared across workers behind a
//! `tokio::sync::RwLock`; two workers missing the same key at once both fetch and
//! the last insert wins, which is fine because the rows are identical.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::trace;

use crate::backends::ReferenceProvider;
use crate::error::MigrationError;
use crate::model::{Disposition, OpeningDay, ServiceType, SymptomGroup};

#[derive(Debug)]
pub struct ReferenceCache<T> {
    entity: &'static str,
    provider: Arc<dyn ReferenceProvider<T>>,
    entries: RwLock<HashMap<i64, T>>,
}

impl<T> ReferenceCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(entity: &'static str, provider: Arc<dyn ReferenceProvider<T>>) -> Self {
        Self {
            entity,
            provider,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// 🔍 Row for `id`, or [`MigrationError::NotFound`] when neither cache nor provider has it.
    pub async fn get(&self, id: i64) -> Result<T, MigrationError> {
        self.get_optional(id)
            .await?
            .ok_or(MigrationError::NotFound {
                entity: self.entity,
                id,
            })
    }

    /// 🔍 Like [`get`](Self::get), but absence is `Ok(None)`. Mappers that drop
    /// unknown codes use this one.
    pub async fn get_optional(&self, id: i64) -> Result<Option<T>, MigrationError> {
        if let Some(hit) = self.entries.read().await.get(&id) {
            return Ok(Some(hit.clone()));
        }

        trace!(entity = self.entity, id, "🗃️ cache miss");
        let fetched = self.provider.get_by_id(id).await.map_err(|err| {
            MigrationError::transient(format!("failed to fetch {} {id}", self.entity), err)
        })?;

        if let Some(row) = &fetched {
            self.entries.write().await.insert(id, row.clone());
        }
        Ok(fetched)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// 📚 The four lookup tables the mappers consult, bundled.
#[derive(Debug)]
pub struct DosMetadata {
    pub service_types: ReferenceCache<ServiceType>,
    pub dispositions: ReferenceCache<Disposition>,
    pub opening_days: ReferenceCache<OpeningDay>,
    pub symptom_groups: ReferenceCache<SymptomGroup>,
}

impl DosMetadata {
    /// 🔧 One provider serving every table (the usual case: it's all one database).
    pub fn new<P>(provider: Arc<P>) -> Self
    where
        P: ReferenceProvider<ServiceType>
            + ReferenceProvider<Disposition>
            + ReferenceProvider<OpeningDay>
            + ReferenceProvider<SymptomGroup>
            + 'static,
    {
        Self {
            service_types: ReferenceCache::new("service type", provider.clone()),
            dispositions: ReferenceCache::new("disposition", provider.clone()),
            opening_days: ReferenceCache::new("opening day", provider.clone()),
            symptom_groups: ReferenceCache::new("symptom group", provider),
        }
    }
}
