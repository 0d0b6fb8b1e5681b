//! 🗺️ Mappers: one legacy row in, one target entity out.
//!
//! 🧠 Knowledge graph:
//! - Mappers are pure and synchronous. Every reference lookup they need is resolved up
//!   front (async, through the Cache) into a [`ReferenceLookups`] and handed over in the
//!   [`MappingContext`]. No I/O hides in here.
//! - Ids come from [`crate::ids::generate_uuid`]; same row, same ids, every run.
//! - Order matters: Organisation first (everyone links to it), then Location, then
//!   HealthcareService (links to both).
//!
//! 🦆 The duck was mapped once. It is mapped the same way every time.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::cache::DosMetadata;
use crate::error::MigrationError;
use crate::model::{Disposition, LegacyServiceRecord, OpeningDay, ServiceType, SymptomGroup};

pub mod endpoint;
pub mod healthcare_service;
pub mod location;
pub mod organisation;

/// 📚 The reference rows one record's mapping needs, already fetched.
#[derive(Debug, Clone, Default)]
pub struct ReferenceLookups {
    pub service_type: Option<ServiceType>,
    pub opening_days: HashMap<i64, OpeningDay>,
    pub symptom_groups: HashMap<i64, SymptomGroup>,
    pub dispositions: HashMap<i64, Disposition>,
}

impl ReferenceLookups {
    /// 🔍 Fetch everything `record` refers to.
    ///
    /// Service type and opening days must exist ([`MigrationError::NotFound`] otherwise).
    /// Unknown symptom groups and dispositions are left out here and dropped by the mapper.
    pub async fn resolve(
        record: &LegacyServiceRecord,
        metadata: &DosMetadata,
    ) -> Result<Self, MigrationError> {
        let mut lookups = Self {
            service_type: Some(metadata.service_types.get(record.typeid).await?),
            ..Self::default()
        };

        for day in &record.scheduled_opening_times {
            if !lookups.opening_days.contains_key(&day.dayid) {
                let row = metadata.opening_days.get(day.dayid).await?;
                lookups.opening_days.insert(day.dayid, row);
            }
        }
        for sgsd in &record.sgsds {
            if let Some(row) = metadata.symptom_groups.get_optional(sgsd.sgid).await? {
                lookups.symptom_groups.insert(sgsd.sgid, row);
            }
        }
        for disposition in &record.dispositions {
            match metadata.dispositions.get_optional(disposition.dispositionid).await? {
                Some(row) => {
                    lookups.dispositions.insert(disposition.dispositionid, row);
                }
                None => warn!(
                    code = "SM_PROC_018",
                    record_id = record.id,
                    disposition_id = disposition.dispositionid,
                    "🔍 disposition not found in reference data, it will be dropped"
                ),
            }
        }
        Ok(lookups)
    }
}

/// 🧳 What every mapper gets besides the row itself.
#[derive(Debug, Clone, Copy)]
pub struct MappingContext<'a> {
    /// ⏰ One timestamp per transform, stamped on every audit field.
    pub started_at: DateTime<Utc>,
    pub lookups: &'a ReferenceLookups,
}
