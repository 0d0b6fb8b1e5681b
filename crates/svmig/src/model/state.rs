//! 🧾 Migration bookkeeping: what one transform produced, and what we remember about it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::target::{HealthcareService, Location, Organisation};
use crate::validation::ValidationIssue;

/// 📤 Output of one transformer run. Ephemeral; folded into [`MigrationState`] on save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformResult {
    pub organisation: Option<Organisation>,
    pub location: Option<Location>,
    pub healthcare_service: Option<HealthcareService>,
    #[serde(default)]
    pub validation_issues: Vec<ValidationIssue>,
}

/// 📚 The durable, versioned record of one source record's migration.
///
/// `version` starts at 1 on first save and moves by exactly one per material
/// change. A delete event sets `deleted` and bumps the version once; history is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationState {
    pub source_record_id: String,
    pub version: u64,
    pub organisation_id: Option<Uuid>,
    pub organisation: Option<Organisation>,
    pub location_id: Option<Uuid>,
    pub location: Option<Location>,
    pub healthcare_service_id: Option<Uuid>,
    pub healthcare_service: Option<HealthcareService>,
    #[serde(default)]
    pub validation_issues: Vec<ValidationIssue>,
    #[serde(default)]
    pub deleted: bool,
}

impl MigrationState {
    /// 🔑 `"<table>#<id>"`, e.g. `services#1001`.
    pub fn format_source_record_id(table: &str, record_id: i64) -> String {
        format!("{table}#{record_id}")
    }

    /// 🐣 First-ever state for a record.
    pub fn from_result(source_record_id: String, result: &TransformResult) -> Self {
        Self {
            source_record_id,
            version: 1,
            organisation_id: result.organisation.as_ref().map(|org| org.id),
            organisation: result.organisation.clone(),
            location_id: result.location.as_ref().map(|loc| loc.id),
            location: result.location.clone(),
            healthcare_service_id: result.healthcare_service.as_ref().map(|hs| hs.id),
            healthcare_service: result.healthcare_service.clone(),
            validation_issues: result.validation_issues.clone(),
            deleted: false,
        }
    }

    /// 🔁 Next version of this state carrying `result`'s entities.
    pub fn next_version(&self, result: &TransformResult) -> Self {
        let mut next = Self::from_result(self.source_record_id.clone(), result);
        next.version = self.version + 1;
        next
    }
}
