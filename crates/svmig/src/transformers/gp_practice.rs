//! 🩺 GP practice transformer.
//!
//! Selection criteria, checked in this order (first failure is the reason):
//! - service type is GP Practice (100)
//! - an ODS code is present
//! - the ODS code is one of `ABCDEFGHJKLMNPVWY` followed by five digits
//!
//! Filter criteria:
//! - the service is active (`statusid == 1`)

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;

use crate::cache::DosMetadata;
use crate::error::MigrationError;
use crate::mapping::{self, MappingContext, ReferenceLookups};
use crate::model::{
    HealthcareServiceCategory, HealthcareServiceType, LegacyServiceRecord, TransformResult,
};
use crate::transformers::{Eligibility, Transformer};
use crate::validation::{GpPracticeValidator, ValidationResult, Validator};

pub const GP_PRACTICE_TYPE_ID: i64 = 100;
pub const STATUS_ACTIVE: i64 = mapping::organisation::STATUS_ACTIVE;

static GP_PRACTICE_ODS_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ABCDEFGHJKLMNPVWY][0-9]{5}$").expect("valid regex"));

#[derive(Debug, Clone, Default)]
pub struct GpPracticeTransformer {
    validator: GpPracticeValidator,
}

impl GpPracticeTransformer {
    pub fn new(validator: GpPracticeValidator) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl Transformer for GpPracticeTransformer {
    fn name(&self) -> &'static str {
        "GPPracticeTransformer"
    }

    fn is_service_supported(&self, record: &LegacyServiceRecord) -> Eligibility {
        if record.typeid != GP_PRACTICE_TYPE_ID {
            return Eligibility::Ineligible("Service type is not GP Practice (100)");
        }
        let Some(odscode) = record.odscode.as_deref().filter(|code| !code.is_empty()) else {
            return Eligibility::Ineligible("Service does not have an ODS code");
        };
        if !GP_PRACTICE_ODS_CODE.is_match(odscode) {
            return Eligibility::Ineligible("ODS code does not match the required format");
        }
        Eligibility::Eligible
    }

    fn should_include_service(&self, record: &LegacyServiceRecord) -> Eligibility {
        if record.statusid != Some(STATUS_ACTIVE) {
            return Eligibility::Ineligible("Service is not active");
        }
        Eligibility::Eligible
    }

    fn validate(&self, record: &LegacyServiceRecord) -> ValidationResult {
        self.validator.validate(record)
    }

    async fn transform(
        &self,
        record: &LegacyServiceRecord,
        metadata: &DosMetadata,
    ) -> Result<TransformResult, MigrationError> {
        let lookups = ReferenceLookups::resolve(record, metadata).await?;
        let ctx = MappingContext {
            started_at: Utc::now(),
            lookups: &lookups,
        };

        let organisation = mapping::organisation::map(record, &ctx);
        let location = mapping::location::map(record, organisation.id, &ctx);
        let healthcare_service = mapping::healthcare_service::map(
            record,
            organisation.id,
            location.id,
            Some(HealthcareServiceCategory::GpServices),
            Some(HealthcareServiceType::GpConsultationService),
            &ctx,
        );

        Ok(TransformResult {
            organisation: Some(organisation),
            location: Some(location),
            healthcare_service: Some(healthcare_service),
            validation_issues: vec![],
        })
    }
}
