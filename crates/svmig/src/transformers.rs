//! 🔄 Transformers: one per legacy service profile, picked by a fixed-priority scan.
//!
//! 🎬 *[a service row walks into the registry. the GP practice transformer looks up.
//! "typeid 100? ODS code starts with A? come on in."]*
//!
//! Each profile answers three questions and does one job:
//! - `is_service_supported`: structurally ours? (type, ODS code shape)
//! - `should_include_service`: business-wise in scope? (active)
//! - `validate`: what's wrong with the row, and what does it look like scrubbed?
//! - `transform`: Organisation → Location → HealthcareService, in that order.
//!
//! The [`ServiceTransformer`] enum dispatches, the [`TransformerRegistry`] scans in
//! priority order and takes the first that says yes. Nobody says yes → unsupported,
//! which is an outcome, not an error worth retrying.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::app_config::MigrationConfig;
use crate::cache::DosMetadata;
use crate::error::MigrationError;
use crate::model::{LegacyServiceRecord, TransformResult};
use crate::validation::{EmailValidator, GpPracticeValidator, ServiceValidator, ValidationResult};

pub mod gp_practice;

pub use gp_practice::GpPracticeTransformer;

/// ✅/🚫 Answer to an eligibility question, with the first failing reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Ineligible(&'static str),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }

    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Eligibility::Eligible => None,
            Eligibility::Ineligible(reason) => Some(reason),
        }
    }
}

/// 🧩 The capability set every service profile provides.
#[async_trait]
pub trait Transformer: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    fn is_service_supported(&self, record: &LegacyServiceRecord) -> Eligibility;

    fn should_include_service(&self, record: &LegacyServiceRecord) -> Eligibility;

    fn validate(&self, record: &LegacyServiceRecord) -> ValidationResult;

    /// 🏗️ Map a (sanitised) record. `validation_issues` on the result is left empty;
    /// the caller folds the validator's issues in.
    async fn transform(
        &self,
        record: &LegacyServiceRecord,
        metadata: &DosMetadata,
    ) -> Result<TransformResult, MigrationError>;
}

/// 🎭 Every registered profile. Adding one = a variant here + a slot in the priority list.
#[derive(Debug, Clone)]
pub enum ServiceTransformer {
    GpPractice(GpPracticeTransformer),
}

#[async_trait]
impl Transformer for ServiceTransformer {
    fn name(&self) -> &'static str {
        match self {
            ServiceTransformer::GpPractice(t) => t.name(),
        }
    }

    fn is_service_supported(&self, record: &LegacyServiceRecord) -> Eligibility {
        match self {
            ServiceTransformer::GpPractice(t) => t.is_service_supported(record),
        }
    }

    fn should_include_service(&self, record: &LegacyServiceRecord) -> Eligibility {
        match self {
            ServiceTransformer::GpPractice(t) => t.should_include_service(record),
        }
    }

    fn validate(&self, record: &LegacyServiceRecord) -> ValidationResult {
        match self {
            ServiceTransformer::GpPractice(t) => t.validate(record),
        }
    }

    async fn transform(
        &self,
        record: &LegacyServiceRecord,
        metadata: &DosMetadata,
    ) -> Result<TransformResult, MigrationError> {
        match self {
            ServiceTransformer::GpPractice(t) => t.transform(record, metadata).await,
        }
    }
}

/// 📇 Transformers in priority order. First supporter wins.
#[derive(Debug, Clone)]
pub struct TransformerRegistry {
    transformers: Vec<ServiceTransformer>,
}

impl TransformerRegistry {
    pub fn new(transformers: Vec<ServiceTransformer>) -> Self {
        Self { transformers }
    }

    /// 🔧 The production registry, validators configured from `config`.
    pub fn from_config(config: &MigrationConfig) -> Self {
        let base = ServiceValidator::new(EmailValidator::new(&config.allowed_email_domains));
        Self::new(vec![ServiceTransformer::GpPractice(GpPracticeTransformer::new(
            GpPracticeValidator::new(base),
        ))])
    }

    pub fn transformers(&self) -> &[ServiceTransformer] {
        &self.transformers
    }

    /// 🎯 First transformer that supports `record`, or `UnsupportedService` carrying
    /// every rejection reason in priority order.
    pub fn select(&self, record: &LegacyServiceRecord) -> Result<&ServiceTransformer, MigrationError> {
        let mut reasons = Vec::new();
        for transformer in &self.transformers {
            match transformer.is_service_supported(record) {
                Eligibility::Eligible => {
                    info!(
                        code = "SM_PROC_003",
                        record_id = record.id,
                        transformer = transformer.name(),
                        "🎯 transformer selected"
                    );
                    return Ok(transformer);
                }
                Eligibility::Ineligible(reason) => {
                    debug!(
                        code = "SM_PROC_002",
                        record_id = record.id,
                        transformer = transformer.name(),
                        reason,
                        "🚫 transformer declined record"
                    );
                    reasons.push(reason);
                }
            }
        }

        let reason = if reasons.is_empty() {
            "No suitable transformer found".to_string()
        } else {
            reasons.join("; ")
        };
        Err(MigrationError::UnsupportedService {
            record_id: record.id,
            reason,
        })
    }
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        Self::from_config(&MigrationConfig::default())
    }
}
