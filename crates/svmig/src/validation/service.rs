//! 🏥 Record-level validators for service rows.
//!
//! [`ServiceValidator`] is the base every profile gets: email plus both phone columns.
//! [`GpPracticeValidator`] layers the GP-specific rules on top (public name, location).

use tracing::info;

use crate::formatting::format_address;
use crate::model::LegacyServiceRecord;
use crate::validation::{
    EmailValidator, FieldValidationResult, PhoneValidator, Severity, ValidationIssue,
    ValidationResult, Validator,
};

/// 🧼 Generic service validator: telecom columns only.
#[derive(Debug, Clone, Default)]
pub struct ServiceValidator {
    email: EmailValidator,
    phone: PhoneValidator,
}

impl ServiceValidator {
    pub fn new(email: EmailValidator) -> Self {
        Self {
            email,
            phone: PhoneValidator,
        }
    }
}

/// 📝 Apply one field result: write the sanitised value back, keep the issues, log any change.
fn apply_field(
    record_id: i64,
    field: &str,
    slot: &mut Option<String>,
    result: FieldValidationResult<String>,
    issues: &mut Vec<ValidationIssue>,
) {
    if slot.as_deref() != result.sanitised.as_deref() {
        info!(
            code = "SM_VAL_001",
            record_id,
            field,
            original = ?slot,
            sanitised = ?result.sanitised,
            "🧼 sanitised field value"
        );
    }
    *slot = result.sanitised;
    issues.extend(result.issues);
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl Validator for ServiceValidator {
    fn validate(&self, record: &LegacyServiceRecord) -> ValidationResult {
        let mut sanitised = record.clone();
        let mut issues = Vec::new();

        if let Some(email) = present(&record.email) {
            let result = self.email.validate(email, "email");
            apply_field(record.id, "email", &mut sanitised.email, result, &mut issues);
        }
        if let Some(phone) = present(&record.publicphone) {
            let result = self.phone.validate(phone, "publicphone");
            apply_field(record.id, "publicphone", &mut sanitised.publicphone, result, &mut issues);
        }
        if let Some(phone) = present(&record.nonpublicphone) {
            let result = self.phone.validate(phone, "nonpublicphone");
            apply_field(
                record.id,
                "nonpublicphone",
                &mut sanitised.nonpublicphone,
                result,
                &mut issues,
            );
        }

        ValidationResult {
            record_id: record.id,
            sanitised,
            issues,
        }
    }
}

/// 🩺 GP practice rules on top of the base validator.
#[derive(Debug, Clone, Default)]
pub struct GpPracticeValidator {
    base: ServiceValidator,
}

impl GpPracticeValidator {
    pub fn new(base: ServiceValidator) -> Self {
        Self { base }
    }

    /// 🏷️ Public name is required; everything from the first `-` on is noise.
    pub fn validate_name(&self, name: Option<&str>) -> FieldValidationResult<String> {
        let Some(name) = name.filter(|n| !n.trim().is_empty()) else {
            return FieldValidationResult {
                original: name.map(str::to_string),
                sanitised: None,
                issues: vec![ValidationIssue::new(
                    Severity::Error,
                    "publicname_required",
                    "Public name is required for GP practices",
                    "publicname",
                )],
            };
        };

        let cleaned = name.split('-').next().unwrap_or(name).trim_end();
        FieldValidationResult {
            original: Some(name.to_string()),
            sanitised: Some(cleaned.to_string()),
            issues: vec![],
        }
    }

    /// 📍 A location needs something to stand on: address, town or postcode,
    /// and an address that actually formats.
    pub fn validate_location(
        &self,
        address: Option<&str>,
        town: Option<&str>,
        postcode: Option<&str>,
    ) -> Vec<ValidationIssue> {
        let blank = |v: Option<&str>| v.is_none_or(|v| v.trim().is_empty());
        if blank(address) && blank(town) && blank(postcode) {
            return vec![ValidationIssue::new(
                Severity::Fatal,
                "address_required",
                "Address is required for GP practices to create a location",
                "address",
            )];
        }

        if format_address(address, town, postcode).is_none() {
            info!(code = "SM_VAL_003", ?address, "🏚️ address could not be formatted");
            return vec![ValidationIssue::new(
                Severity::Fatal,
                "invalid_address",
                "Address was invalid or incomplete, could not be formatted for GP practices to create a location",
                "address",
            )];
        }

        info!(code = "SM_VAL_002", "🏠 address formatted for location");
        vec![]
    }
}

impl Validator for GpPracticeValidator {
    fn validate(&self, record: &LegacyServiceRecord) -> ValidationResult {
        let mut result = self.base.validate(record);

        let name_result = self.validate_name(record.publicname.as_deref());
        apply_field(
            record.id,
            "publicname",
            &mut result.sanitised.publicname,
            name_result,
            &mut result.issues,
        );

        result.issues.extend(self.validate_location(
            record.address.as_deref(),
            record.town.as_deref(),
            record.postcode.as_deref(),
        ));
        result
    }
}
