//! 🧼 Validation & sanitisation: scrub the record, write down every stain.
//!
//! 🎬 *[an email address arrives with a trailing space and a .com domain. it is not welcome here.]*
//!
//! Two layers:
//! - **Field validators** ([`email`], [`phone`]): one raw value in, a sanitised value
//!   (or `None`) plus typed issues out. Stateless, reusable on any field of that type.
//! - **Record validators** ([`service`]): run the field validators over the relevant
//!   columns of a [`LegacyServiceRecord`], return a sanitised clone and the issue list,
//!   and log a diff for every value the scrub changed.
//!
//! Issues never get dropped. They ride along into the migration state. Only `fatal`
//! severity, or a code listed in the [`FatalPolicy`], blocks persistence.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::LegacyServiceRecord;

pub mod email;
pub mod phone;
pub mod service;

pub use email::EmailValidator;
pub use phone::PhoneValidator;
pub use service::{GpPracticeValidator, ServiceValidator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

/// 🏷️ One thing wrong with one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    pub field: String,
}

impl ValidationIssue {
    pub fn new(
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            field: field.into(),
        }
    }
}

/// 🔬 Outcome of validating one field value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValidationResult<T> {
    pub original: Option<String>,
    pub sanitised: Option<T>,
    pub issues: Vec<ValidationIssue>,
}

impl<T> FieldValidationResult<T> {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// 📋 Outcome of validating a whole record.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub record_id: i64,
    pub sanitised: LegacyServiceRecord,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// 🧱 Does anything here block persistence under `policy`?
    pub fn is_fatal(&self, policy: &FatalPolicy) -> bool {
        self.issues.iter().any(|issue| policy.is_fatal(issue))
    }
}

/// ⚖️ Which issues block persistence. Fatal severity always does; extra codes can be promoted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FatalPolicy {
    codes: HashSet<String>,
}

impl FatalPolicy {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_fatal(&self, issue: &ValidationIssue) -> bool {
        issue.severity == Severity::Fatal || self.codes.contains(&issue.code)
    }
}

/// 🔍 A record-level validator for one service profile.
pub trait Validator: Send + Sync + std::fmt::Debug {
    fn validate(&self, record: &LegacyServiceRecord) -> ValidationResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(issues: Vec<ValidationIssue>) -> ValidationResult {
        ValidationResult {
            record_id: 1,
            sanitised: LegacyServiceRecord::default(),
            issues,
        }
    }

    #[test]
    fn the_one_where_errors_are_loud_but_not_fatal() {
        let the_result = result_with(vec![ValidationIssue::new(
            Severity::Error,
            "invalid_format",
            "Email address is not valid",
            "email",
        )]);
        assert!(!the_result.is_valid());
        assert!(!the_result.is_fatal(&FatalPolicy::default()));
    }

    #[test]
    fn the_one_where_policy_promotes_a_code_to_fatal() {
        let the_result = result_with(vec![ValidationIssue::new(
            Severity::Error,
            "publicname_required",
            "Public name is required for GP practices",
            "publicname",
        )]);
        assert!(the_result.is_fatal(&FatalPolicy::new(["publicname_required"])));
        assert!(!the_result.is_fatal(&FatalPolicy::new(["not_nhs_email"])));
    }

    #[test]
    fn the_one_where_fatal_severity_needs_no_policy() {
        let the_result = result_with(vec![ValidationIssue::new(
            Severity::Fatal,
            "address_required",
            "Address is required",
            "address",
        )]);
        assert!(the_result.is_fatal(&FatalPolicy::default()));
    }
}
