//! 📧 Email validator.
//!
//! Checks, in order, stopping at the first failure:
//! 1. it's a string (`email_not_string`, only reachable via [`EmailValidator::validate_json`])
//! 2. at most 254 characters (`invalid_length`)
//! 3. basic `local@domain.tld` grammar (`invalid_format`)
//! 4. domain is an allowed corporate domain or a subdomain of one (`not_nhs_email`)
//!
//! Any issue → `sanitised = None`. Success → trimmed, domain lowercased.

use std::sync::LazyLock;

use regex::Regex;

use crate::validation::{FieldValidationResult, Severity, ValidationIssue};

pub const MAX_EMAIL_LENGTH: usize = 254;

static EMAIL_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("valid regex")
});

#[derive(Debug, Clone)]
pub struct EmailValidator {
    allowed_domains: Vec<String>,
}

impl Default for EmailValidator {
    fn default() -> Self {
        Self::new(["nhs.uk", "nhs.net"])
    }
}

impl EmailValidator {
    pub fn new<I, S>(allowed_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_domains: allowed_domains
                .into_iter()
                .map(|domain| domain.as_ref().trim().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// 📥 Entry point for loosely-typed input (raw JSON columns).
    pub fn validate_json(&self, raw: &serde_json::Value, field: &str) -> FieldValidationResult<String> {
        match raw {
            serde_json::Value::String(value) => self.validate(value, field),
            other => FieldValidationResult {
                original: Some(other.to_string()),
                sanitised: None,
                issues: vec![ValidationIssue::new(
                    Severity::Error,
                    "email_not_string",
                    "Email address must be a string",
                    field,
                )],
            },
        }
    }

    pub fn validate(&self, raw: &str, field: &str) -> FieldValidationResult<String> {
        let failed = |code: &str, message: &str| FieldValidationResult {
            original: Some(raw.to_string()),
            sanitised: None,
            issues: vec![ValidationIssue::new(Severity::Error, code, message, field)],
        };

        let candidate = raw.trim();
        if candidate.chars().count() > MAX_EMAIL_LENGTH {
            return failed(
                "invalid_length",
                "Email address exceeds the maximum length of 254 characters",
            );
        }
        if !EMAIL_GRAMMAR.is_match(candidate) {
            return failed("invalid_format", "Email address is not in a valid format");
        }

        // 🔒 grammar guarantees exactly one usable '@'
        let Some((local, domain)) = candidate.rsplit_once('@') else {
            return failed("invalid_format", "Email address is not in a valid format");
        };
        let domain = domain.to_lowercase();
        if !self.is_allowed_domain(&domain) {
            return failed("not_nhs_email", "Email address is not an NHS email address");
        }

        FieldValidationResult {
            original: Some(raw.to_string()),
            sanitised: Some(format!("{local}@{domain}")),
            issues: vec![],
        }
    }

    fn is_allowed_domain(&self, domain: &str) -> bool {
        self.allowed_domains.iter().any(|allowed| {
            domain == allowed
                || domain
                    .strip_suffix(allowed.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}
