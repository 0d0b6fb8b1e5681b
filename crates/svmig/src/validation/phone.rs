//! ☎️ UK phone number validator.
//!
//! Layout characters (whitespace, hyphens, dots, parentheses) are stripped, then
//! the trunk/country prefix (`+44`, `0044`, `0`) is peeled off. What's left must
//! be 9 or 10 digits. Canonical output is `+44` followed by those digits, so
//! `+44 (0)113 ...` and `(0113) 234-5678` land in the same place.
//!
//! Issue codes carry a `phone` prefix so a [`FatalPolicy`](crate::validation::FatalPolicy)
//! can single out phone columns without dragging email along.

use crate::validation::{FieldValidationResult, Severity, ValidationIssue};

pub const UK_COUNTRY_CODE: &str = "+44";
pub const MIN_NATIONAL_DIGITS: usize = 9;
pub const MAX_NATIONAL_DIGITS: usize = 10;

pub const INVALID_PHONE_FORMAT: &str = "invalid_phone_format";
pub const INVALID_PHONE_LENGTH: &str = "invalid_phone_length";

fn is_layout(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '.' | '(' | ')')
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneValidator;

impl PhoneValidator {
    pub fn validate(&self, raw: &str, field: &str) -> FieldValidationResult<String> {
        let failed = |code: &str, message: &str| FieldValidationResult {
            original: Some(raw.to_string()),
            sanitised: None,
            issues: vec![ValidationIssue::new(Severity::Error, code, message, field)],
        };

        // 🧹 "+44 (0)113" compacts to "+440113", the trunk zero goes below
        let compact: String = raw.chars().filter(|c| !is_layout(*c)).collect();
        let national = if let Some(rest) = compact.strip_prefix("+44") {
            rest.strip_prefix('0').unwrap_or(rest)
        } else if let Some(rest) = compact.strip_prefix("0044") {
            rest.strip_prefix('0').unwrap_or(rest)
        } else if let Some(rest) = compact.strip_prefix('0') {
            rest
        } else {
            return failed(INVALID_PHONE_FORMAT, "Phone number must start with 0, +44 or 0044");
        };

        if national.is_empty() || !national.chars().all(|c| c.is_ascii_digit()) {
            return failed(INVALID_PHONE_FORMAT, "Phone number must contain only digits");
        }
        if !(MIN_NATIONAL_DIGITS..=MAX_NATIONAL_DIGITS).contains(&national.len()) {
            return failed(INVALID_PHONE_LENGTH, "Phone number is not a valid UK length");
        }

        FieldValidationResult {
            original: Some(raw.to_string()),
            sanitised: Some(format!("{UK_COUNTRY_CODE}{national}")),
            issues: vec![],
        }
    }
}
