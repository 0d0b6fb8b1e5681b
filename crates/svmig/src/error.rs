//! 🏷️ Error taxonomy: every failure gets a name tag and a travel plan.
//!
//! 🎬 *[a record fails. the queue holds its breath. "do we see you again?"]*
//!
//! The batch boundary only cares about one question per failure: **requeue or
//! drop?** So every error the engine raises is a [`MigrationError`] value that
//! carries its answer via [`MigrationError::retry`]. Nobody downstream has to
//! sniff strings or downcast anything at 3am.
//!
//! 🧠 Knowledge graph:
//! - `NotFound`, `UnsupportedService`, `ExcludedService`, `FatalValidation`,
//!   `UnsupportedEvent` → [`Retry::Drop`]. Retrying won't change the data.
//! - `TransientInfrastructure`, `Unclassified` → [`Retry::Requeue`]. The store
//!   might be back in five minutes. The unknown gets the benefit of the doubt.
//! - [`StoreError`] is the document store's own dialect; it converts into
//!   `TransientInfrastructure` with `?` at the state-store seam.
//!
//! 🦆 The duck is retryable. The duck is always retryable.

use thiserror::Error;

use crate::validation::ValidationIssue;

/// 🔁 What the queue runtime should do with an item that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retry {
    /// 📬 Put it back. Something transient broke; the record deserves another go.
    Requeue,
    /// 🗑️ Log it, count it, let it go. Redelivery would just fail the same way.
    Drop,
}

/// 💀 The classified error value carried from anywhere in the engine to the batch boundary.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// 🔍 Source record or reference row is missing.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// 🚫 No registered transformer claims the record (structural ineligibility).
    #[error("service {record_id} is not supported: {reason}")]
    UnsupportedService { record_id: i64, reason: String },

    /// 🙅 A transformer claimed the record but business rules exclude it.
    #[error("service {record_id} is excluded from migration: {reason}")]
    ExcludedService { record_id: i64, reason: String },

    /// 🧱 Validation found issues severe enough to block persistence.
    #[error("service {record_id} failed fatal validation with {} issue(s)", issues.len())]
    FatalValidation {
        record_id: i64,
        issues: Vec<ValidationIssue>,
    },

    /// 📭 The change event itself can't be handled (bad body, table or method).
    #[error("unsupported change event: {message}")]
    UnsupportedEvent { message: String },

    /// 🌩️ Store, source or network hiccup. Worth another delivery.
    #[error("transient infrastructure failure: {message}")]
    TransientInfrastructure {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// ❓ Something nobody classified. Treated as retryable so data is never silently lost.
    #[error(transparent)]
    Unclassified(#[from] anyhow::Error),
}

impl MigrationError {
    /// 🔁 The retry tag. The only thing the batch boundary really reads.
    pub fn retry(&self) -> Retry {
        match self {
            MigrationError::NotFound { .. }
            | MigrationError::UnsupportedService { .. }
            | MigrationError::ExcludedService { .. }
            | MigrationError::FatalValidation { .. }
            | MigrationError::UnsupportedEvent { .. } => Retry::Drop,
            MigrationError::TransientInfrastructure { .. } | MigrationError::Unclassified(_) => {
                Retry::Requeue
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.retry() == Retry::Requeue
    }

    /// 🌩️ Wrap a backend failure as transient, keeping the cause chain intact.
    pub fn transient(message: impl Into<String>, source: anyhow::Error) -> Self {
        MigrationError::TransientInfrastructure {
            message: message.into(),
            source,
        }
    }

    pub fn unsupported_event(message: impl Into<String>) -> Self {
        MigrationError::UnsupportedEvent {
            message: message.into(),
        }
    }
}

/// 🗄️ Failures from the document/key-value store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// ⚔️ Optimistic write lost the race: someone else bumped the version first.
    #[error("conditional write on '{key}' failed: expected version {expected:?}, found {actual:?}")]
    Conflict {
        key: String,
        expected: Option<u64>,
        actual: Option<u64>,
    },

    /// 📡 The store could not be reached or refused to cooperate.
    #[error("document store unavailable")]
    Unavailable(#[source] anyhow::Error),
}

impl From<StoreError> for MigrationError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        MigrationError::transient(message, anyhow::Error::new(err))
    }
}
