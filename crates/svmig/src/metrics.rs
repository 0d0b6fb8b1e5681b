//! 🧮 Migration metrics: nine counters and the truth.
//!
//! Lock-free `AtomicU64`s so any number of workers can bump them without
//! coordinating. Reset when a counted run starts (see `ServiceMigrationProcessor::start_run`);
//! read as a [`MetricsSnapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::MigrationError;

#[derive(Debug, Default)]
pub struct MigrationMetrics {
    total: AtomicU64,
    supported: AtomicU64,
    unsupported: AtomicU64,
    transformed: AtomicU64,
    invalid: AtomicU64,
    inserted: AtomicU64,
    updated: AtomicU64,
    skipped: AtomicU64,
    errored: AtomicU64,
}

/// 📸 Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total: u64,
    pub supported: u64,
    pub unsupported: u64,
    pub transformed: u64,
    pub invalid: u64,
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errored: u64,
}

impl MetricsSnapshot {
    /// 🏷️ `(name, value)` pairs in display order.
    pub fn rows(&self) -> [(&'static str, u64); 9] {
        [
            ("total", self.total),
            ("supported", self.supported),
            ("unsupported", self.unsupported),
            ("transformed", self.transformed),
            ("invalid", self.invalid),
            ("inserted", self.inserted),
            ("updated", self.updated),
            ("skipped", self.skipped),
            ("errored", self.errored),
        ]
    }
}

macro_rules! counter {
    ($($name:ident => $field:ident),+ $(,)?) => {
        $(
            pub fn $name(&self) {
                self.$field.fetch_add(1, Ordering::Relaxed);
            }
        )+
    };
}

impl MigrationMetrics {
    counter! {
        inc_total => total,
        inc_supported => supported,
        inc_unsupported => unsupported,
        inc_transformed => transformed,
        inc_invalid => invalid,
        inc_inserted => inserted,
        inc_updated => updated,
        inc_skipped => skipped,
        inc_errored => errored,
    }

    /// 🗂️ Count a failure in the bucket its classification belongs to.
    pub fn record_error(&self, err: &MigrationError) {
        match err {
            MigrationError::UnsupportedService { .. } => self.inc_unsupported(),
            MigrationError::ExcludedService { .. } => self.inc_skipped(),
            MigrationError::FatalValidation { .. } => self.inc_invalid(),
            MigrationError::NotFound { .. }
            | MigrationError::UnsupportedEvent { .. }
            | MigrationError::TransientInfrastructure { .. }
            | MigrationError::Unclassified(_) => self.inc_errored(),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        MetricsSnapshot {
            total: load(&self.total),
            supported: load(&self.supported),
            unsupported: load(&self.unsupported),
            transformed: load(&self.transformed),
            invalid: load(&self.invalid),
            inserted: load(&self.inserted),
            updated: load(&self.updated),
            skipped: load(&self.skipped),
            errored: load(&self.errored),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.total,
            &self.supported,
            &self.unsupported,
            &self.transformed,
            &self.invalid,
            &self.inserted,
            &self.updated,
            &self.skipped,
            &self.errored,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
