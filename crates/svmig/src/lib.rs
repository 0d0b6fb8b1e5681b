//! 🚚 svmig: legacy service records in, normalised Organisation / Location /
//! HealthcareService documents out. At most one meaningful write per change. 🦆
//!
//! 🧠 Knowledge graph:
//! - [`batch`] takes a queue batch, fans items out to [`processor`], returns the
//!   partial-failure report.
//! - [`processor`] runs one record: [`transformers`] select + filter, [`validation`]
//!   sanitises, [`mapping`] builds the entities, [`state`] saves on material change.
//! - [`cache`] memoises reference tables, [`backends`] are the outside world,
//!   [`metrics`] counts, [`progress`] draws.

use std::sync::Arc;

use anyhow::{Context, Result};

pub mod app_config;
pub mod backends;
pub mod batch;
pub mod cache;
pub mod error;
pub mod formatting;
pub mod ids;
pub mod mapping;
pub mod metrics;
pub mod model;
pub mod processor;
pub mod progress;
pub mod state;
pub mod transformers;
pub mod validation;

use crate::app_config::AppConfig;
use crate::backends::Collaborators;
use crate::batch::BatchProcessor;
use crate::processor::ServiceMigrationProcessor;

/// 🔧 Resolve backends from config and wire the engine, once per process.
pub async fn build(app_config: &AppConfig) -> Result<BatchProcessor> {
    let collaborators = Collaborators::from_config(&app_config.source, &app_config.store)
        .await
        .context("💀 Failed to resolve the source and store backends from configuration")?;
    let processor = ServiceMigrationProcessor::from_collaborators(&collaborators, &app_config.migration);
    Ok(BatchProcessor::new(
        Arc::new(processor),
        app_config.migration.concurrency,
    ))
}
