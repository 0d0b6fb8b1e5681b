//! 🔧 App Configuration: the TOML-to-struct pipeline, now with more NHS.
//!
//! 📡 Env vars (`SVMIG_*`, nested keys split on `__`) form the base layer;
//! an optional TOML file merges over them and wins on conflict.
//!
//! ```toml
//! [source.File]
//! file_name = "dos_snapshot.json"
//!
//! [store.File]
//! file_name = "migration_state.json"
//!
//! [migration]
//! concurrency = 8
//! fatal_issue_codes = ["invalid_phone_format"]
//! ```
//!
//! 🦆 The duck is configured by default. It did not ask to be.

use std::path::Path;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

use crate::backends::file::{FileSourceConfig, FileStoreConfig};
use crate::model::event::SERVICES_TABLE;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// 🏚️ Where the legacy rows live.
#[derive(Debug, Deserialize, Clone, Default)]
pub enum SourceConfig {
    /// Empty source. Useful for tests and for proving a point.
    #[default]
    InMemory,
    File(FileSourceConfig),
}

/// 💾 Where migration state is kept.
#[derive(Debug, Deserialize, Clone, Default)]
pub enum StoreConfig {
    #[default]
    InMemory,
    File(FileStoreConfig),
}

/// 🎛️ Knobs for the engine itself.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MigrationConfig {
    /// 🧵 Batch items processed at once. Zero is treated as one.
    pub concurrency: usize,
    /// 💀 Issue codes that block persistence on top of fatal severities.
    pub fatal_issue_codes: Vec<String>,
    pub allowed_email_domains: Vec<String>,
    pub state_table: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            fatal_issue_codes: vec![],
            allowed_email_domains: vec!["nhs.uk".to_string(), "nhs.net".to_string()],
            state_table: SERVICES_TABLE.to_string(),
        }
    }
}

/// 🚀 Load the config from env vars plus an optional TOML file.
///
/// `None` → env vars only. `Some(path)` → env vars, then the file over them.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        code = "SM_APP_001",
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let config = Figment::new().merge(Env::prefixed("SVMIG_").split("__"));
    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (SVMIG_*).",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (SVMIG_*). \
                 No file was provided, so this one's on the environment."
            .to_string(),
    };

    config.extract().context(context_msg)
}
