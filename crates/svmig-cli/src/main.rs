//! 🚀 svmig-cli: the front door of the migration engine.
//!
//! 🎬 *[narrator voice]* "It all started with a TOML file and a queue dump..."
//! Loads config, sets up logging, then hands the real work to `svmig`. 🦆

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use svmig::model::QueueBatch;
use svmig::progress::metrics_table;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "svmig", about = "🚚 Migrate legacy service records into the new directory")]
struct Cli {
    /// 🔧 TOML config file. Skipped if it doesn't exist (env vars only).
    #[arg(long, global = true, default_value = "svmig.toml")]
    config: PathBuf,

    /// 📡 Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 📬 Process a queue batch file and print the partial-failure report.
    HandleBatch {
        #[arg(long)]
        file: PathBuf,
    },
    /// 🎯 Migrate one service record.
    Sync {
        #[arg(long)]
        record_id: i64,
    },
    /// 🌍 Migrate every service in the source.
    SyncAll,
}

fn init_tracing(json_logs: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("svmig=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    // 🔒 check the file before getting emotionally attached
    let config_file = cli.config.as_path();
    let config_file_which_is_validated_to_exist: Option<&Path> = match config_file
        .try_exists()
        .context(format!(
            "💀 Couldn't check whether the configuration file exists. Was checking here: '{}'",
            config_file.display()
        ))? {
        true => Some(config_file),
        false => None,
    };

    let app_config = svmig::app_config::load_config(config_file_which_is_validated_to_exist)
        .context("💀 In svmig-cli, main, we couldn't load the configuration. Check the TOML and the SVMIG_* env vars.")?;
    let engine = svmig::build(&app_config).await?;

    match cli.command {
        Command::HandleBatch { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("💀 Failed to read batch file '{}'", file.display()))?;
            let batch: QueueBatch = serde_json::from_str(&raw)
                .with_context(|| format!("💀 Batch file '{}' is not a queue batch", file.display()))?;

            let report = engine.handle_batch(batch, Arc::new(AtomicBool::new(false))).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            eprintln!("{}", metrics_table(&engine.metrics()));
        }
        Command::Sync { record_id } => {
            let processor = engine.processor();
            let _run = processor.start_run().await;
            match processor.sync_service(record_id).await {
                Ok(outcome) => info!(record_id, outcome = ?outcome, "✅ record synced"),
                Err(err) => error!(record_id, error = %err, retryable = err.is_retryable(), "💀 record not synced"),
            }
            eprintln!("{}", metrics_table(&processor.metrics().snapshot()));
        }
        Command::SyncAll => {
            let report = engine.processor().sync_all(!cli.json_logs).await?;
            eprintln!("{}", metrics_table(&report.metrics));
            if !report.retryable.is_empty() {
                warn!(records = ?report.retryable, "🔁 some records failed retryably, run them again");
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    if let Err(err) = run(cli).await {
        error!("💀 error: {}", err);
        // 🧅 peel the onion, one layer at a time
        for cause in err.chain().skip(1) {
            error!("⚠️  cause: {}", cause);
        }
        std::process::exit(1);
    }
}
