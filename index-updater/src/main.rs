//! Index Updater Main Entry Point
//!
//! Runs one collection update as a batch job: reads trigger records from a
//! JSON-lines file and processes them against the configured collection.
//! Data providers are registered by embedding applications through the
//! library API; this binary runs with an empty provider registry, which
//! suits configurations built from trigger paths and static values.

use dotenv::dotenv;
use index_updater::{Dependencies, UpdateError};
use serde_json::Value;
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
///
/// `LOG_FORMAT=json` selects structured JSON output; anything else gets
/// pretty console output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("index_updater=info"));

    let json_format = env::var("LOG_FORMAT")
        .map(|value| value.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();
    }

    info!(
        service_name = "index-updater",
        service_version = env!("CARGO_PKG_VERSION"),
        "Tracing initialized"
    );
}

/// Read trigger records from a JSON-lines file.
fn read_trigger_records(path: &str) -> Result<Vec<Value>, UpdateError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        UpdateError::configuration(format!("failed to read trigger file {path}: {e}"))
    })?;

    let mut records = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|e| {
            UpdateError::configuration(format!(
                "invalid trigger record on line {}: {e}",
                number + 1
            ))
        })?;
        records.push(record);
    }
    Ok(records)
}

#[tokio::main]
async fn main() -> Result<(), UpdateError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing();

    info!("Starting index updater");

    let collection = env::var("COLLECTION").map_err(|_| {
        UpdateError::configuration("COLLECTION environment variable must be set")
    })?;
    let trigger_file = env::var("TRIGGER_FILE").map_err(|_| {
        UpdateError::configuration("TRIGGER_FILE environment variable must be set")
    })?;

    let deps = match Dependencies::new() {
        Ok(deps) => deps,
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let records = read_trigger_records(&trigger_file)?;
    info!(
        collection = %collection,
        records = records.len(),
        "Loaded trigger records"
    );

    let outcome = {
        let config = deps.config_store.collection(&collection)?;
        deps.processor.process(config, &records).await
    };

    deps.shutdown().await;

    match outcome {
        Ok(report) => {
            info!(
                total = report.total,
                succeeded = report.succeeded,
                skipped = report.skipped(),
                "Index update complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Index update failed");
            Err(e)
        }
    }
}
