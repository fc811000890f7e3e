//! # Discursos Harvester
//!
//! Incrementally harvests speech transcripts from the presidential press
//! index and keeps them in a deduplicated CSV dataset keyed by URL.
//!
//! ## Usage
//!
//! ```sh
//! discursos_harvester --keyword milei --data-dir ./data
//! ```
//!
//! ## Architecture
//!
//! Each run follows a one-way pipeline:
//! 1. **Indexing**: find speech links on the index page
//! 2. **Delta**: drop every URL already in the store
//! 3. **Fetching**: download and extract each new speech (sequential or concurrent)
//! 4. **Merging**: fold the new records into the CSV store and write it once

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod dates;
mod error;
mod fetcher;
mod merge;
mod models;
mod pipeline;
mod scrapers;
mod store;
#[cfg(test)]
mod test_support;
mod utils;

use cli::Cli;
use config::Settings;
use pipeline::Pipeline;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("discursos_harvester starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let settings = match Settings::load(args.config.as_deref()).await {
        Ok(settings) => settings.apply_cli(&args),
        Err(e) => {
            error!(error = %e, "Failed to load settings");
            return Err(e.into());
        }
    };
    info!(
        base_url = %settings.base_url,
        keyword = %settings.keyword,
        strategy = ?settings.strategy,
        mode = ?settings.mode,
        "Settings resolved"
    );

    let pipeline = match Pipeline::from_settings(&settings) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %e, "Invalid settings");
            return Err(e.into());
        }
    };

    // Early check: fail before any network traffic if the store can't be written
    let store_path = pipeline.store().path();
    info!(store = %store_path.display(), "Using store");
    if let Some(dir) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(error = %e, "Data directory is not writable (fix perms or choose a different path)");
            return Err(e.into());
        }
    }

    let summary = match pipeline.run().await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Run failed; store not updated");
            return Err(e.into());
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        new = summary.new_urls,
        total = summary.total,
        "Execution complete"
    );

    Ok(())
}
