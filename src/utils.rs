//! Small helpers: log truncation, request pacing and output directory checks.

use crate::error::StoreError;
use rand::{Rng, rng};
use std::fs as stdfs;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::time::sleep;
use tracing::{debug, info, instrument};

/// Upper bound of the random jitter added to a courtesy delay.
const MAX_JITTER_MS: u64 = 250;

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and the number
/// of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Pause between two sequential requests to the source server.
///
/// A zero `base` means no pause at all; otherwise up to 250 ms of random
/// jitter is added.
pub async fn courtesy_delay(base: Duration) {
    if base.is_zero() {
        return;
    }
    let jitter = Duration::from_millis(rng().random_range(0..=MAX_JITTER_MS));
    let delay = base + jitter;
    debug!(?delay, "Courtesy delay");
    sleep(delay).await;
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
///
/// # Errors
///
/// [`StoreError::Write`] if the directory cannot be created or written to.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), StoreError> {
    let write_err = |source: std::io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    fs::create_dir_all(path).await.map_err(write_err)?;

    // Sync probe; the error surface of std::fs is simpler here.
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path).map_err(write_err)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
