//! Command-line interface definitions.
//!
//! Every flag is optional: unset flags fall back to the YAML settings file
//! (if any) and then to the built-in defaults in [`crate::config::Settings`].

use crate::merge::MergeStrategy;
use crate::pipeline::ExecutionMode;
use clap::Parser;

/// Command-line arguments for the speech harvester.
///
/// # Examples
///
/// ```sh
/// # Incremental run with defaults (./data/discursos_milei.csv)
/// discursos_harvester
///
/// # Different keyword, concurrent fetching, append-only writes
/// discursos_harvester -k adorni --mode concurrent --strategy append
///
/// # Settings from a file, with a one-off override
/// discursos_harvester -c harvester.yaml --timeout-secs 30
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Index page listing the speeches
    #[arg(long, env = "DISCURSOS_BASE_URL")]
    pub base_url: Option<String>,

    /// Keyword an article link must contain (case-insensitive)
    #[arg(short, long, env = "DISCURSOS_KEYWORD")]
    pub keyword: Option<String>,

    /// Directory holding the CSV store
    #[arg(short, long)]
    pub data_dir: Option<String>,

    /// Explicit CSV store path (overrides the data directory naming)
    #[arg(short, long)]
    pub output: Option<String>,

    /// How new records are merged into the store
    #[arg(long, value_enum)]
    pub strategy: Option<MergeStrategy>,

    /// Fetch articles one at a time or concurrently
    #[arg(long, value_enum)]
    pub mode: Option<ExecutionMode>,

    /// Maximum in-flight requests in concurrent mode
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Pause between sequential requests in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Refetch every listed speech and rewrite the store when nothing is new
    #[arg(long)]
    pub resync_on_empty_delta: bool,

    /// Ignore HTTP(S)_PROXY from the environment and connect directly
    #[arg(long)]
    pub no_proxy: bool,
}
