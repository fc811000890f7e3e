//! Runtime settings.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! command-line flags. The result is validated once before the run starts.
//!
//! ```yaml
//! base_url: https://www.casarosada.gob.ar/informacion/discursos/
//! keyword: milei
//! data_dir: ./data
//! strategy: replace      # or: append
//! mode: concurrent       # or: sequential
//! concurrency: 8
//! timeout_secs: 10
//! resync_on_empty_delta: false
//! system_proxy: true
//! ```

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::fetcher::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use crate::merge::MergeStrategy;
use crate::pipeline::ExecutionMode;
use crate::scrapers::discursos::ARTICLE_BOX_SELECTOR;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.casarosada.gob.ar/informacion/discursos/";
pub const DEFAULT_KEYWORD: &str = "milei";
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Everything a run needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Index page listing the speeches.
    pub base_url: String,
    /// Substring an article href must contain (case-insensitive).
    pub keyword: String,
    /// Directory holding `discursos_<keyword>.csv`.
    pub data_dir: PathBuf,
    /// Explicit store path, overriding `data_dir` naming.
    pub output: Option<PathBuf>,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Honour proxy settings from the environment (`HTTP_PROXY` and friends).
    pub system_proxy: bool,
    /// CSS selector of the article boxes on the index page.
    pub article_selector: String,
    pub strategy: MergeStrategy,
    pub mode: ExecutionMode,
    /// In-flight request limit for [`ExecutionMode::Concurrent`].
    pub concurrency: usize,
    /// Pause between requests for [`ExecutionMode::Sequential`].
    pub delay_ms: u64,
    /// Refetch every listed URL and rewrite the store when the delta is empty.
    pub resync_on_empty_delta: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_url: DEFAULT_BASE_URL.to_string(),
            keyword: DEFAULT_KEYWORD.to_string(),
            data_dir: PathBuf::from("./data"),
            output: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            system_proxy: true,
            article_selector: ARTICLE_BOX_SELECTOR.to_string(),
            strategy: MergeStrategy::default(),
            mode: ExecutionMode::default(),
            concurrency: DEFAULT_CONCURRENCY,
            delay_ms: 0,
            resync_on_empty_delta: false,
        }
    }
}

impl Settings {
    /// Defaults overlaid with the YAML file at `path`, if given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Settings::default());
        };
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;
        let settings = Self::from_yaml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        info!(path, "Loaded settings file");
        Ok(settings)
    }

    /// Parse settings from YAML; missing keys keep their defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Settings::default());
        }
        serde_yaml::from_str(text)
    }

    /// Overlay any flags given on the command line.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(keyword) = &cli.keyword {
            self.keyword = keyword.clone();
        }
        if let Some(data_dir) = &cli.data_dir {
            self.data_dir = PathBuf::from(data_dir);
        }
        if let Some(output) = &cli.output {
            self.output = Some(PathBuf::from(output));
        }
        if let Some(strategy) = cli.strategy {
            self.strategy = strategy;
        }
        if let Some(mode) = cli.mode {
            self.mode = mode;
        }
        if let Some(concurrency) = cli.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(timeout_secs) = cli.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        if let Some(delay_ms) = cli.delay_ms {
            self.delay_ms = delay_ms;
        }
        self.resync_on_empty_delta |= cli.resync_on_empty_delta;
        if cli.no_proxy {
            self.system_proxy = false;
        }
        self
    }

    /// Check the settings and return the parsed base URL.
    pub fn validate(&self) -> Result<Url, ConfigError> {
        if self.keyword.trim().is_empty() {
            return Err(ConfigError::EmptyKeyword);
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Url::parse(&self.base_url).map_err(|source| ConfigError::BaseUrl {
            url: self.base_url.clone(),
            source,
        })
    }

    /// Path of the CSV store for this keyword.
    pub fn store_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            self.data_dir
                .join(format!("discursos_{}.csv", self.keyword.to_lowercase()))
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
