//! Error types for each stage of the harvest.
//!
//! Only [`StoreError`] and [`ConfigError`] ever reach `main`. Fetch and date
//! failures are contained at the component that produced them: they are
//! logged and turned into an absent value so one bad article never affects
//! another.

use std::path::PathBuf;
use thiserror::Error;

/// A single GET that did not yield a usable document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("unexpected HTTP status {status}")]
    Status { status: reqwest::StatusCode },

    /// Connection, TLS, redirect or body-decoding failure.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e)
        } else if let Some(status) = e.status() {
            FetchError::Status { status }
        } else {
            FetchError::Transport(e)
        }
    }
}

/// Date text that does not follow `<dow> <day> de <month> de <year>`.
#[derive(Debug, Error)]
pub enum DateParseError {
    #[error("date text is empty")]
    Empty,

    #[error("cannot parse {input:?} as `day de month de year`: {source}")]
    Malformed {
        input: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Failure reading or writing the persisted CSV store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store {path} is not valid CSV: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to serialize records: {0}")]
    Serialize(#[from] csv::Error),

    #[error("failed to write store {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid or unreadable settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("base URL {url:?} is not an absolute URL: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("keyword must not be empty")]
    EmptyKeyword,

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("article selector {0:?} is not a valid CSS selector")]
    Selector(String),

    #[error("user agent {0:?} is not a valid header value")]
    UserAgent(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
