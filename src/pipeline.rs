//! The harvest run: discover, fetch, extract, merge, persist.
//!
//! ```text
//! index page ──► candidate URLs ──► new URLs ──► fetch + extract ──► merge ──► CSV
//!                                 (minus store)    (per URL)
//! ```
//!
//! The set of URLs processed is fixed once, right after discovery. Per-URL
//! failures only drop that URL's record; the one fatal error is failing to
//! read or write the store.

use crate::config::Settings;
use crate::dates::DateNormalizer;
use crate::error::{ConfigError, StoreError};
use crate::fetcher::Fetcher;
use crate::merge::{self, MergeStrategy};
use crate::models::{Record, RunSummary};
use crate::scrapers::discursos::{LinkDiscoverer, extract_article};
use crate::store::CsvStore;
use crate::utils::{courtesy_delay, truncate_for_log};
use clap::ValueEnum;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// How article pages are fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One request at a time, with an optional courtesy delay in between.
    #[default]
    Sequential,
    /// Up to `concurrency` requests in flight, joined before merging.
    Concurrent,
}

/// A configured harvest run.
///
/// Owns the HTTP client for the lifetime of the run; dropping the pipeline
/// releases it.
#[derive(Debug)]
pub struct Pipeline {
    base_url: Url,
    fetcher: Fetcher,
    discoverer: LinkDiscoverer,
    normalizer: DateNormalizer,
    store: CsvStore,
    strategy: MergeStrategy,
    mode: ExecutionMode,
    concurrency: usize,
    delay: Duration,
    resync_on_empty_delta: bool,
}

impl Pipeline {
    /// Validate `settings` and build every component of the run.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let base_url = settings.validate()?;
        let fetcher = Fetcher::new(
            settings.timeout(),
            &settings.user_agent,
            settings.system_proxy,
        )?;
        let discoverer = LinkDiscoverer::new(&settings.article_selector, &settings.keyword)?;

        Ok(Pipeline {
            base_url,
            fetcher,
            discoverer,
            normalizer: DateNormalizer::spanish(),
            store: CsvStore::new(settings.store_path()),
            strategy: settings.strategy,
            mode: settings.mode,
            concurrency: settings.concurrency,
            delay: settings.delay(),
            resync_on_empty_delta: settings.resync_on_empty_delta,
        })
    }

    pub fn store(&self) -> &CsvStore {
        &self.store
    }

    /// Run the harvest once.
    ///
    /// If nothing is new and resync is enabled, every currently listed URL is
    /// refetched and the store is rewritten from the listed URLs. A URL whose
    /// refetch fails keeps its stored row, and nothing is written when every
    /// refetch fails. Resync never runs when the index yielded no candidates
    /// at all.
    #[instrument(
        level = "info",
        skip_all,
        fields(store = %self.store.path().display(), strategy = ?self.strategy, mode = ?self.mode)
    )]
    pub async fn run(&self) -> Result<RunSummary, StoreError> {
        let existing = self.store.load().await?;
        let candidates = self.discover().await;
        let new_urls = merge::new_urls(&existing, &candidates);

        let mut summary = RunSummary {
            discovered: candidates.len(),
            new_urls: new_urls.len(),
            total: existing.len(),
            ..RunSummary::default()
        };

        if !new_urls.is_empty() {
            info!(count = new_urls.len(), "New speeches found; harvesting");
            let (records, failed) = self.harvest(&new_urls).await;
            summary.harvested = records.len();
            summary.failed = failed;

            if records.is_empty() {
                warn!("Every new URL failed; store left untouched");
            } else {
                let plan = self.strategy.plan(existing, records);
                self.store.apply(&plan).await?;
                summary.total = plan.total();
                summary.persisted = true;
            }
        } else if self.resync_on_empty_delta && !candidates.is_empty() {
            warn!(
                count = candidates.len(),
                "No new URLs; resyncing the store from every listed speech"
            );
            let (records, failed) = self.harvest(&candidates).await;
            summary.harvested = records.len();
            summary.failed = failed;

            if records.is_empty() {
                warn!("Every listed URL failed; store left untouched");
            } else {
                // A failed refetch keeps its stored row.
                let carried = merge::unrefreshed(existing, &candidates, &records);
                if !carried.is_empty() {
                    warn!(count = carried.len(), "Keeping stored rows for failed refetches");
                }
                let plan = MergeStrategy::Replace.plan(carried, records);
                self.store.apply(&plan).await?;
                summary.total = plan.total();
                summary.persisted = true;
            }
        } else if self.resync_on_empty_delta {
            warn!("Index yielded no candidates; skipping resync");
        } else {
            info!("No new URLs found");
        }

        info!(
            discovered = summary.discovered,
            new = summary.new_urls,
            harvested = summary.harvested,
            failed = summary.failed,
            total = summary.total,
            persisted = summary.persisted,
            "Run complete"
        );
        Ok(summary)
    }

    /// Candidate URLs from the index page, each listed once.
    async fn discover(&self) -> Vec<String> {
        let index = self.fetcher.fetch(self.base_url.as_str()).await;
        self.discoverer
            .discover(index.as_ref(), &self.base_url)
            .into_iter()
            .unique()
            .collect()
    }

    /// Fetch and extract every URL; returns the records in `urls` order and
    /// the number of URLs that failed.
    #[instrument(level = "info", skip_all, fields(count = urls.len()))]
    async fn harvest(&self, urls: &[String]) -> (Vec<Record>, usize) {
        let mut results: Vec<(usize, Option<Record>)> = match self.mode {
            ExecutionMode::Sequential => {
                stream::iter(urls.iter().enumerate())
                    .then(|(i, url)| async move {
                        if i > 0 {
                            courtesy_delay(self.delay).await;
                        }
                        (i, self.harvest_one(url).await)
                    })
                    .collect()
                    .await
            }
            ExecutionMode::Concurrent => {
                stream::iter(urls.iter().enumerate())
                    .map(|(i, url)| async move { (i, self.harvest_one(url).await) })
                    .buffer_unordered(self.concurrency)
                    .collect()
                    .await
            }
        };
        results.sort_by_key(|(i, _)| *i);

        let attempted = results.len();
        let records: Vec<Record> = results.into_iter().filter_map(|(_, r)| r).collect();
        let failed = attempted - records.len();
        info!(harvested = records.len(), failed, "Harvested speech pages");
        (records, failed)
    }

    /// Fetch one speech page and turn it into a record.
    async fn harvest_one(&self, url: &str) -> Option<Record> {
        let document = self.fetcher.fetch(url).await?;
        let article = extract_article(&document);
        let date = self.normalizer.normalize(article.raw_date.as_deref());
        debug!(
            %url,
            title = %truncate_for_log(article.title.as_deref().unwrap_or(""), 80),
            date = ?date,
            "Extracted speech"
        );
        Some(Record::from_extracted(url.to_string(), article, date))
    }
}
