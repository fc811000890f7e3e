//! Page scrapers for the speeches section.
//!
//! Scraping is split in the usual two phases:
//!
//! 1. **Indexing**: find candidate article URLs on the index page
//!    ([`discursos::LinkDiscoverer`])
//! 2. **Extraction**: pull title, body and date out of one article page
//!    ([`discursos::extract_article`])
//!
//! Both phases work on an already parsed [`scraper::Html`] document and never
//! touch the network; fetching is the [`crate::fetcher`]'s job.

pub mod discursos;
