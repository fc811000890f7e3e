//! Deduplication and merging of harvested records into the store.
//!
//! A run first reduces the discovered URLs to the ones the store has never
//! seen ([`new_urls`]), then folds the freshly harvested records into the
//! store according to a [`MergeStrategy`]:
//!
//! - [`MergeStrategy::Replace`]: existing + new, newest date first, full
//!   rewrite of the file
//! - [`MergeStrategy::Append`]: new rows added after the existing ones,
//!   which keep their on-disk order
//!
//! Under both strategies a URL appears at most once in the result, so
//! running the same merge again changes nothing.

use crate::models::Record;
use chrono::NaiveDate;
use clap::ValueEnum;
use itertools::Itertools;
use serde::Deserialize;
use std::cmp::Reverse;
use std::collections::HashSet;

/// How new records are combined with the persisted ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Concatenate, sort by date descending, rewrite the whole store.
    #[default]
    Replace,
    /// Write only the new rows onto the end of the store.
    Append,
}

/// The write a merge requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergePlan {
    /// Replace the store with exactly these records.
    Rewrite(Vec<Record>),
    /// Add `rows` after the `existing` rows already on disk.
    Append { existing: usize, rows: Vec<Record> },
}

impl MergePlan {
    /// Number of records in the store once the plan is applied.
    pub fn total(&self) -> usize {
        match self {
            MergePlan::Rewrite(records) => records.len(),
            MergePlan::Append { existing, rows } => existing + rows.len(),
        }
    }
}

impl MergeStrategy {
    /// Fold `new` into `existing`, dropping any record whose URL is already
    /// present.
    pub fn plan(self, existing: Vec<Record>, new: Vec<Record>) -> MergePlan {
        match self {
            MergeStrategy::Replace => MergePlan::Rewrite(replace_and_sort(existing, new)),
            MergeStrategy::Append => MergePlan::Append {
                existing: existing.len(),
                rows: append_only(&existing, new),
            },
        }
    }
}

/// Candidate URLs not yet in the store, each listed once.
pub fn new_urls(existing: &[Record], candidates: &[String]) -> Vec<String> {
    let known: HashSet<&str> = existing.iter().map(|r| r.url.as_str()).collect();
    candidates
        .iter()
        .unique()
        .filter(|url| !known.contains(url.as_str()))
        .cloned()
        .collect()
}

/// Existing and new records, first occurrence of each URL kept, newest first.
///
/// Records without a parseable date sort last. Records with equal dates
/// keep their relative order.
pub fn replace_and_sort(existing: Vec<Record>, new: Vec<Record>) -> Vec<Record> {
    let mut combined: Vec<Record> = existing
        .into_iter()
        .chain(new)
        .unique_by(|r| r.url.clone())
        .collect();
    sort_by_date_desc(&mut combined);
    combined
}

/// The rows of `new` that may be appended after `existing`.
pub fn append_only(existing: &[Record], new: Vec<Record>) -> Vec<Record> {
    let known: HashSet<&str> = existing.iter().map(|r| r.url.as_str()).collect();
    new.into_iter()
        .filter(|r| !known.contains(r.url.as_str()))
        .unique_by(|r| r.url.clone())
        .collect()
}

/// Stored rows for listed URLs that `refreshed` has no record for.
///
/// A resync rebuilds the store from the listed URLs; a URL whose refetch
/// failed keeps the row it already had.
pub fn unrefreshed(
    existing: Vec<Record>,
    listed: &[String],
    refreshed: &[Record],
) -> Vec<Record> {
    let listed: HashSet<&str> = listed.iter().map(String::as_str).collect();
    let fresh: HashSet<&str> = refreshed.iter().map(|r| r.url.as_str()).collect();
    existing
        .into_iter()
        .filter(|r| listed.contains(r.url.as_str()) && !fresh.contains(r.url.as_str()))
        .collect()
}

/// Stable sort, newest `date` first, absent or unparseable dates last.
pub fn sort_by_date_desc(records: &mut [Record]) {
    records.sort_by_key(|r| Reverse(sort_date(r)));
}

fn sort_date(record: &Record) -> Option<NaiveDate> {
    record
        .date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}
