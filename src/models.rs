//! Data models for harvested speeches.
//!
//! - [`ExtractedArticle`]: the raw fields pulled out of one article page
//! - [`Record`]: one row of the persisted store, keyed by URL
//! - [`RunSummary`]: counts reported at the end of a run
//!
//! Absent fields are `None`, never an empty string, so a consumer can tell
//! "the page had no `<h2>`" apart from "the `<h2>` was blank".

use serde::{Deserialize, Serialize};

/// Fields pulled from a single article page before date normalization.
///
/// Each field is extracted independently of the others.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedArticle {
    /// Text of the first `<h2>`.
    pub title: Option<String>,
    /// Concatenated body paragraphs of the first `<article>`.
    pub content: Option<String>,
    /// Text of the first `<time>`, with CR/LF removed.
    pub raw_date: Option<String>,
}

/// One speech in the persisted store.
///
/// Serialized with the fixed column order `title, content, date, url`.
/// `url` is the identity key: two records with the same URL never coexist
/// in the store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Record {
    /// Speech title.
    pub title: Option<String>,
    /// Body text.
    pub content: Option<String>,
    /// Publication date as `YYYY-MM-DD`.
    pub date: Option<String>,
    /// Absolute URL the speech was harvested from.
    pub url: String,
}

impl Record {
    /// Build a record from extracted fields and an already normalized date.
    pub fn from_extracted(url: String, article: ExtractedArticle, date: Option<String>) -> Self {
        Record {
            title: article.title,
            content: article.content,
            date,
            url,
        }
    }
}

/// What a single run did, for the summary log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Candidate URLs discovered on the index page (after dedup).
    pub discovered: usize,
    /// URLs not previously in the store.
    pub new_urls: usize,
    /// Records successfully fetched and extracted this run.
    pub harvested: usize,
    /// URLs whose fetch failed and were skipped.
    pub failed: usize,
    /// Records in the store after the run.
    pub total: usize,
    /// Whether the store file was rewritten or appended to.
    pub persisted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_extracted() {
        let article = ExtractedArticle {
            title: Some("Discurso".to_string()),
            content: None,
            raw_date: Some("lunes 13 de febrero de 2025".to_string()),
        };
        let record = Record::from_extracted(
            "https://example.com/milei-speech".to_string(),
            article,
            Some("2025-02-13".to_string()),
        );

        assert_eq!(record.title.as_deref(), Some("Discurso"));
        assert_eq!(record.content, None);
        assert_eq!(record.date.as_deref(), Some("2025-02-13"));
        assert_eq!(record.url, "https://example.com/milei-speech");
    }

    #[test]
    fn test_extracted_article_default_is_all_absent() {
        let article = ExtractedArticle::default();
        assert!(article.title.is_none());
        assert!(article.content.is_none());
        assert!(article.raw_date.is_none());
    }
}
