//! Scraper for the presidential speeches section.
//!
//! # Index page
//!
//! Speech teasers sit in "article box" elements deep inside the site's
//! layout. [`ARTICLE_BOX_SELECTOR`] mirrors that nesting exactly, so a change
//! to the site's markup yields no discoveries rather than wrong ones.
//!
//! # Article page
//!
//! ```text
//! <h2>title</h2>
//! <time>lunes 13 de febrero de 2025</time>
//! <article>
//!   <p><strong>caption or attribution</strong></p>   (skipped)
//!   <p>body text</p>
//! </article>
//! ```

use crate::error::ConfigError;
use crate::models::ExtractedArticle;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

/// Nested container path of the article boxes on the speeches index.
pub const ARTICLE_BOX_SELECTOR: &str = "html body div#jm-allpage.nofluid div#jm-mainpage \
     div#jm-mainpage-in div#jm-main.lcr.scheme1.nocolumns.clearfix div#jm-maincontent \
     main.home-special.home-mid div.container section \
     div.row.row-extra.row-news.row-clear-4 div.blog div.contentboxes \
     div.box.col-sm-6.col-md-3 div.item";

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static STRONG: Lazy<Selector> = Lazy::new(|| Selector::parse("strong").unwrap());
static TIME: Lazy<Selector> = Lazy::new(|| Selector::parse("time").unwrap());

/// Finds speech links on the index page.
#[derive(Debug, Clone)]
pub struct LinkDiscoverer {
    boxes: Selector,
    keyword: String,
}

impl LinkDiscoverer {
    /// Discoverer matching article boxes with `selector` and hrefs containing
    /// `keyword` (case-insensitive).
    pub fn new(selector: &str, keyword: &str) -> Result<Self, ConfigError> {
        let boxes =
            Selector::parse(selector).map_err(|_| ConfigError::Selector(selector.to_string()))?;
        Ok(LinkDiscoverer {
            boxes,
            keyword: keyword.to_lowercase(),
        })
    }

    /// Absolute URLs of every qualifying anchor, in page order.
    ///
    /// Duplicates are kept. A missing document or a selector that matches
    /// nothing yields an empty list.
    #[instrument(level = "info", skip_all, fields(base = %base, keyword = %self.keyword))]
    pub fn discover(&self, document: Option<&Html>, base: &Url) -> Vec<String> {
        let Some(document) = document else {
            info!("No index document; nothing discovered");
            return Vec::new();
        };

        let mut urls = Vec::new();
        for article_box in document.select(&self.boxes) {
            for anchor in article_box.select(&ANCHOR) {
                let Some(href) = anchor.value().attr("href") else {
                    continue;
                };
                if !href.to_lowercase().contains(&self.keyword) {
                    continue;
                }
                match base.join(href) {
                    Ok(resolved) => urls.push(resolved.to_string()),
                    Err(e) => debug!(%href, error = %e, "Skipping unresolvable href"),
                }
            }
        }

        info!(count = urls.len(), "Discovered speech URLs");
        debug!(urls = ?urls, "Speech URLs");
        urls
    }
}

/// Pull title, body text and raw date out of a speech page.
pub fn extract_article(document: &Html) -> ExtractedArticle {
    ExtractedArticle {
        title: extract_title(document),
        content: extract_content(document),
        raw_date: extract_raw_date(document),
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn extract_title(document: &Html) -> Option<String> {
    document.select(&TITLE).next().map(element_text)
}

/// Paragraphs of the first `<article>`, minus those holding a `<strong>`.
fn extract_content(document: &Html) -> Option<String> {
    let article = document.select(&ARTICLE).next()?;
    Some(
        article
            .select(&PARAGRAPH)
            .filter(|p| p.select(&STRONG).next().is_none())
            .map(element_text)
            .collect(),
    )
}

fn extract_raw_date(document: &Html) -> Option<String> {
    document
        .select(&TIME)
        .next()
        .map(|time| element_text(time).replace(['\r', '\n'], ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{article_page, index_page};

    fn discoverer(keyword: &str) -> LinkDiscoverer {
        LinkDiscoverer::new(ARTICLE_BOX_SELECTOR, keyword).unwrap()
    }

    #[test]
    fn test_discover_resolves_relative_href() {
        let html = Html::parse_document(&index_page(&[("milei-speech", "Link")]));
        let base = Url::parse("http://example.com").unwrap();

        let urls = discoverer("milei").discover(Some(&html), &base);
        assert_eq!(urls, vec![base.join("milei-speech").unwrap().to_string()]);
        assert_eq!(urls[0], "http://example.com/milei-speech");
    }

    #[test]
    fn test_discover_uses_url_join_semantics() {
        let html = Html::parse_document(&index_page(&[
            ("milei-en-davos", "relative"),
            ("/informacion/discursos/milei-en-roma?page=2#top", "rooted"),
            ("https://other.example.org/milei", "absolute"),
        ]));
        let base = Url::parse("https://www.casarosada.gob.ar/informacion/discursos/").unwrap();

        let urls = discoverer("milei").discover(Some(&html), &base);
        assert_eq!(
            urls,
            vec![
                "https://www.casarosada.gob.ar/informacion/discursos/milei-en-davos",
                "https://www.casarosada.gob.ar/informacion/discursos/milei-en-roma?page=2#top",
                "https://other.example.org/milei",
            ]
        );
    }

    #[test]
    fn test_discover_filters_by_keyword_case_insensitively() {
        let html = Html::parse_document(&index_page(&[
            ("Discurso-MILEI-Cierre", "upper"),
            ("otro-discurso", "unrelated"),
        ]));
        let base = Url::parse("https://example.com/discursos/").unwrap();

        let urls = discoverer("Milei").discover(Some(&html), &base);
        assert_eq!(urls, vec!["https://example.com/discursos/Discurso-MILEI-Cierre"]);
    }

    #[test]
    fn test_discover_keeps_duplicates() {
        let html = Html::parse_document(&index_page(&[
            ("milei-a", "first"),
            ("milei-a", "again"),
        ]));
        let base = Url::parse("https://example.com/").unwrap();

        assert_eq!(discoverer("milei").discover(Some(&html), &base).len(), 2);
    }

    #[test]
    fn test_discover_ignores_anchors_outside_boxes() {
        let html = Html::parse_document("<html><body><a href='milei-speech'>Link</a></body></html>");
        let base = Url::parse("http://example.com").unwrap();

        assert!(discoverer("milei").discover(Some(&html), &base).is_empty());
    }

    #[test]
    fn test_discover_without_document_is_empty() {
        let base = Url::parse("http://example.com").unwrap();
        assert!(discoverer("milei").discover(None, &base).is_empty());
    }

    #[test]
    fn test_custom_selector() {
        let html = Html::parse_document(
            "<html><body><ul class='news'><li><a href='milei-1'>x</a></li></ul></body></html>",
        );
        let base = Url::parse("http://example.com/").unwrap();
        let d = LinkDiscoverer::new("ul.news li", "milei").unwrap();

        assert_eq!(d.discover(Some(&html), &base), vec!["http://example.com/milei-1"]);
    }

    #[test]
    fn test_invalid_selector_is_config_error() {
        assert!(matches!(
            LinkDiscoverer::new("div[[", "milei"),
            Err(ConfigError::Selector(_))
        ));
    }

    #[test]
    fn test_extract_title() {
        let html = Html::parse_document("<html><h2>Test Title</h2><h2>Second</h2></html>");
        assert_eq!(extract_article(&html).title.as_deref(), Some("Test Title"));
    }

    #[test]
    fn test_extract_content_skips_strong_paragraphs() {
        let html = Html::parse_document(
            "<html><article><p>Content</p><p><strong>Not this</strong></p></article></html>",
        );
        assert_eq!(extract_article(&html).content.as_deref(), Some("Content"));
    }

    #[test]
    fn test_extract_content_concatenates_without_separator() {
        let html = Html::parse_document(
            "<html><article><div><p>Uno.</p></div><p>Dos <em>y</em> tres.</p></article></html>",
        );
        assert_eq!(
            extract_article(&html).content.as_deref(),
            Some("Uno.Dos y tres.")
        );
    }

    #[test]
    fn test_extract_content_uses_first_article_only() {
        let html = Html::parse_document(
            "<html><article><p>A</p></article><article><p>B</p></article></html>",
        );
        assert_eq!(extract_article(&html).content.as_deref(), Some("A"));
    }

    #[test]
    fn test_extract_without_article_is_absent() {
        let html = Html::parse_document("<html><h2>T</h2><p>loose</p></html>");
        assert_eq!(extract_article(&html).content, None);
    }

    #[test]
    fn test_extract_empty_article_is_empty_not_absent() {
        let html = Html::parse_document("<html><article></article></html>");
        assert_eq!(extract_article(&html).content.as_deref(), Some(""));
    }

    #[test]
    fn test_extract_raw_date_strips_line_breaks() {
        let html = Html::parse_document(
            "<html><time>\r\nlunes 13 de febrero de 2025\n</time></html>",
        );
        assert_eq!(
            extract_article(&html).raw_date.as_deref(),
            Some("lunes 13 de febrero de 2025")
        );
    }

    #[test]
    fn test_fields_are_independent() {
        let html = Html::parse_document("<html><time>martes 4 de marzo de 2025</time></html>");
        let article = extract_article(&html);
        assert_eq!(article.title, None);
        assert_eq!(article.content, None);
        assert_eq!(
            article.raw_date.as_deref(),
            Some("martes 4 de marzo de 2025")
        );
    }

    #[test]
    fn test_extract_full_page() {
        let html = Html::parse_document(&article_page(
            "Palabras del Presidente",
            "lunes 13 de febrero de 2025",
            &["Buenas tardes.", "Muchas gracias."],
        ));
        let article = extract_article(&html);
        assert_eq!(article.title.as_deref(), Some("Palabras del Presidente"));
        assert_eq!(
            article.content.as_deref(),
            Some("Buenas tardes.Muchas gracias.")
        );
        assert_eq!(
            article.raw_date.as_deref(),
            Some("lunes 13 de febrero de 2025")
        );
    }
}
