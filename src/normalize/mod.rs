//! Normalization of fetched `PubmedArticleSet` pages into flat records.
//!
//! Each page is parsed into an element tree, then every `PubmedArticle` under
//! the root is mapped to one [`Record`]. Fields are looked up independently so
//! an absent element only empties its own column.
//!
//! # Example
//!
//! ```
//! use harvester_core::fetch::RawPage;
//! use harvester_core::normalize;
//!
//! let page = RawPage {
//!     offset: 0,
//!     body: "<PubmedArticleSet><PubmedArticle><MedlineCitation>\
//!            <PMID>42</PMID></MedlineCitation></PubmedArticle></PubmedArticleSet>"
//!         .to_string(),
//! };
//! let records = normalize(&[page]).unwrap();
//! assert_eq!(records[0].pmid, "42");
//! assert_eq!(records[0].title, "");
//! ```

mod error;
mod record;
mod xml;
mod year;

pub use error::ParseError;
pub use record::{AFFILIATION_SEPARATOR, AUTHOR_SEPARATOR, KEYWORD_SEPARATOR, Record, RecordRow};
pub use year::extract_year;

use tracing::{debug, info, instrument};

use crate::fetch::RawPage;
use crate::progress::{NoProgress, ProgressSink};

use xml::{Element, TreeError, parse_document};

const ARTICLE: &str = "PubmedArticle";

/// Normalizes every page in order without progress reporting.
///
/// # Errors
///
/// Returns [`ParseError`] for the first page that is not well-formed XML.
pub fn normalize(pages: &[RawPage]) -> Result<Vec<Record>, ParseError> {
    RecordNormalizer::new().normalize(pages)
}

/// Maps pages to records, reporting each parsed page to a [`ProgressSink`].
pub struct RecordNormalizer<'a> {
    progress: &'a dyn ProgressSink,
}

impl Default for RecordNormalizer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> RecordNormalizer<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            progress: &NoProgress,
        }
    }

    /// Routes `page_parsed` events to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// Records from all pages: page order, then article order within a page.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for the first malformed page; no records are
    /// returned in that case.
    #[instrument(skip(self, pages), fields(pages = pages.len()))]
    pub fn normalize(&self, pages: &[RawPage]) -> Result<Vec<Record>, ParseError> {
        let total = pages.len();
        let mut records = Vec::new();
        for (index, page) in pages.iter().enumerate() {
            let page_records = normalize_page(page)?;
            debug!(
                offset = page.offset,
                articles = page_records.len(),
                "page normalized"
            );
            records.extend(page_records);
            self.progress.page_parsed(index + 1, total);
        }
        info!(records = records.len(), "normalization finished");
        Ok(records)
    }
}

/// Records for one page, in article document order.
///
/// # Errors
///
/// Returns [`ParseError`] carrying the page offset if the body is not a
/// well-formed XML document.
pub fn normalize_page(page: &RawPage) -> Result<Vec<Record>, ParseError> {
    let root = parse_document(&page.body).map_err(|error| page_error(page.offset, error))?;
    Ok(root.descendants(ARTICLE).map(article_record).collect())
}

fn page_error(offset: usize, error: TreeError) -> ParseError {
    match error {
        TreeError::Xml(source) => ParseError::Xml { offset, source },
        TreeError::Structure(reason) => ParseError::Structure { offset, reason },
    }
}

fn article_record(article: &Element) -> Record {
    Record {
        pmid: first_text(article, "PMID"),
        title: first_text(article, "ArticleTitle"),
        abstract_text: abstract_text(article),
        authors: authors(article),
        affiliations: affiliations(article),
        year: extract_year(
            article.find_path("PubDate", "Year").map(Element::text).as_deref(),
            article
                .find_path("PubDate", "MedlineDate")
                .map(Element::text)
                .as_deref(),
        ),
        keywords: non_empty_texts(article.descendants("Keyword")),
        journal: article
            .find_path("Journal", "Title")
            .map(Element::text)
            .unwrap_or_default(),
        doi: doi(article),
    }
}

fn first_text(article: &Element, name: &str) -> String {
    article.find(name).map(Element::text).unwrap_or_default()
}

fn non_empty_texts<'e>(elements: impl Iterator<Item = &'e Element>) -> Vec<String> {
    elements
        .map(Element::text)
        .filter(|text| !text.trim().is_empty())
        .collect()
}

fn abstract_text(article: &Element) -> String {
    non_empty_texts(article.descendants("AbstractText")).join(" ")
}

// "ForeName LastName"; an author with no or an empty LastName (e.g. a CollectiveName) is skipped.
fn authors(article: &Element) -> Vec<String> {
    article
        .descendants("Author")
        .filter_map(|author| {
            let last = author
                .child("LastName")
                .map(Element::text)
                .filter(|last| !last.trim().is_empty())?;
            let fore = author.child("ForeName").map(Element::text).unwrap_or_default();
            Some(format!("{fore} {last}").trim().to_string())
        })
        .collect()
}

fn affiliations(article: &Element) -> Vec<String> {
    non_empty_texts(
        article
            .descendants("AffiliationInfo")
            .filter_map(|info| info.child("Affiliation")),
    )
}

fn doi(article: &Element) -> String {
    article
        .descendants("ArticleId")
        .find(|id| id.attribute("IdType") == Some("doi"))
        .map(Element::text)
        .unwrap_or_default()
}
