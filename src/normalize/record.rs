//! The normalized output record.

use serde::Serialize;

/// Separator between authors in the flat `Authors` column.
pub const AUTHOR_SEPARATOR: &str = ", ";

/// Separator between affiliations in the flat `Affiliation` column.
pub const AFFILIATION_SEPARATOR: &str = "; ";

/// Separator between keywords in the flat `Keywords` column.
pub const KEYWORD_SEPARATOR: &str = ", ";

/// One article, normalized to a fixed schema.
///
/// Missing leaf fields are empty strings and missing lists are empty, never
/// absent, so every record has the same width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub pmid: String,
    pub title: String,
    /// `AbstractText` segments joined with a single space.
    pub abstract_text: String,
    /// `"Firstname Lastname"` per author with a last name, in document order.
    pub authors: Vec<String>,
    pub affiliations: Vec<String>,
    /// Four-digit year, or empty.
    pub year: String,
    pub keywords: Vec<String>,
    pub journal: String,
    pub doi: String,
}

/// A [`Record`] flattened into output columns.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RecordRow<'a> {
    #[serde(rename = "PMID")]
    pub pmid: &'a str,
    #[serde(rename = "Title")]
    pub title: &'a str,
    #[serde(rename = "Abstract")]
    pub abstract_text: &'a str,
    #[serde(rename = "Authors")]
    pub authors: String,
    #[serde(rename = "Affiliation")]
    pub affiliations: String,
    #[serde(rename = "Year")]
    pub year: &'a str,
    #[serde(rename = "Keywords")]
    pub keywords: String,
    #[serde(rename = "Journal")]
    pub journal: &'a str,
    #[serde(rename = "DOI")]
    pub doi: &'a str,
}

impl Record {
    /// Joins the list fields into their flat column form.
    #[must_use]
    pub fn to_row(&self) -> RecordRow<'_> {
        RecordRow {
            pmid: &self.pmid,
            title: &self.title,
            abstract_text: &self.abstract_text,
            authors: self.authors.join(AUTHOR_SEPARATOR),
            affiliations: self.affiliations.join(AFFILIATION_SEPARATOR),
            year: &self.year,
            keywords: self.keywords.join(KEYWORD_SEPARATOR),
            journal: &self.journal,
            doi: &self.doi,
        }
    }
}
