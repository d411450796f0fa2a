//! Error type for page normalization.

use thiserror::Error;

/// A page body is not well-formed XML; the run is aborted.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The XML reader rejected the document.
    #[error("malformed XML in page at offset {offset}: {source}")]
    Xml {
        /// `retstart` of the offending page.
        offset: usize,
        /// The underlying reader error.
        #[source]
        source: quick_xml::Error,
    },

    /// The document parsed but is not a single well-formed element tree.
    #[error("malformed XML in page at offset {offset}: {reason}")]
    Structure {
        /// `retstart` of the offending page.
        offset: usize,
        /// What is wrong with the document.
        reason: String,
    },
}

impl ParseError {
    /// Offset of the page that could not be parsed.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::Xml { offset, .. } | Self::Structure { offset, .. } => *offset,
        }
    }
}
