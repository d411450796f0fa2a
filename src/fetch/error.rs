//! Error types for the batch fetch loop.

use thiserror::Error;

use crate::eutils::TransportError;

/// A page could not be fetched; the whole run is aborted.
///
/// Both variants carry the page offset so the failure is attributable.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-timeout transport failure. Not retried.
    #[error("fetching page at offset {offset} failed: {source}")]
    Transport {
        /// `retstart` of the failed page.
        offset: usize,
        /// The failure that ended the page.
        #[source]
        source: TransportError,
    },

    /// Every attempt timed out.
    #[error("fetching page at offset {offset} failed after {attempts} attempts: {last}")]
    Exhausted {
        /// `retstart` of the failed page.
        offset: usize,
        /// Attempts made, including the first.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        last: TransportError,
    },
}

impl FetchError {
    /// Offset of the page that aborted the run.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::Transport { offset, .. } | Self::Exhausted { offset, .. } => *offset,
        }
    }
}
