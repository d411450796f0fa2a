//! Error types for the E-utilities transport and search call.
//!
//! [`TransportError`] covers a single HTTP exchange. [`SearchError`] is what the
//! one-shot search step reports: either the exchange failed, or it succeeded but
//! the body was not the JSON the protocol promises.

use thiserror::Error;

/// Failure of one HTTP exchange with an E-utilities endpoint.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request did not complete within its time bound.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The endpoint that timed out.
        url: String,
    },

    /// The endpoint answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// The endpoint that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Connection, TLS, or body-read failure.
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The endpoint being requested.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint URL could not be built from the configured base.
    #[error("invalid endpoint URL: {url}")]
    InvalidUrl {
        /// The rejected URL string.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client construction failed: {reason}")]
    Client {
        /// What went wrong.
        reason: String,
    },
}

impl TransportError {
    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Whether this failure is the timeout class that page fetches retry.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Failure of the one-shot search call.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The search request itself failed. Never retried.
    #[error("search request failed: {0}")]
    Transport(#[from] TransportError),

    /// The response arrived but does not carry a usable result-set handle.
    #[error("unexpected search response: {reason}")]
    Protocol {
        /// What was missing or malformed.
        reason: String,
    },
}

impl SearchError {
    /// Creates a protocol error.
    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
        }
    }
}

// No `From<reqwest::Error>`: every variant needs the URL, so callers go through
// the helper constructors instead.
