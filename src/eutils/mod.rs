//! NCBI E-utilities transport.
//!
//! The engine talks to the provider only through the [`Eutils`] trait: one
//! `esearch` call that stores the query server-side (`usehistory=y`), then
//! `efetch` calls that page through the stored result set by handle. The
//! production implementation is [`EutilsClient`]; tests substitute fakes.
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::HarvestConfig;
//! use harvester_core::eutils::{EutilsClient, SearchHandleResolver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarvestConfig::default();
//! let client = EutilsClient::new(&config)?;
//! let handle = SearchHandleResolver::new(&client)
//!     .resolve("crispr[Title]", config.max_results)
//!     .await?;
//! println!("{} ids stored under {}", handle.total_count, handle.web_env);
//! # Ok(())
//! # }
//! ```

mod error;
mod http_client;
mod search;

pub use error::{SearchError, TransportError};
pub use search::{SearchHandle, SearchHandleResolver, parse_search_response};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::config::HarvestConfig;

use http_client::build_eutils_http_client;

/// Search endpoint name.
pub const ESEARCH: &str = "esearch.fcgi";

/// Fetch endpoint name.
pub const EFETCH: &str = "efetch.fcgi";

/// One page of a stored result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest<'a> {
    /// Result-set handle from the search step.
    pub handle: &'a SearchHandle,
    /// Zero-based index of the first record (`retstart`).
    pub offset: usize,
    /// Records per page (`retmax`).
    pub page_size: usize,
}

/// Transport seam between the harvest engine and the provider.
#[async_trait]
pub trait Eutils: Send + Sync {
    /// Runs a search with history enabled and returns the raw JSON body.
    async fn esearch(&self, term: &str, max_results: u32) -> Result<String, TransportError>;

    /// Fetches one page of the stored result set as raw XML.
    async fn efetch(&self, request: &PageRequest<'_>) -> Result<String, TransportError>;
}

/// [`Eutils`] over HTTP.
pub struct EutilsClient {
    client: Client,
    database: String,
    esearch_url: String,
    efetch_url: String,
    request_timeout: Duration,
}

impl EutilsClient {
    /// Creates a client for the endpoints and timeouts in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &HarvestConfig) -> Result<Self, TransportError> {
        let esearch_url = config.endpoint(ESEARCH);
        let efetch_url = config.endpoint(EFETCH);
        for endpoint in [&esearch_url, &efetch_url] {
            Url::parse(endpoint).map_err(|_| TransportError::invalid_url(endpoint.as_str()))?;
        }

        Ok(Self {
            client: build_eutils_http_client(config.connect_timeout, config.request_timeout)?,
            database: config.database.clone(),
            esearch_url,
            efetch_url,
            request_timeout: config.request_timeout,
        })
    }

    async fn get_text(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, TransportError> {
        let url = Url::parse_with_params(endpoint, params)
            .map_err(|_| TransportError::invalid_url(endpoint))?;
        debug!(%url, "sending E-utilities request");

        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::http_status(endpoint, status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(endpoint, e))
    }
}

impl std::fmt::Debug for EutilsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EutilsClient")
            .field("database", &self.database)
            .field("esearch_url", &self.esearch_url)
            .field("efetch_url", &self.efetch_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Eutils for EutilsClient {
    #[instrument(skip(self), fields(db = %self.database))]
    async fn esearch(&self, term: &str, max_results: u32) -> Result<String, TransportError> {
        let retmax = max_results.to_string();
        self.get_text(
            &self.esearch_url,
            &[
                ("db", self.database.as_str()),
                ("term", term),
                ("retmax", retmax.as_str()),
                ("retmode", "json"),
                ("usehistory", "y"),
            ],
        )
        .await
    }

    #[instrument(skip(self, request), fields(offset = request.offset))]
    async fn efetch(&self, request: &PageRequest<'_>) -> Result<String, TransportError> {
        let retstart = request.offset.to_string();
        let retmax = request.page_size.to_string();
        self.get_text(
            &self.efetch_url,
            &[
                ("db", self.database.as_str()),
                ("query_key", request.handle.query_key.as_str()),
                ("WebEnv", request.handle.web_env.as_str()),
                ("retstart", retstart.as_str()),
                ("retmax", retmax.as_str()),
                ("retmode", "xml"),
            ],
        )
        .await
    }
}
