//! Search step: turn a query term into a server-side result-set handle.

use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::{Eutils, SearchError};

/// Server reference to a stored, already-executed search.
///
/// Fetch calls carry `web_env` + `query_key` instead of the query text, so
/// pagination stays stable across pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHandle {
    /// History server session token (`WebEnv`).
    pub web_env: String,
    /// Query slot within the session (`query_key`).
    pub query_key: String,
    /// Number of ids the search returned; capped by the search `retmax`.
    pub total_count: usize,
    /// Server-side match count, when reported. May exceed `total_count`.
    pub reported_count: Option<u64>,
}

impl SearchHandle {
    /// Whether the requested `retmax` cut the stored result set short.
    #[must_use]
    pub fn is_capped(&self) -> bool {
        self.reported_count
            .is_some_and(|reported| reported > u64::try_from(self.total_count).unwrap_or(u64::MAX))
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    esearchresult: Option<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    count: Option<String>,
    idlist: Option<Vec<String>>,
    webenv: Option<String>,
    querykey: Option<String>,
    #[serde(rename = "ERROR")]
    error: Option<String>,
}

/// Parses an `esearch` JSON body into a [`SearchHandle`].
///
/// # Errors
///
/// Returns [`SearchError::Protocol`] when the body is not JSON, carries a
/// server-side `ERROR`, or lacks `idlist`, `webenv`, or `querykey`.
pub fn parse_search_response(body: &str) -> Result<SearchHandle, SearchError> {
    let envelope: SearchEnvelope = serde_json::from_str(body)
        .map_err(|e| SearchError::protocol(format!("body is not valid JSON: {e}")))?;
    let result = envelope
        .esearchresult
        .ok_or_else(|| SearchError::protocol("missing esearchresult"))?;

    if let Some(message) = result.error.filter(|m| !m.trim().is_empty()) {
        return Err(SearchError::protocol(format!("server reported: {message}")));
    }

    let ids = result
        .idlist
        .ok_or_else(|| SearchError::protocol("missing esearchresult.idlist"))?;
    let web_env = result
        .webenv
        .ok_or_else(|| SearchError::protocol("missing esearchresult.webenv"))?;
    let query_key = result
        .querykey
        .ok_or_else(|| SearchError::protocol("missing esearchresult.querykey"))?;

    Ok(SearchHandle {
        web_env,
        query_key,
        total_count: ids.len(),
        reported_count: result.count.and_then(|c| c.trim().parse().ok()),
    })
}

/// Issues the one-shot search call. Not paced and not retried.
pub struct SearchHandleResolver<'a, E: Eutils + ?Sized> {
    eutils: &'a E,
}

impl<'a, E: Eutils + ?Sized> SearchHandleResolver<'a, E> {
    #[must_use]
    pub fn new(eutils: &'a E) -> Self {
        Self { eutils }
    }

    /// Searches for `term`, storing up to `max_results` ids server-side.
    ///
    /// # Errors
    ///
    /// [`SearchError::Transport`] when the call fails, [`SearchError::Protocol`]
    /// when the response has no usable handle.
    #[instrument(skip(self))]
    pub async fn resolve(&self, term: &str, max_results: u32) -> Result<SearchHandle, SearchError> {
        let body = self.eutils.esearch(term, max_results).await?;
        let handle = parse_search_response(&body)?;

        if handle.is_capped() {
            warn!(
                total_count = handle.total_count,
                reported_count = handle.reported_count,
                max_results,
                "search matched more records than will be fetched"
            );
        }
        info!(
            total_count = handle.total_count,
            query_key = %handle.query_key,
            "search stored on history server"
        );
        Ok(handle)
    }
}
