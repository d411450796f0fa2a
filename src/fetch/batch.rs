//! Sequential, paced, retrying page fetcher.
//!
//! Pages are requested strictly in increasing offset order with at most one
//! request in flight. Each page runs a small state machine:
//!
//! ```text
//! Attempting(1) --timeout--> Attempting(2) --timeout--> Attempting(3) --timeout--> Exhausted
//!      |                          |                          |
//!      +--------- ok -------------+--------- ok -------------+--> Succeeded
//! ```
//!
//! Any non-timeout failure leaves the machine immediately. One failed page
//! aborts the run; a partial result set is never returned.

use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

use crate::config::HarvestConfig;
use crate::eutils::{EFETCH, Eutils, PageRequest, SearchHandle, TransportError};
use crate::progress::{NoProgress, ProgressSink};

use super::pacer::Pacer;
use super::retry::{AbortReason, RetryDecision, RetryPolicy, classify_error};
use super::FetchError;

/// Raw XML body of one fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    /// `retstart` the page was requested with.
    pub offset: usize,
    /// Response body as received.
    pub body: String,
}

/// Offsets `0, page_size, 2 * page_size, ...` strictly below `total_count`.
pub fn page_offsets(total_count: usize, page_size: usize) -> impl Iterator<Item = usize> {
    (0..total_count).step_by(page_size.max(1))
}

/// Per-page fetch state.
#[derive(Debug)]
enum AttemptState {
    Attempting(u32),
    Succeeded(String),
    Exhausted { attempts: u32, last: TransportError },
}

/// Pages through a stored result set.
pub struct BatchFetcher<'a, E: Eutils + ?Sized> {
    eutils: &'a E,
    policy: RetryPolicy,
    pacer: Pacer,
    page_size: usize,
    request_timeout: Duration,
    efetch_url: String,
    progress: &'a dyn ProgressSink,
}

impl<'a, E: Eutils + ?Sized> BatchFetcher<'a, E> {
    /// Creates a fetcher using the page size, retry, timeout, and pacing
    /// settings in `config`.
    #[must_use]
    pub fn new(eutils: &'a E, config: &HarvestConfig) -> Self {
        Self {
            eutils,
            policy: RetryPolicy::new(config.max_attempts, config.retry_cooldown),
            pacer: Pacer::per_second(config.max_requests_per_second),
            page_size: config.page_size.max(1),
            request_timeout: config.request_timeout,
            efetch_url: config.endpoint(EFETCH),
            progress: &NoProgress,
        }
    }

    /// Routes progress events to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// The pacing state of this run.
    #[must_use]
    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    /// Fetches every page of `handle`'s result set, in offset order.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] for the first page that fails with a
    /// non-timeout error or exhausts its attempts. Later pages are not
    /// requested.
    #[instrument(skip(self, handle), fields(total_count = handle.total_count, page_size = self.page_size))]
    pub async fn fetch_all(&mut self, handle: &SearchHandle) -> Result<Vec<RawPage>, FetchError> {
        let offsets: Vec<usize> = page_offsets(handle.total_count, self.page_size).collect();
        let total = offsets.len();
        let mut pages = Vec::with_capacity(total);

        for (index, offset) in offsets.into_iter().enumerate() {
            debug!(batch = index + 1, total, offset, "downloading batch");
            let request = PageRequest {
                handle,
                offset,
                page_size: self.page_size,
            };
            let page = self.fetch_page(&request).await?;
            pages.push(page);
            self.progress.page_fetched(index + 1, total);
            self.pacer.pace().await;
        }

        info!(pages = pages.len(), "all batches downloaded");
        Ok(pages)
    }

    /// Runs one page through the attempt state machine.
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<RawPage, FetchError> {
        let offset = request.offset;
        let mut state = AttemptState::Attempting(1);

        loop {
            state = match state {
                AttemptState::Attempting(attempt) => match self.attempt(request).await {
                    Ok(body) => AttemptState::Succeeded(body),
                    Err(error) => match self.policy.decide(classify_error(&error), attempt) {
                        RetryDecision::Retry {
                            delay,
                            attempt: next_attempt,
                        } => {
                            warn!(
                                offset,
                                attempt,
                                max_attempts = self.policy.max_attempts(),
                                delay_ms = delay.as_millis(),
                                error = %error,
                                "page fetch timed out, retrying"
                            );
                            self.progress
                                .retrying(offset, attempt, self.policy.max_attempts());
                            sleep(delay).await;
                            AttemptState::Attempting(next_attempt)
                        }
                        RetryDecision::Abort {
                            reason: AbortReason::Exhausted,
                        } => AttemptState::Exhausted {
                            attempts: attempt,
                            last: error,
                        },
                        RetryDecision::Abort {
                            reason: AbortReason::NotRetryable,
                        } => {
                            debug!(offset, error = %error, "not retrying page fetch");
                            return Err(FetchError::Transport {
                                offset,
                                source: error,
                            });
                        }
                    },
                },
                AttemptState::Succeeded(body) => return Ok(RawPage { offset, body }),
                AttemptState::Exhausted { attempts, last } => {
                    return Err(FetchError::Exhausted {
                        offset,
                        attempts,
                        last,
                    });
                }
            };
        }
    }

    /// One bounded transport call. A hung transport is abandoned at the bound.
    async fn attempt(&self, request: &PageRequest<'_>) -> Result<String, TransportError> {
        match timeout(self.request_timeout, self.eutils.efetch(request)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(TransportError::timeout(self.efetch_url.as_str())),
        }
    }
}
