//! Batch retrieval of a stored result set.
//!
//! # Features
//!
//! - Strictly sequential paging by `retstart`, in offset order
//! - Fixed pacing after every page ([`Pacer`])
//! - Bounded attempts per page; only timeouts are retried ([`RetryPolicy`])
//! - Fail-fast: one unrecoverable page aborts the run ([`FetchError`])
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::HarvestConfig;
//! use harvester_core::eutils::{EutilsClient, SearchHandleResolver};
//! use harvester_core::fetch::BatchFetcher;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarvestConfig::default();
//! let client = EutilsClient::new(&config)?;
//! let handle = SearchHandleResolver::new(&client).resolve("zebrafish", 1000).await?;
//! let pages = BatchFetcher::new(&client, &config).fetch_all(&handle).await?;
//! println!("{} pages", pages.len());
//! # Ok(())
//! # }
//! ```

mod batch;
mod error;
mod pacer;
mod retry;

pub use batch::{BatchFetcher, RawPage, page_offsets};
pub use error::FetchError;
pub use pacer::Pacer;
pub use retry::{AbortReason, FailureKind, RetryDecision, RetryPolicy, classify_error};
