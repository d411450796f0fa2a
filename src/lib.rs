//! Harvester Core Library
//!
//! This library provides the batch retrieval engine behind the
//! `pubmed-harvester` tool, which pulls PubMed records through the NCBI
//! E-utilities search/fetch protocol and flattens them into a fixed-width table.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Run settings and provider-policy defaults
//! - [`window`] - Provider access window (weekends and nights, provider local time)
//! - [`eutils`] - E-utilities transport and the search-handle resolver
//! - [`fetch`] - Paced, retrying page fetcher over a result-set handle
//! - [`normalize`] - `PubmedArticle` XML to [`Record`] normalization
//! - [`output`] - CSV sink for the final record table
//! - [`progress`] - Progress events and the terminal renderer
//! - [`pipeline`] - The gate → search → fetch → normalize run

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod eutils;
pub mod fetch;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod window;

mod user_agent;

// Re-export commonly used types
pub use config::HarvestConfig;
pub use eutils::{Eutils, EutilsClient, SearchError, SearchHandle, TransportError};
pub use fetch::{BatchFetcher, FetchError, RawPage, RetryDecision, RetryPolicy};
pub use normalize::{ParseError, Record, RecordNormalizer, normalize};
pub use output::{OutputError, write_csv};
pub use pipeline::{HarvestError, HarvestOutcome, Harvester};
pub use progress::{NoProgress, ProgressSink, TerminalProgress};
pub use window::AccessWindow;
