//! The harvest run: access gate, search, fetch, normalize.
//!
//! [`Harvester::run`] is a single linear call sequence. The current instant
//! is passed in so the access decision is reproducible.

use std::path::Path;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::HarvestConfig;
use crate::eutils::{Eutils, SearchError, SearchHandle, SearchHandleResolver};
use crate::fetch::{BatchFetcher, FetchError};
use crate::normalize::{ParseError, Record, RecordNormalizer};
use crate::output::{OutputError, write_csv};
use crate::progress::{NoProgress, ProgressSink};
use crate::window::AccessWindow;

/// Any failure that aborts a harvest run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// How a run ended when nothing failed.
#[derive(Debug)]
pub enum HarvestOutcome {
    /// `now` fell outside the access window; no request was made.
    Denied {
        /// `now` in the window's timezone.
        local_time: DateTime<Tz>,
    },
    /// Every page was fetched and normalized.
    Completed {
        handle: SearchHandle,
        records: Vec<Record>,
    },
}

impl HarvestOutcome {
    /// Records of a completed run; empty when denied.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        match self {
            Self::Denied { .. } => &[],
            Self::Completed { records, .. } => records,
        }
    }

    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }
}

/// Drives one harvest over an [`Eutils`] transport.
pub struct Harvester<'a, E: Eutils + ?Sized> {
    config: &'a HarvestConfig,
    eutils: &'a E,
    window: AccessWindow,
    progress: &'a dyn ProgressSink,
}

impl<'a, E: Eutils + ?Sized> Harvester<'a, E> {
    #[must_use]
    pub fn new(config: &'a HarvestConfig, eutils: &'a E) -> Self {
        Self {
            config,
            eutils,
            window: AccessWindow::new(config.timezone),
            progress: &NoProgress,
        }
    }

    /// Routes fetch and parse progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// Runs the harvest for `term` as of `now`.
    ///
    /// Outside the access window this returns [`HarvestOutcome::Denied`]
    /// without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError`] when the search fails, a page cannot be
    /// fetched, or a page is not well-formed XML. No partial table is
    /// returned.
    #[instrument(skip(self, now), fields(timezone = %self.config.timezone))]
    pub async fn run(&self, term: &str, now: DateTime<Utc>) -> Result<HarvestOutcome, HarvestError> {
        if !self.window.is_allowed(now) {
            let local_time = self.window.local_time(now);
            warn!(%local_time, "outside the access window, not contacting the provider");
            return Ok(HarvestOutcome::Denied { local_time });
        }

        let handle = SearchHandleResolver::new(self.eutils)
            .resolve(term, self.config.max_results)
            .await?;

        let pages = BatchFetcher::new(self.eutils, self.config)
            .with_progress(self.progress)
            .fetch_all(&handle)
            .await?;

        let records = RecordNormalizer::new()
            .with_progress(self.progress)
            .normalize(&pages)?;

        info!(
            total_count = handle.total_count,
            records = records.len(),
            "harvest completed"
        );
        Ok(HarvestOutcome::Completed { handle, records })
    }

    /// [`run`](Self::run), then writes the table to `path` on completion.
    ///
    /// A denied or failed run leaves `path` untouched.
    ///
    /// # Errors
    ///
    /// As [`run`](Self::run), plus [`HarvestError::Output`] if the table
    /// cannot be written.
    pub async fn run_to_csv(
        &self,
        term: &str,
        now: DateTime<Utc>,
        path: &Path,
    ) -> Result<HarvestOutcome, HarvestError> {
        let outcome = self.run(term, now).await?;
        if let HarvestOutcome::Completed { records, .. } = &outcome {
            write_csv(path, records)?;
        }
        Ok(outcome)
    }
}
