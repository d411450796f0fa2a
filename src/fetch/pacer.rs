//! Request pacing for the page fetch loop.
//!
//! The provider caps clients at a few requests per second. Because the fetch
//! loop is strictly sequential, a fixed wait after every page is enough to stay
//! under the cap: no semaphore or shared limiter is needed. The [`Pacer`] is
//! owned by one fetcher for one run.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use harvester_core::fetch::Pacer;
//!
//! # async fn example() {
//! let mut pacer = Pacer::new(Duration::from_millis(334));
//! pacer.pace().await;
//! assert_eq!(pacer.total_paced(), Duration::from_millis(334));
//! # }
//! ```

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, instrument, trace};

/// Fixed post-request spacing owned by a single fetch run.
#[derive(Debug, Clone)]
pub struct Pacer {
    /// Wait applied after every page.
    interval: Duration,

    /// Time spent waiting so far in this run.
    total_paced: Duration,

    /// Number of waits applied.
    waits: u32,
}

impl Pacer {
    /// Creates a pacer that waits `interval` after each request.
    #[must_use]
    #[instrument(skip_all, fields(interval_ms = interval.as_millis()))]
    pub fn new(interval: Duration) -> Self {
        debug!("creating request pacer");
        Self {
            interval,
            total_paced: Duration::ZERO,
            waits: 0,
        }
    }

    /// Pacer for `max_requests_per_second`; zero disables pacing.
    #[must_use]
    pub fn per_second(max_requests_per_second: u32) -> Self {
        if max_requests_per_second == 0 {
            Self::disabled()
        } else {
            Self::new(Duration::from_secs(1) / max_requests_per_second)
        }
    }

    /// A pacer that never waits.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Returns whether pacing is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.interval.is_zero()
    }

    /// Wait applied after each request.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Total time waited so far.
    #[must_use]
    pub fn total_paced(&self) -> Duration {
        self.total_paced
    }

    /// Number of waits applied so far.
    #[must_use]
    pub fn waits(&self) -> u32 {
        self.waits
    }

    /// Suspends for the pacing interval, regardless of how long the request
    /// before it took.
    pub async fn pace(&mut self) {
        if self.is_disabled() {
            return;
        }
        trace!(interval_ms = self.interval.as_millis(), "pacing before next request");
        sleep(self.interval).await;
        self.total_paced += self.interval;
        self.waits += 1;
    }
}
