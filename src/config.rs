//! Runtime configuration for a harvest run.
//!
//! Defaults follow the E-utilities usage policy: three requests per second
//! without an API key, bulk jobs confined to US Eastern nights and weekends.

use std::time::Duration;

use chrono_tz::Tz;

/// Default E-utilities endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Database searched and fetched from.
pub const DEFAULT_DATABASE: &str = "pubmed";

/// Maximum ids requested from the one-shot search call.
pub const DEFAULT_MAX_RESULTS: u32 = 100_000;

/// Records per efetch page.
pub const DEFAULT_PAGE_SIZE: usize = 200;

/// Provider request ceiling for clients without an API key.
pub const DEFAULT_MAX_REQUESTS_PER_SECOND: u32 = 3;

/// Attempts per page, including the first one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Per-attempt bound on a page fetch.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// TCP connect bound for every request.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed wait after a timed-out page attempt.
pub const DEFAULT_RETRY_COOLDOWN: Duration = Duration::from_secs(5);

/// Timezone the access window is evaluated in.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::US::Eastern;

/// Settings shared by every stage of a harvest run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// E-utilities endpoint root, without a trailing `esearch.fcgi`/`efetch.fcgi`.
    pub base_url: String,
    /// Entrez database name.
    pub database: String,
    /// `retmax` sent with the search call.
    pub max_results: u32,
    /// `retmax` sent with each fetch call.
    pub page_size: usize,
    /// Pacing ceiling between successive page fetches.
    pub max_requests_per_second: u32,
    /// Attempts per page before the run is aborted.
    pub max_attempts: u32,
    /// Bound on a single page attempt.
    pub request_timeout: Duration,
    /// Bound on connection establishment.
    pub connect_timeout: Duration,
    /// Wait between timed-out attempts.
    pub retry_cooldown: Duration,
    /// Timezone of the provider's access window.
    pub timezone: Tz,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            page_size: DEFAULT_PAGE_SIZE,
            max_requests_per_second: DEFAULT_MAX_REQUESTS_PER_SECOND,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            retry_cooldown: DEFAULT_RETRY_COOLDOWN,
            timezone: DEFAULT_TIMEZONE,
        }
    }
}

impl HarvestConfig {
    /// Points the run at a different E-utilities root (mock servers, mirrors).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Page size is clamped to at least one record.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[must_use]
    pub fn with_max_requests_per_second(mut self, max_requests_per_second: u32) -> Self {
        self.max_requests_per_second = max_requests_per_second;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    #[must_use]
    pub fn with_retry_cooldown(mut self, retry_cooldown: Duration) -> Self {
        self.retry_cooldown = retry_cooldown;
        self
    }

    #[must_use]
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Spacing enforced after every page fetch.
    ///
    /// A ceiling of zero disables pacing.
    #[must_use]
    pub fn pacing_interval(&self) -> Duration {
        if self.max_requests_per_second == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(1) / self.max_requests_per_second
        }
    }

    /// Full URL of an E-utility endpoint such as `esearch.fcgi`.
    #[must_use]
    pub fn endpoint(&self, utility: &str) -> String {
        format!("{}/{utility}", self.base_url.trim_end_matches('/'))
    }
}

/// Parses an IANA timezone name (`US/Eastern`, `America/New_York`, ...).
///
/// # Errors
///
/// Returns a human-readable message naming the rejected value.
pub fn parse_timezone(value: &str) -> Result<Tz, String> {
    value
        .trim()
        .parse::<Tz>()
        .map_err(|_| format!("unknown timezone '{value}'"))
}
