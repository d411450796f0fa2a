//! Retry policy for page fetches.
//!
//! A failed attempt is classified into a [`FailureKind`], then the pure
//! [`RetryPolicy::decide`] turns `(kind, attempt)` into a [`RetryDecision`].
//! Only timeouts are retried, after a fixed cooldown; everything else aborts
//! the page on the spot.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use harvester_core::fetch::{FailureKind, RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::new(3, Duration::from_secs(5));
//! assert_eq!(
//!     policy.decide(FailureKind::Timeout, 1),
//!     RetryDecision::Retry { delay: Duration::from_secs(5), attempt: 2 }
//! );
//! assert!(matches!(policy.decide(FailureKind::Timeout, 3), RetryDecision::Abort { .. }));
//! ```

use std::time::Duration;

use tracing::debug;

use crate::config::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_COOLDOWN};
use crate::eutils::TransportError;

/// Classification of a failed page attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The attempt ran out of time. Retryable.
    Timeout,

    /// Anything else: non-2xx status, connection or body failure.
    Fatal,
}

/// Why a page is not retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The failure kind is never retried.
    NotRetryable,
    /// All attempts were used.
    Exhausted,
}

/// Decision after a failed page attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait `delay`, then make attempt number `attempt` (1-indexed).
    Retry {
        /// Cooldown before the next attempt.
        delay: Duration,
        /// Number of the next attempt.
        attempt: u32,
    },

    /// Give up on the page.
    Abort {
        /// Why no further attempt is made.
        reason: AbortReason,
    },
}

/// Bounded fixed-cooldown retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Fixed wait between a timed-out attempt and the next one.
    cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            cooldown: DEFAULT_RETRY_COOLDOWN,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least one.
    #[must_use]
    pub fn new(max_attempts: u32, cooldown: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            cooldown,
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Decides what follows failed attempt number `attempt` (1-indexed).
    #[must_use]
    pub fn decide(&self, kind: FailureKind, attempt: u32) -> RetryDecision {
        if kind == FailureKind::Fatal {
            return RetryDecision::Abort {
                reason: AbortReason::NotRetryable,
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::Abort {
                reason: AbortReason::Exhausted,
            };
        }

        RetryDecision::Retry {
            delay: self.cooldown,
            attempt: attempt + 1,
        }
    }
}

/// Classifies a transport failure for [`RetryPolicy::decide`].
#[must_use]
pub fn classify_error(error: &TransportError) -> FailureKind {
    if error.is_timeout() {
        FailureKind::Timeout
    } else {
        FailureKind::Fatal
    }
}
