//! Provider access window.
//!
//! NCBI asks bulk E-utilities jobs to run on weekends or between 21:00 and
//! 05:00 US Eastern time. [`AccessWindow`] is a pure predicate over an instant:
//! it keeps no memory of earlier checks, so a denial is final for the run and
//! nothing is queued for later.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use harvester_core::window::AccessWindow;
//!
//! let window = AccessWindow::new(chrono_tz::US::Eastern);
//! // Saturday afternoon in New York.
//! let now = Utc.with_ymd_and_hms(2024, 6, 15, 18, 0, 0).unwrap();
//! assert!(window.is_allowed(now));
//! ```

use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use tracing::debug;

/// Hour the nightly window opens (inclusive).
const NIGHT_START_HOUR: u32 = 21;

/// Hour the nightly window closes; exactly `05:00:00` is still inside.
const NIGHT_END_HOUR: u32 = 5;

/// Weekend/night access predicate evaluated in a fixed timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessWindow {
    timezone: Tz,
}

impl Default for AccessWindow {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_TIMEZONE)
    }
}

impl AccessWindow {
    #[must_use]
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Timezone the window is evaluated in.
    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// `now` converted to the window's timezone.
    #[must_use]
    pub fn local_time(&self, now: DateTime<Utc>) -> DateTime<Tz> {
        now.with_timezone(&self.timezone)
    }

    /// Whether bulk retrieval may start at `now`.
    ///
    /// Saturday and Sunday are always open. On weekdays the local time must be
    /// at or after 21:00:00 or at or before 05:00:00.
    #[must_use]
    pub fn is_allowed(&self, now: DateTime<Utc>) -> bool {
        let local = self.local_time(now);
        let allowed = is_weekend(local.weekday()) || is_night(local.time());
        debug!(
            local = %local,
            weekday = %local.weekday(),
            allowed,
            "access window evaluated"
        );
        allowed
    }
}

fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

fn is_night(time: NaiveTime) -> bool {
    let hour = time.hour();
    let on_the_hour = time.minute() == 0 && time.second() == 0 && time.nanosecond() == 0;
    hour >= NIGHT_START_HOUR || hour < NIGHT_END_HOUR || (hour == NIGHT_END_HOUR && on_the_hour)
}
