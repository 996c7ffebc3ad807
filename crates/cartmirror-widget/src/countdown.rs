//! Daily "offer ends in" countdown with a persisted start.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};

use crate::error::WidgetError;
use crate::storage::{LocalStore, COUNTDOWN_START_KEY};

/// A countdown that runs until the next `reset_hour_utc:00` UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    reset_hour_utc: u32,
}

impl Countdown {
    /// `reset_hour_utc` values above 23 wrap.
    #[must_use]
    pub fn new(reset_hour_utc: u32) -> Self {
        Self {
            reset_hour_utc: reset_hour_utc % 24,
        }
    }

    fn reset_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.reset_hour_utc, 0, 0).unwrap_or(NaiveTime::MIN)
    }

    /// The most recent reset at or before `now`.
    #[must_use]
    pub fn last_reset(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = Utc.from_utc_datetime(&now.date_naive().and_time(self.reset_time()));
        if today <= now {
            today
        } else {
            today - Duration::days(1)
        }
    }

    /// The first reset strictly after `now`.
    #[must_use]
    pub fn next_reset(self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.last_reset(now) + Duration::days(1)
    }

    /// Time left until the next reset. Never negative.
    #[must_use]
    pub fn remaining(self, now: DateTime<Utc>) -> Duration {
        (self.next_reset(now) - now).max(Duration::zero())
    }

    /// Returns the period start recorded in `store`, replacing it with `now`
    /// when it is missing or predates the last reset.
    ///
    /// # Errors
    ///
    /// Returns a [`WidgetError`] when the store cannot be written.
    pub fn ensure_started(
        self,
        store: &LocalStore,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, WidgetError> {
        let stored = match store.get::<String>(COUNTDOWN_START_KEY) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "countdown start unreadable, restarting");
                None
            }
        };
        let parsed = stored.as_deref().and_then(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| tracing::warn!(value = raw, error = %e, "invalid countdown start"))
                .ok()
        });

        match parsed {
            Some(start) if start >= self.last_reset(now) => Ok(start),
            _ => {
                store.set(COUNTDOWN_START_KEY, &now.to_rfc3339())?;
                tracing::debug!(start = %now, "countdown period started");
                Ok(now)
            }
        }
    }
}

/// Formats a duration as `HH:MM:SS`. Negative durations show as zero.
#[must_use]
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}
