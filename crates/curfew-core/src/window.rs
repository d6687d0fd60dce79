//! Wall-clock time windows
//!
//! Policy hours are plain `HH:MM` values with no date attached. Every
//! evaluation re-anchors them to the calendar date of "now", so a window is
//! a daily pattern rather than an absolute interval.

use crate::{types::AppPolicy, Error, Result};
use chrono::{Duration, Local, NaiveDateTime, NaiveTime, Timelike};
use std::sync::Arc;
use tracing::{debug, warn};

/// Format accepted for policy and shutdown times
pub const CLOCK_FORMAT: &str = "%H:%M";

/// Source of "now" for policy evaluation, injectable for tests
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Local wall-clock time
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn system_clock() -> Clock {
    Arc::new(local_now)
}

/// Parse an `HH:MM` value. Empty strings are errors.
pub fn parse_clock(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, CLOCK_FORMAT)
        .map_err(|e| Error::Parse(format!("invalid time '{}': {}", value, e)))
}

/// Allowed hours, possibly crossing midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn parse(from: &str, to: &str) -> Result<Self> {
        Ok(Self::new(parse_clock(from)?, parse_clock(to)?))
    }

    pub fn from_policy(policy: &AppPolicy) -> Result<Self> {
        Self::parse(&policy.allowed_from, &policy.allowed_to)
    }

    /// True for windows such as 22:00 -> 06:00
    pub fn crosses_midnight(&self) -> bool {
        self.start > self.end
    }

    /// Check whether `now` falls inside the window
    ///
    /// Same-day windows are inclusive on both ends. Overnight windows block
    /// only the gap strictly between `end` and `start`.
    pub fn contains(&self, now: NaiveDateTime) -> bool {
        let date = now.date();
        let start = date.and_time(self.start);
        let end = date.and_time(self.end);

        if self.crosses_midnight() {
            !(now > end && now < start)
        } else {
            now >= start && now <= end
        }
    }
}

/// Decide whether a process governed by `policy` may run at `now`
///
/// Fails closed: an unparsable window means the process is not allowed.
pub fn is_allowed_to_run(policy: &AppPolicy, now: NaiveDateTime) -> bool {
    match TimeWindow::from_policy(policy) {
        Ok(window) => {
            let allowed = window.contains(now);
            debug!(
                policy = %policy.name,
                from = %window.start,
                to = %window.end,
                now = %now,
                allowed,
                "Evaluated time window"
            );
            allowed
        }
        Err(e) => {
            warn!(policy = %policy.name, error = %e, "Unparsable time window, treating as not allowed");
            false
        }
    }
}

/// Next moment `target` occurs at or after `now`
///
/// Anchors to today and rolls forward one day if that moment is already past.
pub fn next_occurrence(target: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let target = target.with_nanosecond(0).unwrap_or(target);
    let candidate = now.date().and_time(target);
    if candidate < now {
        candidate + Duration::hours(24)
    } else {
        candidate
    }
}
