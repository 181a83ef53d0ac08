//! Clock abstraction and time-of-day matching.
use std::sync::Mutex;

use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;

use crate::TimeOfDay;

/// How far (in minutes) "now" may be from a target time and still count as a match.
pub const DEFAULT_TOLERANCE_MINUTES: u32 = 5;

/// Source of the current time in the bot's timezone
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Tz>;
}

/// Wall clock converted into a fixed named timezone
#[derive(Debug, Clone)]
pub struct SystemClock {
    timezone: Tz,
}

impl SystemClock {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.timezone)
    }
}

/// A clock that only moves when told to. Used to drive ticks deterministically.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Tz>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Tz>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Tz>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Tz> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Minutes elapsed since local midnight
pub fn minute_of_day(now: &DateTime<Tz>) -> u32 {
    now.hour() * 60 + now.minute()
}

/// Checks whether `now` lies within `tolerance_minutes` of `target`.
///
/// The distance is measured linearly on the minute-of-day axis and does not wrap
/// around midnight: 23:59 and 00:02 are 1437 minutes apart, not 3.
pub fn is_due(now: &DateTime<Tz>, target: TimeOfDay, tolerance_minutes: u32) -> bool {
    minute_of_day(now).abs_diff(target.minute_of_day()) <= tolerance_minutes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Asia::Yekaterinburg;

    fn at(hour: u32, minute: u32) -> DateTime<Tz> {
        Yekaterinburg
            .with_ymd_and_hms(2024, 3, 10, hour, minute, 30)
            .unwrap()
    }

    fn target(hour: u32, minute: u32) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    #[test]
    fn matches_inside_window_on_both_sides() {
        assert!(is_due(&at(9, 0), target(9, 0), 5));
        assert!(is_due(&at(8, 55), target(9, 0), 5));
        assert!(is_due(&at(9, 5), target(9, 0), 5));
    }

    #[test]
    fn rejects_outside_window() {
        assert!(!is_due(&at(8, 54), target(9, 0), 5));
        assert!(!is_due(&at(9, 6), target(9, 0), 5));
    }

    #[test]
    fn distance_is_symmetric() {
        for (h, m) in [(8, 57), (9, 3), (10, 0), (7, 59)] {
            let forward = is_due(&at(h, m), target(9, 0), 5);
            let now_as_target = target(h, m);
            let backward = is_due(&at(9, 0), now_as_target, 5);
            assert_eq!(forward, backward, "asymmetric at {}:{}", h, m);
        }
    }

    #[test]
    fn does_not_wrap_around_midnight() {
        assert!(!is_due(&at(23, 59), target(0, 2), 5));
        assert!(!is_due(&at(0, 2), target(23, 59), 5));
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(at(9, 0));
        clock.advance(Duration::minutes(3));
        assert_eq!(minute_of_day(&clock.now()), 9 * 60 + 3);
    }
}
