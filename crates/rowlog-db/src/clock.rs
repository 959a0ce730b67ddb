//! Per-process monotonic timestamps for `created_on`.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, SubsecRound, Utc};

/// Hands out strictly increasing UTC timestamps at microsecond precision.
///
/// Two writes in the same microsecond, or a wall clock that steps backwards,
/// still get distinct ascending `created_on` values.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let mut now = Utc::now().trunc_subsecs(6);
        if let Some(prev) = *last {
            if now <= prev {
                now = prev + Duration::microseconds(1);
            }
        }
        *last = Some(now);
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictly_increasing() {
        let clock = MonotonicClock::new();
        let mut prev = clock.now();
        for _ in 0..1_000 {
            let next = clock.now();
            assert!(next > prev, "{next} should be after {prev}");
            prev = next;
        }
    }

    #[test]
    fn microsecond_precision() {
        let clock = MonotonicClock::new();
        let now = clock.now();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000, 0);
    }
}
