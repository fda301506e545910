use std::sync::Mutex;

use chrono::{DateTime, Local, NaiveDate, Utc};

/// The kiosk's current calendar date, used as the service date.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Hands out creation timestamps that never go backwards, even if the wall
/// clock is adjusted between two adds.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> DateTime<Utc> {
        let now = Utc::now();
        // Poisoning never leaves a partially written timestamp behind.
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let stamp = match *last {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        *last = Some(stamp);
        stamp
    }

    /// Seed the clock with the newest timestamp already on disk.
    pub fn observe(&self, seen: DateTime<Utc>) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if last.map_or(true, |prev| seen > prev) {
            *last = Some(seen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_monotonic_clock_never_goes_back() {
        let clock = MonotonicClock::new();
        let future = Utc::now() + Duration::hours(1);
        clock.observe(future);

        assert_eq!(clock.now(), future);
        assert!(clock.now() >= future);
    }

    #[test]
    fn test_successive_stamps_non_decreasing() {
        let clock = MonotonicClock::new();
        let stamps: Vec<_> = (0..100).map(|_| clock.now()).collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }
}
