//! Clock port.
//!
//! Lifecycle rules depend on elapsed whole days; injecting the clock keeps
//! them testable.

use std::sync::Mutex;

use crate::domain::foundation::Timestamp;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Manually controlled time for tests and simulations.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<Timestamp>,
}

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: Timestamp) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance_days(&self, days: i64) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = now.add_days(days);
    }

    pub fn advance_hours(&self, hours: i64) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = now.add_hours(hours);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let start = Timestamp::from_unix_secs(1_700_000_000);
        let clock = FixedClock::new(start);
        clock.advance_days(3);
        clock.advance_hours(5);
        assert_eq!(clock.now(), start.add_days(3).add_hours(5));
        assert_eq!(clock.now().days_since(&start), 3);
    }
}
