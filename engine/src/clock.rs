//! Time source abstraction
//!
//! Cache TTLs, retry guards, purge cutoffs, and time-of-day rules all read
//! the current time through [`Clock`] so they can run under a simulated
//! clock in tests.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use std::sync::Mutex;

/// Injectable time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar day of `now()`.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Hour of day (0-23) of `now()`.
    fn hour(&self) -> u32 {
        self.now().hour()
    }
}

/// Wall-clock time source used outside of tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for simulated-time tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
