use chrono::{DateTime, Utc};
use std::cell::Cell;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Cell<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Cell::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Cache-bust value for profile image URLs. Strictly increasing even when the
/// clock stalls or goes backwards, so every stamp yields a new URL.
#[derive(Debug)]
pub struct CacheBust {
    last: Cell<i64>,
}

impl CacheBust {
    pub fn new(clock: &dyn Clock) -> Self {
        Self {
            last: Cell::new(clock.now().timestamp_millis()),
        }
    }

    pub fn current(&self) -> i64 {
        self.last.get()
    }

    pub fn stamp(&self, clock: &dyn Clock) -> i64 {
        let next = clock.now().timestamp_millis().max(self.last.get() + 1);
        self.last.set(next);
        next
    }
}
