use chrono::{DateTime, Duration, FixedOffset, Utc};
use parking_lot::Mutex;

/// Source of the current zoned time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock projected into a fixed local offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Settable clock for tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualClock {
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<FixedOffset>) {
        *self.now.lock() = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock()
    }
}

/// Seconds since the Unix epoch with sub-second precision, as stored in entries.
pub fn epoch_seconds(at: &DateTime<FixedOffset>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}
