use chrono::{DateTime, NaiveTime, Utc};
use eisenhower_rs_core::Clock;
use parking_lot::Mutex;

/// Clock that only moves when told to. Local time is read in UTC.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }

    fn local_time(&self) -> NaiveTime {
        self.now().time()
    }
}
