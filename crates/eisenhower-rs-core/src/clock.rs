//! Wall-clock access, swappable in tests.

use chrono::{DateTime, Local, NaiveTime, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Local wall-clock time, used for generated fallback labels.
    fn local_time(&self) -> NaiveTime {
        self.now().with_timezone(&Local).time()
    }
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
