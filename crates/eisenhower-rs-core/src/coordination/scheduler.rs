//! Debounced re-scans and throttled badge refreshes.

use eisenhower_rs_config::TimingConfig;
use log::debug;
use std::time::Duration;
use tokio::time::Instant;

/// Where the page agent is in its scan cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    /// A full re-scan runs once the deadline passes.
    ScanScheduled(Instant),
    Scanning,
    /// Mutation watching stopped for good.
    Detached,
}

/// Owns the scan state machine.
///
/// Every mutation batch pushes the scan deadline out by the debounce window.
/// Badge refreshes are throttled by a cooldown that is independent of the
/// debounce.
#[derive(Debug, Clone)]
pub struct ScanScheduler {
    state: ScanState,
    debounce: Duration,
    badge_cooldown: Duration,
    last_badge_refresh: Option<Instant>,
    watching_from: Option<Instant>,
}

impl ScanScheduler {
    pub fn new(debounce: Duration, badge_cooldown: Duration) -> Self {
        Self {
            state: ScanState::Idle,
            debounce,
            badge_cooldown,
            last_badge_refresh: None,
            watching_from: None,
        }
    }

    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self::new(timing.debounce(), timing.badge_cooldown())
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Ignore mutations observed before `instant`.
    pub fn watch_from(&mut self, instant: Instant) {
        self.watching_from = Some(instant);
    }

    /// Schedule a scan at a fixed time, e.g. the initial one after load.
    pub fn schedule_at(&mut self, deadline: Instant) {
        if self.state != ScanState::Detached {
            self.state = ScanState::ScanScheduled(deadline);
        }
    }

    /// Record a mutation batch; returns whether a scan is now pending.
    pub fn on_mutation(&mut self, now: Instant) -> bool {
        if self.state == ScanState::Detached {
            return false;
        }
        if self.watching_from.is_some_and(|start| now < start) {
            debug!("mutation ignored before the watcher started");
            return false;
        }
        self.state = ScanState::ScanScheduled(now + self.debounce);
        true
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            ScanState::ScanScheduled(deadline) => Some(deadline),
            _ => None,
        }
    }

    /// Start the scan if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            ScanState::ScanScheduled(deadline) if now >= deadline => {
                self.state = ScanState::Scanning;
                true
            }
            _ => false,
        }
    }

    /// A mutation during the scan keeps its new deadline.
    pub fn finish_scan(&mut self) {
        if self.state == ScanState::Scanning {
            self.state = ScanState::Idle;
        }
    }

    /// Whether a badge refresh may run now; records it when allowed.
    pub fn request_badge_refresh(&mut self, now: Instant) -> bool {
        if self.state == ScanState::Detached {
            return false;
        }
        let allowed = self
            .last_badge_refresh
            .is_none_or(|last| now.saturating_duration_since(last) > self.badge_cooldown);
        if allowed {
            self.last_badge_refresh = Some(now);
        }
        allowed
    }

    pub fn detach(&mut self) {
        self.state = ScanState::Detached;
    }

    pub fn is_detached(&self) -> bool {
        self.state == ScanState::Detached
    }
}

#[cfg(test)]
mod tests {
    use super::{ScanScheduler, ScanState};
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::time::Instant;

    fn scheduler() -> ScanScheduler {
        ScanScheduler::new(Duration::from_millis(500), Duration::from_millis(1000))
    }

    #[test]
    fn mutations_push_the_deadline_out() {
        let start = Instant::now();
        let mut scheduler = scheduler();
        assert!(scheduler.on_mutation(start));
        assert!(scheduler.on_mutation(start + Duration::from_millis(400)));
        assert_eq!(
            scheduler.deadline(),
            Some(start + Duration::from_millis(900))
        );
        assert!(!scheduler.poll(start + Duration::from_millis(500)));
        assert!(scheduler.poll(start + Duration::from_millis(900)));
        assert_eq!(scheduler.state(), ScanState::Scanning);
        scheduler.finish_scan();
        assert_eq!(scheduler.state(), ScanState::Idle);
    }

    #[test]
    fn mutation_during_scan_reschedules() {
        let start = Instant::now();
        let mut scheduler = scheduler();
        scheduler.schedule_at(start);
        assert!(scheduler.poll(start));
        scheduler.on_mutation(start + Duration::from_millis(10));
        scheduler.finish_scan();
        assert_eq!(
            scheduler.state(),
            ScanState::ScanScheduled(start + Duration::from_millis(510))
        );
    }

    #[test]
    fn badge_cooldown_is_independent() {
        let start = Instant::now();
        let mut scheduler = scheduler();
        assert!(scheduler.request_badge_refresh(start));
        assert!(!scheduler.request_badge_refresh(start + Duration::from_millis(600)));
        assert!(!scheduler.request_badge_refresh(start + Duration::from_millis(1000)));
        assert!(scheduler.request_badge_refresh(start + Duration::from_millis(1001)));
    }

    #[test]
    fn watcher_start_and_detach() {
        let start = Instant::now();
        let mut scheduler = scheduler();
        scheduler.watch_from(start + Duration::from_millis(2000));
        assert!(!scheduler.on_mutation(start + Duration::from_millis(100)));
        assert_eq!(scheduler.state(), ScanState::Idle);
        assert!(scheduler.on_mutation(start + Duration::from_millis(2000)));

        scheduler.detach();
        assert!(!scheduler.on_mutation(start + Duration::from_millis(3000)));
        assert!(!scheduler.request_badge_refresh(start + Duration::from_millis(3000)));
        scheduler.schedule_at(start);
        assert!(scheduler.is_detached());
        assert_eq!(scheduler.deadline(), None);
    }
}
