//! Recurring removal of expired records.

use crate::clock::Clock;
use crate::error::EisenhowerError;
use chrono::{DateTime, Utc};
use eisenhower_rs_config::StorageConfig;
use eisenhower_rs_protocol::ItemKind;
use eisenhower_rs_store::PriorityStore;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Sweeps both namespaces of a store.
pub struct Sweeper {
    store: Arc<dyn PriorityStore>,
    max_age: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl Sweeper {
    pub fn new(store: Arc<dyn PriorityStore>, max_age: chrono::Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            max_age,
            clock,
        }
    }

    pub fn from_config(
        storage: &StorageConfig,
        store: Arc<dyn PriorityStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(store, storage.max_age(), clock)
    }

    /// Remove records older than the max age as of `now`; returns how many.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<usize, EisenhowerError> {
        let mut removed = 0;
        for kind in ItemKind::ALL {
            let ids = self.store.sweep(kind, self.max_age, now).await?;
            if !ids.is_empty() {
                info!("expired priorities removed (kind={kind}, count={})", ids.len());
            }
            removed += ids.len();
        }
        Ok(removed)
    }

    /// Sweep every `period`, first after one full period, until the handle
    /// is aborted. Failed runs are logged and retried on the next tick.
    pub fn spawn(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = self.run_once(self.clock.now()).await {
                    warn!("sweep failed (error={err})");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Sweeper;
    use crate::clock::SystemClock;
    use chrono::{Duration, TimeZone, Utc};
    use eisenhower_rs_protocol::{ItemKind, PriorityRecord};
    use eisenhower_rs_store::{MemoryStore, PriorityStore};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[tokio::test]
    async fn sweeps_both_namespaces_once() {
        let now = Utc.with_ymd_and_hms(2025, 4, 30, 8, 0, 0).single().expect("now");
        let store = Arc::new(MemoryStore::new());
        for (kind, id, age) in [
            (ItemKind::Email, "old-mail", Duration::days(31)),
            (ItemKind::Email, "new-mail", Duration::days(1)),
            (ItemKind::WebPage, "https://old.example/", Duration::days(45)),
        ] {
            store
                .upsert(kind, PriorityRecord::new(id, "Subject", 2, 2, now - age))
                .await
                .expect("upsert");
        }
        let sweeper = Sweeper::new(store.clone(), Duration::days(30), Arc::new(SystemClock));
        assert_eq!(sweeper.run_once(now).await.expect("sweep"), 2);
        assert_eq!(sweeper.run_once(now).await.expect("again"), 0);
        let left = store.get_all(ItemKind::Email).await.expect("emails");
        assert_eq!(left.keys().cloned().collect::<Vec<_>>(), vec!["new-mail".to_string()]);
    }
}
