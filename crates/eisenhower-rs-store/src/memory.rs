//! In-memory priority store.

use crate::error::StoreError;
use crate::provider::{PriorityStore, normalize_label, remove_expired, validate_record};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use eisenhower_rs_protocol::{ItemKind, PriorityMap, PriorityRecord, Settings};
use log::debug;
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Namespaces {
    emails: PriorityMap,
    web_links: PriorityMap,
    settings: Settings,
}

impl Namespaces {
    fn map_mut(&mut self, kind: ItemKind) -> &mut PriorityMap {
        match kind {
            ItemKind::Email => &mut self.emails,
            ItemKind::WebPage => &mut self.web_links,
        }
    }
}

/// Volatile store with the same semantics as [`crate::FileStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Namespaces>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PriorityStore for MemoryStore {
    async fn upsert(&self, kind: ItemKind, record: PriorityRecord) -> Result<(), StoreError> {
        validate_record(&record)?;
        debug!("priority stored in memory (kind={}, id={})", kind, record.id);
        self.inner
            .lock()
            .map_mut(kind)
            .insert(record.id.clone(), record);
        Ok(())
    }

    async fn patch_label(
        &self,
        kind: ItemKind,
        id: &str,
        label: Option<String>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        match inner.map_mut(kind).get_mut(id) {
            Some(record) => {
                record.custom_label = normalize_label(label);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, kind: ItemKind, id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.lock().map_mut(kind).remove(id).is_some())
    }

    async fn get_all(&self, kind: ItemKind) -> Result<PriorityMap, StoreError> {
        Ok(self.inner.lock().map_mut(kind).clone())
    }

    async fn sweep(
        &self,
        kind: ItemKind,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, StoreError> {
        Ok(remove_expired(
            self.inner.lock().map_mut(kind),
            max_age,
            now,
        ))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.emails.clear();
        inner.web_links.clear();
        Ok(())
    }

    async fn load_settings(&self) -> Result<Settings, StoreError> {
        Ok(self.inner.lock().settings.clone())
    }

    async fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        self.inner.lock().settings = settings.clone();
        Ok(())
    }
}
