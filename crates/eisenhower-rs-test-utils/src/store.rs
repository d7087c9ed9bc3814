use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use eisenhower_rs_protocol::{ItemKind, PriorityMap, PriorityRecord, Settings};
use eisenhower_rs_store::{PriorityStore, StoreError};

/// Store whose backend refuses every operation.
#[derive(Debug, Clone)]
pub struct FailingStore {
    reason: String,
}

impl FailingStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> StoreError {
        StoreError::Unavailable(self.reason.clone())
    }
}

impl Default for FailingStore {
    fn default() -> Self {
        Self::new("quota exceeded")
    }
}

#[async_trait]
impl PriorityStore for FailingStore {
    async fn upsert(&self, _kind: ItemKind, _record: PriorityRecord) -> Result<(), StoreError> {
        Err(self.error())
    }

    async fn patch_label(
        &self,
        _kind: ItemKind,
        _id: &str,
        _label: Option<String>,
    ) -> Result<bool, StoreError> {
        Err(self.error())
    }

    async fn delete(&self, _kind: ItemKind, _id: &str) -> Result<bool, StoreError> {
        Err(self.error())
    }

    async fn get_all(&self, _kind: ItemKind) -> Result<PriorityMap, StoreError> {
        Err(self.error())
    }

    async fn sweep(
        &self,
        _kind: ItemKind,
        _max_age: Duration,
        _now: DateTime<Utc>,
    ) -> Result<Vec<String>, StoreError> {
        Err(self.error())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        Err(self.error())
    }

    async fn load_settings(&self) -> Result<Settings, StoreError> {
        Err(self.error())
    }

    async fn save_settings(&self, _settings: &Settings) -> Result<(), StoreError> {
        Err(self.error())
    }
}
