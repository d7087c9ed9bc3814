//! Store decorator broadcasting successful writes.

use crate::error::StoreError;
use crate::provider::PriorityStore;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use eisenhower_rs_protocol::{ItemKind, PriorityMap, PriorityRecord, Settings};
use log::debug;
use tokio::sync::broadcast;

/// Change notification published after a write took effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Upserted {
        kind: ItemKind,
        record: PriorityRecord,
    },
    LabelPatched {
        kind: ItemKind,
        id: String,
        label: Option<String>,
    },
    Deleted {
        kind: ItemKind,
        id: String,
    },
    Swept {
        kind: ItemKind,
        ids: Vec<String>,
    },
    Cleared,
    SettingsSaved(Settings),
}

/// Wraps any [`PriorityStore`] and publishes a [`StoreEvent`] per change.
///
/// Failed or no-op writes publish nothing.
#[derive(Debug)]
pub struct ObservedStore<S> {
    inner: S,
    sender: broadcast::Sender<StoreEvent>,
}

impl<S: PriorityStore> ObservedStore<S> {
    /// Wrap `inner` with an event channel of the given buffer size.
    pub fn new(inner: S, buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer.max(1));
        debug!("store event bus initialized (buffer={})", buffer);
        Self { inner, sender }
    }

    /// Subscribe to the change stream.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn emit(&self, event: StoreEvent) {
        let _ = self.sender.send(event);
    }
}

#[async_trait]
impl<S: PriorityStore> PriorityStore for ObservedStore<S> {
    async fn upsert(&self, kind: ItemKind, record: PriorityRecord) -> Result<(), StoreError> {
        self.inner.upsert(kind, record.clone()).await?;
        self.emit(StoreEvent::Upserted { kind, record });
        Ok(())
    }

    async fn patch_label(
        &self,
        kind: ItemKind,
        id: &str,
        label: Option<String>,
    ) -> Result<bool, StoreError> {
        let applied = self.inner.patch_label(kind, id, label.clone()).await?;
        if applied {
            self.emit(StoreEvent::LabelPatched {
                kind,
                id: id.to_string(),
                label,
            });
        }
        Ok(applied)
    }

    async fn delete(&self, kind: ItemKind, id: &str) -> Result<bool, StoreError> {
        let removed = self.inner.delete(kind, id).await?;
        if removed {
            self.emit(StoreEvent::Deleted {
                kind,
                id: id.to_string(),
            });
        }
        Ok(removed)
    }

    async fn get_all(&self, kind: ItemKind) -> Result<PriorityMap, StoreError> {
        self.inner.get_all(kind).await
    }

    async fn get(&self, kind: ItemKind, id: &str) -> Result<Option<PriorityRecord>, StoreError> {
        self.inner.get(kind, id).await
    }

    async fn sweep(
        &self,
        kind: ItemKind,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, StoreError> {
        let ids = self.inner.sweep(kind, max_age, now).await?;
        if !ids.is_empty() {
            self.emit(StoreEvent::Swept {
                kind,
                ids: ids.clone(),
            });
        }
        Ok(ids)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.inner.clear().await?;
        self.emit(StoreEvent::Cleared);
        Ok(())
    }

    async fn load_settings(&self) -> Result<Settings, StoreError> {
        self.inner.load_settings().await
    }

    async fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        self.inner.save_settings(settings).await?;
        self.emit(StoreEvent::SettingsSaved(settings.clone()));
        Ok(())
    }
}
