//! File-backed priority store.

use crate::error::StoreError;
use crate::provider::{PriorityStore, normalize_label, remove_expired, validate_record};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use eisenhower_rs_protocol::{ItemKind, PriorityMap, PriorityRecord, Settings};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const SETTINGS_NAMESPACE: &str = "settings";

/// Stores each namespace as one JSON document under a root directory.
///
/// A write rewrites the whole namespace through a temp file and rename while
/// holding the write lock, so readers see either the old or the new mapping.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a store under `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!("initialized file priority store (root={})", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn namespace_path(&self, namespace: &str) -> PathBuf {
        self.root.join(format!("{namespace}.json"))
    }

    fn temp_path(&self, namespace: &str) -> PathBuf {
        self.root.join(format!("{namespace}.json.tmp"))
    }

    fn read_document<T>(&self, namespace: &'static str) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let path = self.namespace_path(namespace);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        if contents.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StoreError::Corrupt { namespace, source })
    }

    fn write_document<T>(&self, namespace: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize,
    {
        let path = self.namespace_path(namespace);
        let temp_path = self.temp_path(namespace);
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            let body = serde_json::to_string_pretty(value)?;
            file.write_all(body.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(temp_path, path)?;
        Ok(())
    }

    fn read_map(&self, kind: ItemKind) -> Result<PriorityMap, StoreError> {
        Ok(self.read_document(kind.namespace())?.unwrap_or_default())
    }

    /// Read-modify-write one namespace under the write lock.
    ///
    /// `apply` returns its result and whether the map changed; unchanged maps
    /// are not written back.
    fn modify<R>(
        &self,
        kind: ItemKind,
        apply: impl FnOnce(&mut PriorityMap) -> (R, bool),
    ) -> Result<R, StoreError> {
        let _guard = self.write_lock.lock();
        let mut map = self.read_map(kind)?;
        let (result, changed) = apply(&mut map);
        if changed {
            self.write_document(kind.namespace(), &map)?;
        }
        Ok(result)
    }
}

#[async_trait]
impl PriorityStore for FileStore {
    async fn upsert(&self, kind: ItemKind, record: PriorityRecord) -> Result<(), StoreError> {
        validate_record(&record)?;
        let id = record.id.clone();
        self.modify(kind, |map| {
            map.insert(record.id.clone(), record);
            ((), true)
        })?;
        info!("priority stored (kind={}, id={})", kind, id);
        Ok(())
    }

    async fn patch_label(
        &self,
        kind: ItemKind,
        id: &str,
        label: Option<String>,
    ) -> Result<bool, StoreError> {
        let label = normalize_label(label);
        let applied = self.modify(kind, |map| match map.get_mut(id) {
            Some(record) => {
                record.custom_label = label;
                (true, true)
            }
            None => (false, false),
        })?;
        debug!("label patch (kind={}, id={}, applied={})", kind, id, applied);
        Ok(applied)
    }

    async fn delete(&self, kind: ItemKind, id: &str) -> Result<bool, StoreError> {
        let removed = self.modify(kind, |map| {
            let removed = map.remove(id).is_some();
            (removed, removed)
        })?;
        debug!("priority delete (kind={}, id={}, removed={})", kind, id, removed);
        Ok(removed)
    }

    async fn get_all(&self, kind: ItemKind) -> Result<PriorityMap, StoreError> {
        self.read_map(kind)
    }

    async fn sweep(
        &self,
        kind: ItemKind,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, StoreError> {
        let removed = self.modify(kind, |map| {
            let removed = remove_expired(map, max_age, now);
            let changed = !removed.is_empty();
            (removed, changed)
        })?;
        if !removed.is_empty() {
            info!(
                "swept expired priorities (kind={}, removed={})",
                kind,
                removed.len()
            );
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        for kind in ItemKind::ALL {
            let path = self.namespace_path(kind.namespace());
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        warn!("cleared all priorities (root={})", self.root.display());
        Ok(())
    }

    async fn load_settings(&self) -> Result<Settings, StoreError> {
        Ok(self.read_document(SETTINGS_NAMESPACE)?.unwrap_or_default())
    }

    async fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        self.write_document(SETTINGS_NAMESPACE, settings)?;
        debug!(
            "settings saved (custom_urls={})",
            settings.custom_exchange_urls.len()
        );
        Ok(())
    }
}
