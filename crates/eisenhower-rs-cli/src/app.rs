//! Store and config shared by every command of one invocation.

use anyhow::{Context, bail};
use directories::UserDirs;
use eisenhower_rs_config::{EisenhowerConfig, StorageConfig};
use eisenhower_rs_core::{Clock, Dispatcher, LocalTransport, SystemClock};
use eisenhower_rs_protocol::Settings;
use eisenhower_rs_store::{FileStore, ObservedStore, PriorityStore, StoreEvent};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

const EVENT_BUFFER: usize = 64;

pub struct App {
    config: EisenhowerConfig,
    store: Arc<ObservedStore<FileStore>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("store_root", &self.store.inner().root())
            .finish_non_exhaustive()
    }
}

impl App {
    /// Open the file store selected by `--store`, the config or the default.
    pub fn open(config: EisenhowerConfig, store_override: Option<&Path>) -> anyhow::Result<Self> {
        Self::with_clock(config, store_override, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: EisenhowerConfig,
        store_override: Option<&Path>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let root = store_root(store_override, &config.storage)?;
        let store = FileStore::new(&root)
            .with_context(|| format!("failed to open store at {}", root.display()))?;
        info!("store opened (root={})", root.display());
        Ok(Self {
            config,
            store: Arc::new(ObservedStore::new(store, EVENT_BUFFER)),
            clock,
        })
    }

    pub fn config(&self) -> &EisenhowerConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn PriorityStore> {
        self.store.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Stored settings, or defaults when they cannot be read.
    pub async fn settings(&self) -> Settings {
        match self.store.load_settings().await {
            Ok(settings) => settings,
            Err(err) => {
                warn!("settings unavailable, using defaults (error={err})");
                Settings::default()
            }
        }
    }

    /// Dispatcher without a page behind it, for commands that only touch
    /// the store.
    pub fn offline_dispatcher(&self) -> anyhow::Result<Dispatcher> {
        let (transport, _inbox) = LocalTransport::channel(1);
        Dispatcher::new(&self.config, self.store(), Arc::new(transport))
            .context("failed to build dispatcher")
    }
}

/// `--store` wins over `storage.path`, which wins over `~/.eisenhower/store`.
pub fn store_root(store_override: Option<&Path>, storage: &StorageConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = store_override {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = storage.path.as_deref().filter(|path| !path.trim().is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let Some(dirs) = UserDirs::new() else {
        bail!("cannot locate the home directory, pass --store");
    };
    Ok(dirs.home_dir().join(".eisenhower").join("store"))
}
