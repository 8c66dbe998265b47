//! Version-checked local snapshot of the company / position options.
//!
//! A load asks the server for its option version first. When it matches the
//! version stored next to the local snapshot, the snapshot is reused;
//! otherwise the snapshot is discarded and refetched.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::models::options::{OptionVersion, OptionsSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Loading,
    Ready,
}

/// Snapshot persisted together with the version it was fetched under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSnapshot {
    pub version: i64,
    pub options: OptionsSnapshot,
}

#[async_trait]
pub trait OptionsSource: Send + Sync {
    async fn version(&self) -> Result<i64, CacheError>;
    async fn options(&self) -> Result<OptionsSnapshot, CacheError>;
}

pub trait SnapshotStore: Send + Sync {
    fn load(&self) -> Result<Option<StoredSnapshot>, CacheError>;
    fn save(&self, snapshot: &StoredSnapshot) -> Result<(), CacheError>;
    fn clear(&self) -> Result<(), CacheError>;
}

#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    slot: Mutex<Option<StoredSnapshot>>,
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<StoredSnapshot>, CacheError> {
        Ok(self.slot.lock().map_err(|_| CacheError::Poisoned)?.clone())
    }

    fn save(&self, snapshot: &StoredSnapshot) -> Result<(), CacheError> {
        *self.slot.lock().map_err(|_| CacheError::Poisoned)? = Some(snapshot.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        *self.slot.lock().map_err(|_| CacheError::Poisoned)? = None;
        Ok(())
    }
}

/// JSON file on disk, the non-browser counterpart of localStorage.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<StoredSnapshot>, CacheError> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&raw) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                // Unreadable snapshots are treated as absent and overwritten.
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring corrupt snapshot");
                Ok(None)
            }
        }
    }

    fn save(&self, snapshot: &StoredSnapshot) -> Result<(), CacheError> {
        let raw = serde_json::to_vec_pretty(snapshot)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Reads options and their version from a running relay.
pub struct HttpOptionsSource {
    http: Client,
    base_url: String,
}

impl HttpOptionsSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl OptionsSource for HttpOptionsSource {
    async fn version(&self) -> Result<i64, CacheError> {
        let body: OptionVersion = self
            .http
            .get(format!("{}/api/option-version", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.version)
    }

    async fn options(&self) -> Result<OptionsSnapshot, CacheError> {
        let snapshot = self
            .http
            .get(format!("{}/api/lark/options", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(snapshot)
    }
}

pub struct OptionsCache<S> {
    store: S,
    state: CacheState,
    current: Option<StoredSnapshot>,
}

impl<S: SnapshotStore> OptionsCache<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: CacheState::Empty,
            current: None,
        }
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The snapshot from the last successful load.
    pub fn snapshot(&self) -> Option<&OptionsSnapshot> {
        self.current.as_ref().map(|s| &s.options)
    }

    /// Revalidate against the source and return the up-to-date snapshot.
    pub async fn load(&mut self, source: &dyn OptionsSource) -> Result<&OptionsSnapshot, CacheError> {
        self.state = CacheState::Loading;
        match self.refresh(source).await {
            Ok(snapshot) => {
                self.current = Some(snapshot);
                self.state = CacheState::Ready;
            }
            Err(e) => {
                self.current = None;
                self.state = CacheState::Empty;
                return Err(e);
            }
        }
        self.snapshot().ok_or(CacheError::Poisoned)
    }

    async fn refresh(&self, source: &dyn OptionsSource) -> Result<StoredSnapshot, CacheError> {
        let remote = source.version().await?;

        if let Some(stored) = self.store.load()? {
            if stored.version == remote {
                tracing::debug!(version = remote, "Options snapshot is current");
                return Ok(stored);
            }
            tracing::info!(
                stored = stored.version,
                remote,
                "Option version changed; discarding snapshot"
            );
            self.store.clear()?;
        }

        let snapshot = StoredSnapshot {
            version: remote,
            options: source.options().await?,
        };
        self.store.save(&snapshot)?;
        Ok(snapshot)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Snapshot store lock poisoned")]
    Poisoned,
}
