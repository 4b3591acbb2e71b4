//! Settings persistence
//!
//! The settings document is always written whole. The JSON file store writes
//! a sibling temp file and renames it over the target so a crash never leaves
//! a half-written document behind.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

use super::settings::Settings;

/// Error type for settings persistence
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Reading or writing the document failed
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be (de)serialized
    #[error("Settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Load/save of the settings document
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the document; `None` if nothing was saved yet
    async fn load(&self) -> Result<Option<Settings>, SettingsError>;

    /// Replace the stored document
    async fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}

/// Settings stored as pretty-printed JSON in a file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store for the given path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the document
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl SettingsStore for JsonFileStore {
    async fn load(&self) -> Result<Option<Settings>, SettingsError> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_slice(&contents)?))
    }

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(settings)?;
        let temp = self.temp_path();

        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::debug!(path = ?self.path, "Settings saved");
        Ok(())
    }
}

/// Settings kept in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Option<Settings>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a document
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            document: Mutex::new(Some(settings)),
            ..Default::default()
        }
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }

    /// Last saved document
    pub fn document(&self) -> Option<Settings> {
        self.document.lock().clone()
    }

    /// Make subsequent saves fail with an I/O error
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn load(&self) -> Result<Option<Settings>, SettingsError> {
        Ok(self.document.lock().clone())
    }

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if self.fail_saves.load(Ordering::Relaxed) {
            return Err(std::io::Error::other("store unavailable").into());
        }

        *self.document.lock() = Some(settings.clone());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
