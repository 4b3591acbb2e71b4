//! Persisted settings document
//!
//! A single [`Settings`] document holds everything that survives a restart:
//! owners, bans, registered destinations, game metadata and the cumulative
//! statistics counters. All mutation goes through [`SettingsHandle::edit`],
//! which serializes writers and persists the whole document before the
//! change becomes visible.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock, RwLockReadGuard};

use crate::error::{Error, Result};
use crate::gate::AccessPolicy;
use crate::id::ActorId;
use crate::registry::DestinationDescriptor;

use super::store::{SettingsError, SettingsStore};

/// Accepted inputs of a single actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputCount {
    /// Actor the count belongs to
    pub actor: ActorId,
    /// Number of accepted inputs
    pub count: u64,
}

/// The persisted settings document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path of the ROM the emulator loads
    pub rom_path: String,

    /// Title displayed for the game
    pub game_title: String,

    /// Actors with owner permission
    pub owners: BTreeSet<ActorId>,

    /// Actors whose input is always rejected
    pub banned_users: BTreeSet<ActorId>,

    /// Registered destinations
    pub destinations: BTreeSet<DestinationDescriptor>,

    /// Cumulative playtime in milliseconds
    pub playtime_ms: u64,

    /// Accepted inputs per actor
    pub input_counts: Vec<InputCount>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rom_path: "Pokemon Red.gb".to_string(),
            game_title: "Pokemon Red".to_string(),
            owners: BTreeSet::new(),
            banned_users: BTreeSet::new(),
            destinations: BTreeSet::new(),
            playtime_ms: 0,
            input_counts: Vec::new(),
        }
    }
}

impl Settings {
    /// Accepted inputs recorded for an actor
    pub fn input_count(&self, actor: ActorId) -> u64 {
        self.input_counts
            .iter()
            .find(|entry| entry.actor == actor)
            .map_or(0, |entry| entry.count)
    }
}

impl AccessPolicy for Settings {
    fn is_owner(&self, actor: ActorId) -> bool {
        self.owners.contains(&actor)
    }

    fn is_banned(&self, actor: ActorId) -> bool {
        self.banned_users.contains(&actor)
    }
}

/// Editable game metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMetadata {
    /// Path of the ROM
    RomPath,
    /// Displayed title
    Title,
}

impl fmt::Display for GameMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameMetadata::RomPath => write!(f, "ROM_PATH"),
            GameMetadata::Title => write!(f, "TITLE"),
        }
    }
}

/// Shared handle to the settings document
///
/// Writers queue on `writer` for the whole edit, save included. The document
/// lock is only taken for reads and for the final swap, so readers never wait
/// on storage.
pub struct SettingsHandle {
    document: RwLock<Settings>,
    writer: Mutex<()>,
    store: Arc<dyn SettingsStore>,
}

impl SettingsHandle {
    /// Load the document from a store, creating and saving the default one
    /// if the store is empty
    pub async fn load(store: Arc<dyn SettingsStore>) -> std::result::Result<Self, SettingsError> {
        let document = match store.load().await? {
            Some(document) => document,
            None => {
                let document = Settings::default();
                store.save(&document).await?;
                tracing::info!("No settings found, created defaults");
                document
            }
        };

        Ok(Self {
            document: RwLock::new(document),
            writer: Mutex::new(()),
            store,
        })
    }

    /// Shared read access to the current document
    pub async fn read(&self) -> RwLockReadGuard<'_, Settings> {
        self.document.read().await
    }

    /// Copy of the current document
    pub async fn snapshot(&self) -> Settings {
        self.document.read().await.clone()
    }

    /// Apply a change and persist it
    ///
    /// The change is applied to a copy; the in-memory document is only
    /// replaced once the save succeeded.
    pub async fn edit<F, R>(&self, change: F) -> std::result::Result<R, SettingsError>
    where
        F: FnOnce(&mut Settings) -> R,
    {
        let _writer = self.writer.lock().await;
        let mut edited = self.document.read().await.clone();
        let result = change(&mut edited);

        self.store.save(&edited).await?;
        *self.document.write().await = edited;

        Ok(result)
    }

    /// Apply a fallible change and persist it
    ///
    /// Nothing is saved if the change itself fails.
    pub async fn try_edit<F, R>(&self, change: F) -> Result<R>
    where
        F: FnOnce(&mut Settings) -> Result<R>,
    {
        let _writer = self.writer.lock().await;
        let mut edited = self.document.read().await.clone();
        let result = change(&mut edited)?;

        self.store.save(&edited).await?;
        *self.document.write().await = edited;

        Ok(result)
    }

    /// Whether an actor is an owner
    pub async fn is_owner(&self, actor: ActorId) -> bool {
        self.document.read().await.is_owner(actor)
    }

    /// Fail with [`Error::NotOwner`] unless the actor is an owner
    pub async fn require_owner(&self, actor: ActorId) -> Result<()> {
        if self.is_owner(actor).await {
            Ok(())
        } else {
            Err(Error::NotOwner(actor))
        }
    }

    /// Grant owner permission; lifts any ban on the actor
    pub async fn add_owner(&self, actor: ActorId) -> Result<()> {
        let unbanned = self
            .edit(|settings| {
                settings.owners.insert(actor);
                settings.banned_users.remove(&actor)
            })
            .await?;

        tracing::info!(actor = %actor, unbanned = unbanned, "Added owner");
        Ok(())
    }

    /// Ban an actor; owners cannot be banned
    pub async fn ban_user(&self, actor: ActorId) -> Result<()> {
        self.try_edit(|settings| {
            if settings.is_owner(actor) {
                return Err(Error::CannotBanOwner(actor));
            }
            settings.banned_users.insert(actor);
            Ok(())
        })
        .await?;

        tracing::info!(actor = %actor, "Banned user");
        Ok(())
    }

    /// Lift a ban; returns whether the actor was banned
    pub async fn unban_user(&self, actor: ActorId) -> Result<bool> {
        let removed = self
            .edit(|settings| settings.banned_users.remove(&actor))
            .await?;

        if removed {
            tracing::info!(actor = %actor, "Unbanned user");
        }
        Ok(removed)
    }

    /// Change a piece of game metadata
    pub async fn set_game_metadata(&self, entity: GameMetadata, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        let logged = value.clone();

        self.edit(move |settings| match entity {
            GameMetadata::RomPath => settings.rom_path = value,
            GameMetadata::Title => settings.game_title = value,
        })
        .await?;

        tracing::info!(entity = %entity, value = %logged, "Changed game metadata");
        Ok(())
    }

    /// Reset playtime and input counts
    pub async fn clear_statistics(&self) -> Result<()> {
        self.edit(|settings| {
            settings.playtime_ms = 0;
            settings.input_counts.clear();
        })
        .await?;

        tracing::info!("Cleared all statistics");
        Ok(())
    }

    /// Count one accepted input for an actor
    pub async fn record_input_count(&self, actor: ActorId) -> Result<u64> {
        let count = self
            .edit(|settings| {
                match settings.input_counts.iter_mut().find(|e| e.actor == actor) {
                    Some(entry) => {
                        entry.count += 1;
                        entry.count
                    }
                    None => {
                        settings.input_counts.push(InputCount { actor, count: 1 });
                        1
                    }
                }
            })
            .await?;

        Ok(count)
    }

    /// Add to the cumulative playtime
    pub async fn add_playtime(&self, played: Duration) -> Result<u64> {
        let millis = u64::try_from(played.as_millis()).unwrap_or(u64::MAX);
        let total = self
            .edit(|settings| {
                settings.playtime_ms = settings.playtime_ms.saturating_add(millis);
                settings.playtime_ms
            })
            .await?;

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryStore;

    async fn handle_with(store: Arc<MemoryStore>) -> SettingsHandle {
        SettingsHandle::load(store).await.unwrap()
    }

    async fn handle_with_store(store: Arc<dyn SettingsStore>) -> SettingsHandle {
        SettingsHandle::load(store).await.unwrap()
    }

    #[tokio::test]
    async fn test_load_creates_defaults() {
        let store = Arc::new(MemoryStore::new());
        let handle = handle_with(Arc::clone(&store)).await;

        assert_eq!(store.save_count(), 1);
        assert_eq!(handle.snapshot().await, Settings::default());
    }

    #[tokio::test]
    async fn test_missing_fields_take_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "game_title": "Tetris" }"#).unwrap();

        assert_eq!(settings.game_title, "Tetris");
        assert_eq!(settings.rom_path, "Pokemon Red.gb");
        assert!(settings.owners.is_empty());
    }

    #[tokio::test]
    async fn test_ban_owner_rejected() {
        let store = Arc::new(MemoryStore::new());
        let handle = handle_with(Arc::clone(&store)).await;

        handle.add_owner(ActorId(1)).await.unwrap();
        let saves = store.save_count();

        let result = handle.ban_user(ActorId(1)).await;
        assert!(matches!(result, Err(Error::CannotBanOwner(ActorId(1)))));

        assert!(!handle.read().await.is_banned(ActorId(1)));
        assert_eq!(store.save_count(), saves);
    }

    #[tokio::test]
    async fn test_ban_and_unban() {
        let handle = handle_with(Arc::new(MemoryStore::new())).await;

        handle.ban_user(ActorId(5)).await.unwrap();
        assert!(handle.read().await.is_banned(ActorId(5)));

        assert!(handle.unban_user(ActorId(5)).await.unwrap());
        assert!(!handle.unban_user(ActorId(5)).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back() {
        let store = Arc::new(MemoryStore::new());
        let handle = handle_with(Arc::clone(&store)).await;

        store.fail_saves(true);
        let result = handle.add_owner(ActorId(9)).await;

        assert!(matches!(result, Err(Error::Settings(_))));
        assert!(!handle.is_owner(ActorId(9)).await);
    }

    #[tokio::test]
    async fn test_require_owner() {
        let handle = handle_with(Arc::new(MemoryStore::new())).await;
        handle.add_owner(ActorId(1)).await.unwrap();

        assert!(handle.require_owner(ActorId(1)).await.is_ok());
        assert!(matches!(
            handle.require_owner(ActorId(2)).await,
            Err(Error::NotOwner(ActorId(2)))
        ));
    }

    #[tokio::test]
    async fn test_statistics_counters() {
        let handle = handle_with(Arc::new(MemoryStore::new())).await;

        assert_eq!(handle.record_input_count(ActorId(1)).await.unwrap(), 1);
        assert_eq!(handle.record_input_count(ActorId(1)).await.unwrap(), 2);
        assert_eq!(handle.record_input_count(ActorId(2)).await.unwrap(), 1);
        assert_eq!(
            handle.add_playtime(Duration::from_secs(2)).await.unwrap(),
            2_000
        );

        {
            let settings = handle.read().await;
            assert_eq!(settings.input_count(ActorId(1)), 2);
            assert_eq!(settings.input_count(ActorId(3)), 0);
        }

        handle.clear_statistics().await.unwrap();
        let settings = handle.snapshot().await;
        assert_eq!(settings.playtime_ms, 0);
        assert!(settings.input_counts.is_empty());
    }

    #[tokio::test]
    async fn test_owner_grant_lifts_ban() {
        let store = Arc::new(MemoryStore::new());
        let handle = handle_with(Arc::clone(&store)).await;

        handle.ban_user(ActorId(5)).await.unwrap();
        handle.add_owner(ActorId(5)).await.unwrap();

        let settings = handle.snapshot().await;
        assert!(settings.is_owner(ActorId(5)));
        assert!(!settings.is_banned(ActorId(5)));
        assert_eq!(store.document().unwrap(), settings);
    }

    struct SlowStore {
        inner: MemoryStore,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl SettingsStore for SlowStore {
        async fn load(&self) -> std::result::Result<Option<Settings>, SettingsError> {
            self.inner.load().await
        }

        async fn save(&self, settings: &Settings) -> std::result::Result<(), SettingsError> {
            tokio::time::sleep(self.delay).await;
            self.inner.save(settings).await
        }
    }

    #[tokio::test]
    async fn test_reads_do_not_wait_for_saves() {
        let store = Arc::new(SlowStore {
            inner: MemoryStore::with_settings(Settings::default()),
            delay: Duration::from_millis(500),
        });
        let handle = Arc::new(handle_with_store(store).await);

        let writer = {
            let handle = Arc::clone(&handle);
            tokio::spawn(async move { handle.ban_user(ActorId(99)).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The save is still in flight; readers see the old document at once
        let banned = tokio::time::timeout(Duration::from_millis(200), async {
            handle.read().await.is_banned(ActorId(99))
        })
        .await;
        assert!(matches!(banned, Ok(false)));

        writer.await.unwrap().unwrap();
        assert!(handle.read().await.is_banned(ActorId(99)));
    }

    #[tokio::test]
    async fn test_concurrent_edits_are_not_lost() {
        let store = Arc::new(SlowStore {
            inner: MemoryStore::with_settings(Settings::default()),
            delay: Duration::from_millis(20),
        });
        let handle = Arc::new(handle_with_store(store).await);

        let mut tasks = Vec::new();
        for actor in 0..10 {
            let handle = Arc::clone(&handle);
            tasks.push(tokio::spawn(async move { handle.add_owner(ActorId(actor)).await }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(handle.read().await.owners.len(), 10);
    }

    #[tokio::test]
    async fn test_game_metadata() {
        let handle = handle_with(Arc::new(MemoryStore::new())).await;

        handle
            .set_game_metadata(GameMetadata::Title, "Pokemon Blue")
            .await
            .unwrap();
        handle
            .set_game_metadata(GameMetadata::RomPath, "blue.gb")
            .await
            .unwrap();

        let settings = handle.snapshot().await;
        assert_eq!(settings.game_title, "Pokemon Blue");
        assert_eq!(settings.rom_path, "blue.gb");
    }
}
