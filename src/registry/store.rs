//! Destination registry implementation
//!
//! The central registry that maps communities to their destination and keeps
//! the persisted settings in sync with it.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::config::SettingsHandle;
use crate::id::CommunityId;
use crate::transport::{MessageTransport, TransportError};

use super::descriptor::DestinationDescriptor;
use super::entry::Destination;
use super::error::RegistryError;

type DestinationMap = BTreeMap<CommunityId, Destination>;

/// Registry of all broadcast destinations
///
/// Mutations queue on `writer` and build the next map from a copy. The copy is
/// persisted first and swapped in afterwards, so readers only ever wait for
/// the swap, never for storage or the transport.
pub struct DestinationRegistry {
    /// Map of community to its destination
    destinations: RwLock<DestinationMap>,

    /// Serializes add, remove and load
    writer: Mutex<()>,

    /// Persisted settings
    settings: Arc<SettingsHandle>,
}

impl DestinationRegistry {
    /// Create an empty registry backed by the given settings
    pub fn new(settings: Arc<SettingsHandle>) -> Self {
        Self {
            destinations: RwLock::new(BTreeMap::new()),
            writer: Mutex::new(()),
            settings,
        }
    }

    /// Register a destination
    ///
    /// Returns an error if the community already has a destination. Nothing
    /// changes if the new set cannot be persisted.
    pub async fn add(&self, destination: Destination) -> Result<(), RegistryError> {
        let _writer = self.writer.lock().await;
        let mut next = self.destinations.read().await.clone();
        let community = destination.community;

        if next.contains_key(&community) {
            return Err(RegistryError::DuplicateDestination(community));
        }

        next.insert(community, destination);
        self.persist(&next).await?;

        let count = next.len();
        *self.destinations.write().await = next;

        tracing::info!(
            community = %community,
            destinations = count,
            "Destination registered"
        );

        Ok(())
    }

    /// Remove a destination
    ///
    /// Only removes the entry if the community still points at this exact
    /// destination, so a newer registration is left alone. Returns whether
    /// anything was removed.
    pub async fn remove(&self, destination: &Destination) -> Result<bool, RegistryError> {
        let _writer = self.writer.lock().await;
        let mut next = self.destinations.read().await.clone();
        let community = destination.community;

        if next.get(&community) != Some(destination) {
            return Ok(false);
        }

        next.remove(&community);
        self.persist(&next).await?;

        let count = next.len();
        *self.destinations.write().await = next;

        tracing::info!(
            community = %community,
            destinations = count,
            "Destination removed"
        );

        Ok(true)
    }

    /// Remove whatever destination a community hosts
    pub async fn remove_community(&self, community: CommunityId) -> Result<Destination, RegistryError> {
        let destination = self
            .lookup(community)
            .await
            .ok_or(RegistryError::DestinationNotFound(community))?;

        if self.remove(&destination).await? {
            Ok(destination)
        } else {
            Err(RegistryError::DestinationNotFound(community))
        }
    }

    /// Get the destination of a community
    pub async fn lookup(&self, community: CommunityId) -> Option<Destination> {
        self.destinations.read().await.get(&community).cloned()
    }

    /// Copy of all destinations, ordered by community
    pub async fn snapshot(&self) -> Vec<Destination> {
        self.destinations.read().await.values().cloned().collect()
    }

    /// Number of registered destinations
    pub async fn len(&self) -> usize {
        self.destinations.read().await.len()
    }

    /// Whether no destination is registered
    pub async fn is_empty(&self) -> bool {
        self.destinations.read().await.is_empty()
    }

    /// Rebuild the registry from the persisted descriptors
    ///
    /// Descriptors whose messages no longer exist are dropped and the cleaned
    /// set is saved right away. Any other transport failure aborts the load
    /// and leaves registry and settings untouched. Adds and removes issued
    /// during the load wait for it and then apply to the rebuilt set.
    pub async fn load_from_settings(
        &self,
        transport: &dyn MessageTransport,
    ) -> crate::error::Result<usize> {
        let _writer = self.writer.lock().await;
        let descriptors = self.settings.read().await.destinations.clone();
        let mut resolved = BTreeMap::new();

        for descriptor in descriptors {
            let handles = match transport.resolve(&descriptor.stream).await {
                Ok(stream) => transport
                    .resolve(&descriptor.status)
                    .await
                    .map(|status| (stream, status)),
                Err(e) => Err(e),
            };

            match handles {
                Ok((stream, status)) => {
                    let destination = Destination::new(descriptor.community, stream, status);
                    resolved.insert(descriptor.community, destination);
                }
                Err(TransportError::NotFound(reference)) => {
                    tracing::warn!(
                        community = %descriptor.community,
                        message = %reference,
                        "Dropping destination, message no longer exists"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.persist(&resolved).await?;

        let count = resolved.len();
        *self.destinations.write().await = resolved;

        tracing::info!(destinations = count, "Destinations loaded");
        Ok(count)
    }

    async fn persist(&self, destinations: &DestinationMap) -> Result<(), RegistryError> {
        let descriptors: BTreeSet<DestinationDescriptor> =
            destinations.values().map(Destination::descriptor).collect();

        self.settings
            .edit(|settings| settings.destinations = descriptors)
            .await?;

        Ok(())
    }
}
