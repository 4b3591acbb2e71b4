//! Error types for the session-control core
//!
//! Each concern has its own error enum; [`Error`] gathers them for the
//! controller-level API.

use thiserror::Error;

use crate::broadcast::DeliveryFault;
use crate::config::SettingsError;
use crate::id::ActorId;
use crate::registry::RegistryError;
use crate::transport::TransportError;

/// Crate-level error
#[derive(Error, Debug)]
pub enum Error {
    /// `start` called on a running session
    #[error("Session is already running")]
    AlreadyRunning,

    /// `stop` called on a stopped session
    #[error("Session is not running")]
    NotRunning,

    /// Registry operation failed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Transport failure outside of a broadcast
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Settings could not be loaded or persisted
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// A message was present but empty
    #[error("Cannot send an empty {0} message")]
    EmptyMessage(&'static str),

    /// Owners cannot be banned
    #[error("Cannot ban an owner of the event: {0}")]
    CannotBanOwner(ActorId),

    /// Actor lacks owner permission
    #[error("Only owners can use this command: {0}")]
    NotOwner(ActorId),

    /// One or more destinations failed with an unexpected transport fault
    #[error("Delivery failed for {} destination(s)", .0.len())]
    Delivery(Vec<DeliveryFault>),

    /// An external collaborator refused to start
    #[error("Collaborator failure: {0}")]
    Collaborator(String),
}

/// Crate-level result
pub type Result<T> = std::result::Result<T, Error>;
