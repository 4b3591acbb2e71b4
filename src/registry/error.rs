//! Registry error types
//!
//! Error types for destination registry operations.

use thiserror::Error;

use crate::config::SettingsError;
use crate::id::CommunityId;

/// Error type for registry operations
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Community already hosts a destination
    #[error(
        "Community {0} already has a destination; only one destination per community allowed, \
         remove the existing destination first"
    )]
    DuplicateDestination(CommunityId),

    /// Community hosts no destination
    #[error("Could not find any destination hosted in community {0}")]
    DestinationNotFound(CommunityId),

    /// Registry change could not be persisted
    #[error("Failed to persist destinations: {0}")]
    Persistence(#[from] SettingsError),
}
