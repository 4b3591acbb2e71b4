//! Runtime destination handles
//!
//! This module defines the live form of a destination stored in the registry.

use crate::id::CommunityId;
use crate::transport::MessageHandle;

use super::descriptor::DestinationDescriptor;

/// A registered destination with resolved message handles
///
/// Cheap to clone; snapshots handed to the fan-out engine are copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Community hosting the destination
    pub community: CommunityId,

    /// Message whose attachment shows the stream
    pub stream: MessageHandle,

    /// Message whose text shows status and statistics
    pub status: MessageHandle,
}

impl Destination {
    /// Create a new destination
    pub fn new(community: CommunityId, stream: MessageHandle, status: MessageHandle) -> Self {
        Self {
            community,
            stream,
            status,
        }
    }

    /// Storage form of this destination
    pub fn descriptor(&self) -> DestinationDescriptor {
        DestinationDescriptor::new(
            self.community,
            self.stream.reference(),
            self.status.reference(),
        )
    }
}
