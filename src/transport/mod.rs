//! Chat message transport port
//!
//! The core only ever edits two kinds of existing messages: it swaps the
//! attachment of a stream message and rewrites the text of a status message.
//! Implementations must report a deleted message as
//! [`TransportError::NotFound`] so the registry can heal itself; every other
//! failure is a [`TransportError::Fault`].

pub mod memory;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::registry::MessageRef;

pub use memory::MemoryTransport;

/// Error type for transport operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The referenced message no longer exists
    #[error("Message not found: {0}")]
    NotFound(MessageRef),

    /// Any other transport failure
    #[error("Transport fault: {0}")]
    Fault(String),
}

impl TransportError {
    /// Whether this error means the reference is stale
    pub fn is_stale_reference(&self) -> bool {
        matches!(self, TransportError::NotFound(_))
    }
}

/// Live handle to a message that was resolved through the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle {
    reference: MessageRef,
}

impl MessageHandle {
    /// Wrap a reference the transport has confirmed to exist
    pub fn new(reference: MessageRef) -> Self {
        Self { reference }
    }

    /// The underlying message reference
    pub fn reference(&self) -> MessageRef {
        self.reference
    }
}

/// Message edit primitives used by the core
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Resolve a persisted reference to a live handle
    async fn resolve(&self, reference: &MessageRef) -> Result<MessageHandle, TransportError>;

    /// Replace the single attachment of a message
    async fn edit_attachment(
        &self,
        message: &MessageHandle,
        name: &str,
        data: Bytes,
    ) -> Result<(), TransportError>;

    /// Replace the text of a message, or clear it with `None`
    async fn edit_text(
        &self,
        message: &MessageHandle,
        text: Option<&str>,
    ) -> Result<(), TransportError>;
}
