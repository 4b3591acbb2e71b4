//! In-process message transport
//!
//! Keeps messages in a map so the core can run without a chat service, in
//! demos and tests. Messages can be deleted or made to fail to exercise the
//! stale-reference and fault paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::registry::MessageRef;

use super::{MessageHandle, MessageTransport, TransportError};

/// Contents of a stored message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredMessage {
    /// Attachment name and data, if any
    pub attachment: Option<(String, Bytes)>,
    /// Text body, if any
    pub text: Option<String>,
    /// Number of successful edits
    pub edits: u64,
}

/// Transport backed by an in-memory message map
#[derive(Debug, Default)]
pub struct MemoryTransport {
    messages: RwLock<HashMap<MessageRef, StoredMessage>>,
    faults: RwLock<HashMap<MessageRef, String>>,
    next_message_id: AtomicU64,
}

impl MemoryTransport {
    /// Create an empty transport
    pub fn new() -> Self {
        Self {
            next_message_id: AtomicU64::new(1),
            ..Default::default()
        }
    }

    /// Post a new empty message in a channel
    pub fn create_message(&self, channel_id: u64) -> MessageHandle {
        let message_id = self.next_message_id.fetch_add(1, Ordering::Relaxed);
        let reference = MessageRef::new(channel_id, message_id);

        self.messages
            .write()
            .insert(reference, StoredMessage::default());

        MessageHandle::new(reference)
    }

    /// Delete a message; later edits report it as not found
    pub fn delete_message(&self, reference: &MessageRef) -> bool {
        self.messages.write().remove(reference).is_some()
    }

    /// Make every edit of a message fail with a fault
    pub fn inject_fault(&self, reference: MessageRef, reason: impl Into<String>) {
        self.faults.write().insert(reference, reason.into());
    }

    /// Remove an injected fault
    pub fn clear_fault(&self, reference: &MessageRef) {
        self.faults.write().remove(reference);
    }

    /// Current contents of a message
    pub fn message(&self, reference: &MessageRef) -> Option<StoredMessage> {
        self.messages.read().get(reference).cloned()
    }

    fn edit<F>(&self, reference: MessageRef, apply: F) -> Result<(), TransportError>
    where
        F: FnOnce(&mut StoredMessage),
    {
        if let Some(reason) = self.faults.read().get(&reference) {
            return Err(TransportError::Fault(reason.clone()));
        }

        let mut messages = self.messages.write();
        let message = messages
            .get_mut(&reference)
            .ok_or(TransportError::NotFound(reference))?;

        apply(message);
        message.edits += 1;
        Ok(())
    }
}

#[async_trait]
impl MessageTransport for MemoryTransport {
    async fn resolve(&self, reference: &MessageRef) -> Result<MessageHandle, TransportError> {
        if let Some(reason) = self.faults.read().get(reference) {
            return Err(TransportError::Fault(reason.clone()));
        }

        if self.messages.read().contains_key(reference) {
            Ok(MessageHandle::new(*reference))
        } else {
            Err(TransportError::NotFound(*reference))
        }
    }

    async fn edit_attachment(
        &self,
        message: &MessageHandle,
        name: &str,
        data: Bytes,
    ) -> Result<(), TransportError> {
        self.edit(message.reference(), |stored| {
            stored.attachment = Some((name.to_string(), data));
        })
    }

    async fn edit_text(
        &self,
        message: &MessageHandle,
        text: Option<&str>,
    ) -> Result<(), TransportError> {
        self.edit(message.reference(), |stored| {
            stored.text = text.filter(|t| !t.is_empty()).map(str::to_string);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_attachment_replaced() {
        let transport = MemoryTransport::new();
        let handle = transport.create_message(1);

        transport
            .edit_attachment(&handle, "a.gif", Bytes::from_static(b"a"))
            .await
            .unwrap();
        transport
            .edit_attachment(&handle, "b.gif", Bytes::from_static(b"b"))
            .await
            .unwrap();

        let stored = transport.message(&handle.reference()).unwrap();
        assert_eq!(
            stored.attachment,
            Some(("b.gif".to_string(), Bytes::from_static(b"b")))
        );
        assert_eq!(stored.edits, 2);
    }

    #[tokio::test]
    async fn test_text_cleared() {
        let transport = MemoryTransport::new();
        let handle = transport.create_message(1);

        transport.edit_text(&handle, Some("hello")).await.unwrap();
        assert_eq!(
            transport.message(&handle.reference()).unwrap().text.as_deref(),
            Some("hello")
        );

        transport.edit_text(&handle, Some("")).await.unwrap();
        assert_eq!(transport.message(&handle.reference()).unwrap().text, None);
    }

    #[tokio::test]
    async fn test_deleted_message_not_found() {
        let transport = MemoryTransport::new();
        let handle = transport.create_message(1);
        assert!(transport.delete_message(&handle.reference()));

        let err = transport.edit_text(&handle, Some("x")).await.unwrap_err();
        assert!(err.is_stale_reference());

        let err = transport.resolve(&handle.reference()).await.unwrap_err();
        assert_eq!(err, TransportError::NotFound(handle.reference()));
    }

    #[tokio::test]
    async fn test_injected_fault() {
        let transport = MemoryTransport::new();
        let handle = transport.create_message(1);
        transport.inject_fault(handle.reference(), "rate limited by upstream");

        let err = transport.edit_text(&handle, Some("x")).await.unwrap_err();
        assert!(!err.is_stale_reference());

        transport.clear_fault(&handle.reference());
        assert!(transport.edit_text(&handle, Some("x")).await.is_ok());
    }
}
