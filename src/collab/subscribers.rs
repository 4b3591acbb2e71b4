//! Publish/subscribe list for collaborator events
//!
//! Renderer and statistics implementations keep their consumers in a
//! [`Subscribers`] list. Subscribing and unsubscribing may happen at any time,
//! including while an event is being delivered: `notify` works on a snapshot
//! taken when the event starts, and every handler runs in its own task.

use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::task::JoinSet;

use crate::error::Error;

/// Dynamic list of handlers, compared by pointer identity
pub struct Subscribers<C: ?Sized> {
    handlers: RwLock<Vec<Arc<C>>>,
}

impl<C: ?Sized> Default for Subscribers<C> {
    fn default() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }
}

impl<C: ?Sized> Subscribers<C> {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler; returns false if it was already subscribed
    pub fn subscribe(&self, handler: Arc<C>) -> bool {
        let mut handlers = self.handlers.write();
        if handlers.iter().any(|h| Arc::ptr_eq(h, &handler)) {
            return false;
        }
        handlers.push(handler);
        true
    }

    /// Remove a handler; returns whether it was subscribed
    pub fn unsubscribe(&self, handler: &Arc<C>) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|h| !Arc::ptr_eq(h, handler));
        handlers.len() != before
    }

    /// Copy of the current handlers
    pub fn snapshot(&self) -> Vec<Arc<C>> {
        self.handlers.read().clone()
    }

    /// Number of subscribed handlers
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    /// Whether nobody is subscribed
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Deliver an event to every current handler
    ///
    /// Each handler runs in its own task, so a handler that fails or panics
    /// does not stop the others. Returns the errors of all handlers that
    /// failed, with panics reported as [`Error::Collaborator`].
    pub async fn notify<F, Fut>(&self, mut deliver: F) -> Vec<Error>
    where
        C: Send + Sync + 'static,
        F: FnMut(Arc<C>) -> Fut,
        Fut: Future<Output = crate::error::Result<()>> + Send + 'static,
    {
        let mut tasks = JoinSet::new();
        for handler in self.snapshot() {
            tasks.spawn(deliver(handler));
        }

        let mut errors = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            let error = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(e) => Error::Collaborator(format!("subscriber task failed: {}", e)),
            };

            tracing::warn!(error = %error, "Subscriber failed to handle event");
            errors.push(error);
        }

        errors
    }
}
