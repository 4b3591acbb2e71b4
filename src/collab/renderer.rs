//! Renderer port and its frame consumers

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::gate::UserInput;

/// A single rendered frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Packed RGB pixel data
    pub pixels: Bytes,
}

impl Frame {
    /// Create a frame
    pub fn new(width: u32, height: u32, pixels: Bytes) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// Receiver of renderer output
#[async_trait]
pub trait StreamConsumer: Send + Sync {
    /// Called for every rendered frame
    async fn accept_frame(&self, _frame: &Frame) -> Result<()> {
        Ok(())
    }

    /// Called whenever an animated gif of recent frames is ready
    async fn accept_gif(&self, _gif: Bytes) -> Result<()> {
        Ok(())
    }
}

/// Produces frames and gifs from the emulator's screen
pub trait Renderer: Send + Sync {
    /// Begin capturing
    fn start(&self) -> Result<()>;

    /// Stop capturing
    fn stop(&self);

    /// Subscribe a consumer to frame and gif events
    fn add_consumer(&self, consumer: Arc<dyn StreamConsumer>);

    /// Unsubscribe a consumer
    fn remove_consumer(&self, consumer: &Arc<dyn StreamConsumer>);

    /// Set or clear the overlay message drawn on every frame
    fn set_global_message(&self, message: Option<String>);

    /// Record an accepted input for the input overlay
    fn record_input(&self, input: &UserInput);
}
