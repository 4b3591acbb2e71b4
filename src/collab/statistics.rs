//! Statistics aggregator port

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::gate::UserInput;

/// Receiver of rendered statistics text
#[async_trait]
pub trait StatisticsConsumer: Send + Sync {
    /// Called whenever a new statistics text is ready
    async fn accept_statistics(&self, text: String) -> Result<()>;
}

/// Aggregates session statistics and publishes them as text
pub trait Statistics: Send + Sync {
    /// A session started
    fn on_session_started(&self);

    /// The running session stopped
    fn on_session_stopped(&self);

    /// An input was accepted
    fn on_input(&self, input: &UserInput);

    /// Subscribe a consumer to statistics text
    fn add_consumer(&self, consumer: Arc<dyn StatisticsConsumer>);
}
