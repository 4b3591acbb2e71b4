//! Broadcast fan-out engine
//!
//! Every payload goes out to every registered destination on its own task.
//! A destination whose message was deleted is dropped from the registry; any
//! other failure is collected and reported once all siblings have finished.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::task::JoinSet;

use crate::collab::{StatisticsConsumer, StreamConsumer};
use crate::error::{Error, Result};
use crate::id::CommunityId;
use crate::registry::{Destination, DestinationRegistry};
use crate::stats::SessionMetrics;
use crate::transport::{MessageTransport, TransportError};

use super::payload::{Payload, PayloadKind};

/// An unexpected delivery failure for one destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFault {
    /// Community whose destination failed
    pub community: CommunityId,
    /// What was being delivered
    pub kind: PayloadKind,
    /// Failure description
    pub reason: String,
}

impl fmt::Display for DeliveryFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} delivery to community {} failed: {}",
            self.kind, self.community, self.reason
        )
    }
}

/// Outcome of one broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Destinations that received the payload
    pub delivered: usize,
    /// Communities whose destination was removed as stale
    pub removed: Vec<CommunityId>,
    /// Unexpected failures
    pub faults: Vec<DeliveryFault>,
}

impl DeliveryReport {
    /// Whether no fault occurred
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }

    /// Number of destinations attempted
    pub fn attempted(&self) -> usize {
        self.delivered + self.removed.len() + self.faults.len()
    }

    /// Turn collected faults into [`Error::Delivery`]
    pub fn into_result(self) -> Result<Self> {
        if self.faults.is_empty() {
            Ok(self)
        } else {
            Err(Error::Delivery(self.faults))
        }
    }
}

enum Outcome {
    Delivered,
    Removed,
    Fault(String),
}

/// Delivers payloads to all registered destinations
pub struct FanoutEngine {
    registry: Arc<DestinationRegistry>,
    transport: Arc<dyn MessageTransport>,
    metrics: Arc<SessionMetrics>,
    gif_name: String,
}

impl FanoutEngine {
    /// Create an engine over a registry and a transport
    pub fn new(
        registry: Arc<DestinationRegistry>,
        transport: Arc<dyn MessageTransport>,
        metrics: Arc<SessionMetrics>,
        gif_name: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            transport,
            metrics,
            gif_name: gif_name.into(),
        }
    }

    /// Registry the engine delivers to
    pub fn registry(&self) -> &Arc<DestinationRegistry> {
        &self.registry
    }

    /// Deliver a payload to every destination in the current snapshot
    ///
    /// Never fails as a whole: stale destinations end up in
    /// [`DeliveryReport::removed`], everything else that went wrong in
    /// [`DeliveryReport::faults`].
    pub async fn broadcast(&self, payload: Payload) -> DeliveryReport {
        let destinations = self.registry.snapshot().await;
        let kind = payload.kind();

        tracing::debug!(
            kind = %kind,
            destinations = destinations.len(),
            "Broadcasting payload"
        );

        let mut tasks = JoinSet::new();
        let mut pending = BTreeSet::new();

        for destination in destinations {
            pending.insert(destination.community);

            let registry = Arc::clone(&self.registry);
            let transport = Arc::clone(&self.transport);
            let payload = payload.clone();

            tasks.spawn(async move {
                let community = destination.community;
                let outcome = deliver(&registry, transport.as_ref(), &destination, &payload).await;
                (community, outcome)
            });
        }

        let mut report = DeliveryReport::default();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((community, outcome)) => {
                    pending.remove(&community);
                    self.record(&mut report, community, kind, outcome);
                }
                Err(e) => {
                    tracing::error!(kind = %kind, error = %e, "Delivery task failed");
                }
            }
        }

        // Whatever never reported back panicked
        for community in pending {
            self.record(
                &mut report,
                community,
                kind,
                Outcome::Fault("delivery task panicked".to_string()),
            );
        }

        report
    }

    /// Deliver a payload to a single destination
    pub async fn deliver_to(&self, destination: &Destination, payload: &Payload) -> DeliveryReport {
        let outcome = deliver(&self.registry, self.transport.as_ref(), destination, payload).await;

        let mut report = DeliveryReport::default();
        self.record(&mut report, destination.community, payload.kind(), outcome);
        report
    }

    fn record(
        &self,
        report: &mut DeliveryReport,
        community: CommunityId,
        kind: PayloadKind,
        outcome: Outcome,
    ) {
        match outcome {
            Outcome::Delivered => {
                tracing::debug!(community = %community, kind = %kind, "Delivered");
                report.delivered += 1;
                self.metrics.record_delivery();
            }
            Outcome::Removed => {
                report.removed.push(community);
                self.metrics.record_removal();
            }
            Outcome::Fault(reason) => {
                tracing::error!(
                    community = %community,
                    kind = %kind,
                    reason = %reason,
                    "Unexpected delivery fault"
                );
                self.metrics.record_fault();
                report.faults.push(DeliveryFault {
                    community,
                    kind,
                    reason,
                });
            }
        }
    }
}

async fn deliver(
    registry: &DestinationRegistry,
    transport: &dyn MessageTransport,
    destination: &Destination,
    payload: &Payload,
) -> Outcome {
    let sent = match payload {
        Payload::StreamFile { name, data } => {
            transport
                .edit_attachment(&destination.stream, name, data.clone())
                .await
        }
        Payload::StatusText(text) => transport.edit_text(&destination.status, text.as_deref()).await,
    };

    match sent {
        Ok(()) => Outcome::Delivered,
        Err(TransportError::NotFound(reference)) => {
            tracing::info!(
                community = %destination.community,
                message = %reference,
                "Message deleted, removing destination"
            );

            match registry.remove(destination).await {
                Ok(_) => Outcome::Removed,
                Err(e) => Outcome::Fault(format!("could not remove stale destination: {}", e)),
            }
        }
        Err(e) => Outcome::Fault(e.to_string()),
    }
}

#[async_trait]
impl StreamConsumer for FanoutEngine {
    async fn accept_gif(&self, gif: Bytes) -> Result<()> {
        let payload = Payload::stream_file(self.gif_name.as_str(), gif);
        self.broadcast(payload).await.into_result().map(|_| ())
    }
}

#[async_trait]
impl StatisticsConsumer for FanoutEngine {
    async fn accept_statistics(&self, text: String) -> Result<()> {
        let payload = Payload::status_text(Some(text));
        self.broadcast(payload).await.into_result().map(|_| ())
    }
}
