//! Local session demo - drives the core against in-memory collaborators
//!
//! Run with: cargo run --example local_session
//!
//! This demo shows:
//! - Wiring a `SessionController` to an in-memory chat transport
//! - Collaborators that publish through `Subscribers` lists
//! - Rate limiting and the owner lock
//! - A deleted chat message healing out of the registry
//! - The offline cover broadcast on stop
//!
//! # Architecture
//!
//! ```text
//!   actors ──submit_input──▶ SessionController ──click──▶ LoggingEmulator
//!                                  │
//!                                  ├──▶ LoggingRenderer ──gif──▶ FanoutEngine ──▶ MemoryTransport
//!                                  │
//!                                  └──▶ LoggingStatistics ──text──▶ FanoutEngine
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;

use crowdplay::collab::{
    Emulator, Frame, LocalDisplay, Renderer, Statistics, StatisticsConsumer, StreamConsumer,
    Subscribers,
};
use crowdplay::config::{MemoryStore, SessionConfig, SettingsHandle};
use crowdplay::gate::{Button, UserInput};
use crowdplay::id::{ActorId, CommunityId};
use crowdplay::registry::Destination;
use crowdplay::session::{Collaborators, SessionController};
use crowdplay::transport::MemoryTransport;

// ============================================================================
// Collaborators
// ============================================================================

struct LoggingEmulator;

impl Emulator for LoggingEmulator {
    fn start(&self) -> crowdplay::Result<()> {
        tracing::info!("Emulator booted");
        Ok(())
    }

    fn stop(&self) {
        tracing::info!("Emulator halted");
    }

    fn click_button(&self, button: Button) {
        tracing::info!(button = %button, "Button pressed");
    }

    fn mute_sound(&self) {
        tracing::info!("Sound muted");
    }
}

#[derive(Default)]
struct LoggingRenderer {
    consumers: Subscribers<dyn StreamConsumer>,
    gifs: AtomicU64,
}

impl LoggingRenderer {
    /// Pretend a new gif of recent frames is ready
    async fn emit_gif(&self) {
        let number = self.gifs.fetch_add(1, Ordering::Relaxed);
        let gif = Bytes::from(format!("GIF89a frame batch {}", number));

        let errors = self
            .consumers
            .notify(|consumer| {
                let gif = gif.clone();
                async move { consumer.accept_gif(gif).await }
            })
            .await;

        for error in errors {
            tracing::warn!(error = %error, "Gif consumer failed");
        }
    }
}

impl Renderer for LoggingRenderer {
    fn start(&self) -> crowdplay::Result<()> {
        tracing::info!("Renderer capturing");
        Ok(())
    }

    fn stop(&self) {
        tracing::info!("Renderer stopped");
    }

    fn add_consumer(&self, consumer: Arc<dyn StreamConsumer>) {
        self.consumers.subscribe(consumer);
    }

    fn remove_consumer(&self, consumer: &Arc<dyn StreamConsumer>) {
        self.consumers.unsubscribe(consumer);
    }

    fn set_global_message(&self, message: Option<String>) {
        tracing::info!(message = ?message, "Overlay message changed");
    }

    fn record_input(&self, input: &UserInput) {
        tracing::debug!(actor = %input.actor, button = %input.button, "Overlay input");
    }
}

#[derive(Default)]
struct LoggingStatistics {
    consumers: Subscribers<dyn StatisticsConsumer>,
    inputs: AtomicU64,
}

impl LoggingStatistics {
    async fn publish(&self) {
        let text = format!("Inputs: {}", self.inputs.load(Ordering::Relaxed));

        self.consumers
            .notify(|consumer| {
                let text = text.clone();
                async move { consumer.accept_statistics(text).await }
            })
            .await;
    }
}

impl Statistics for LoggingStatistics {
    fn on_session_started(&self) {
        tracing::info!("Statistics tracking started");
    }

    fn on_session_stopped(&self) {
        tracing::info!("Statistics tracking stopped");
    }

    fn on_input(&self, _input: &UserInput) {
        self.inputs.fetch_add(1, Ordering::Relaxed);
    }

    fn add_consumer(&self, consumer: Arc<dyn StatisticsConsumer>) {
        self.consumers.subscribe(consumer);
    }
}

struct TerminalDisplay;

impl LocalDisplay for TerminalDisplay {
    fn activate(&self, with_sound: bool) {
        tracing::info!(with_sound = with_sound, "Terminal display on");
    }

    fn deactivate(&self) {
        tracing::info!("Terminal display off");
    }
}

#[async_trait]
impl StreamConsumer for TerminalDisplay {
    async fn accept_frame(&self, frame: &Frame) -> crowdplay::Result<()> {
        tracing::debug!(width = frame.width, height = frame.height, "Frame shown");
        Ok(())
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("crowdplay=debug".parse()?)
                .add_directive("local_session=debug".parse()?),
        )
        .init();

    let transport = Arc::new(MemoryTransport::new());
    let renderer = Arc::new(LoggingRenderer::default());
    let statistics = Arc::new(LoggingStatistics::default());

    let settings = Arc::new(SettingsHandle::load(Arc::new(MemoryStore::new())).await?);
    settings.add_owner(ActorId(1)).await?;

    let collaborators = Collaborators::new(
        Arc::new(LoggingEmulator),
        renderer.clone(),
        statistics.clone(),
        Arc::new(TerminalDisplay),
        transport.clone(),
    );
    let config = SessionConfig::default().rate_limit_window(Duration::from_millis(500));
    let controller = SessionController::new(config, settings, collaborators);

    // Two communities host the stream
    let mut destinations = Vec::new();
    for community in [100, 200] {
        let destination = Destination::new(
            CommunityId(community),
            transport.create_message(community),
            transport.create_message(community),
        );
        controller.register_destination(destination.clone()).await?;
        destinations.push(destination);
    }

    controller.start().await?;
    controller.attach_local_observer(false);

    let start = Instant::now();
    for (actor, button, offset_ms) in [(1, Button::Up, 0), (1, Button::A, 100), (2, Button::B, 200)] {
        let input = UserInput::new(
            ActorId(actor),
            button,
            start + Duration::from_millis(offset_ms),
        );
        let outcome = controller.submit_input(input).await;
        println!("actor {} pressed {}: {}", actor, button, outcome);
    }

    controller.lock_input_to_owners(true);
    let outcome = controller
        .submit_input(UserInput::new(ActorId(3), Button::Start, start))
        .await;
    println!("actor 3 while locked: {}", outcome);
    controller.lock_input_to_owners(false);

    renderer.emit_gif().await;
    statistics.publish().await;
    controller
        .set_destination_message(CommunityId(100), Some("Welcome, community 100!".into()))
        .await?;

    // Someone deletes the stream message in community 200
    transport.delete_message(&destinations[1].stream.reference());
    renderer.emit_gif().await;
    println!("destinations after cleanup: {}", controller.destinations().await.len());

    controller.detach_local_observer();
    let report = controller.stop().await?;
    println!(
        "offline cover delivered to {} destination(s)",
        report.delivered
    );

    for destination in &destinations {
        if let Some(stream) = transport.message(&destination.stream.reference()) {
            let attachment = stream.attachment.map(|(name, _)| name);
            let status = transport
                .message(&destination.status.reference())
                .and_then(|m| m.text);
            println!(
                "community {}: attachment={:?} status={:?}",
                destination.community, attachment, status
            );
        }
    }

    println!("{:#?}", controller.metrics());
    Ok(())
}
