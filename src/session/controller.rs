//! Session controller
//!
//! The top-level state machine. It owns the input gate, the destination
//! registry and the fan-out engine, and drives the external collaborators
//! through the stopped/running lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::broadcast::{DeliveryReport, FanoutEngine, Payload};
use crate::collab::{Emulator, LocalDisplay, Renderer, Statistics, StreamConsumer};
use crate::config::{GameMetadata, SessionConfig, SettingsHandle};
use crate::error::{Error, Result};
use crate::gate::{InputGate, InputOutcome, UserInput};
use crate::id::{ActorId, CommunityId};
use crate::registry::{Destination, DestinationRegistry, RegistryError};
use crate::stats::{MetricsSnapshot, SessionMetrics};
use crate::transport::MessageTransport;

use super::state::{SessionPhase, SessionState};

/// External collaborators driven by the controller
pub struct Collaborators {
    emulator: Arc<dyn Emulator>,
    renderer: Arc<dyn Renderer>,
    statistics: Arc<dyn Statistics>,
    display: Arc<dyn LocalDisplay>,
    display_consumer: Arc<dyn StreamConsumer>,
    transport: Arc<dyn MessageTransport>,
}

impl Collaborators {
    /// Bundle the collaborators
    ///
    /// The local display doubles as a frame consumer, so it is passed as a
    /// concrete type implementing both roles.
    pub fn new<D>(
        emulator: Arc<dyn Emulator>,
        renderer: Arc<dyn Renderer>,
        statistics: Arc<dyn Statistics>,
        display: Arc<D>,
        transport: Arc<dyn MessageTransport>,
    ) -> Self
    where
        D: LocalDisplay + StreamConsumer + 'static,
    {
        let display_consumer: Arc<dyn StreamConsumer> = display.clone();

        Self {
            emulator,
            renderer,
            statistics,
            display,
            display_consumer,
            transport,
        }
    }
}

/// Controls the shared game session
pub struct SessionController {
    config: SessionConfig,
    state: Mutex<SessionState>,
    settings: Arc<SettingsHandle>,
    gate: InputGate,
    registry: Arc<DestinationRegistry>,
    fanout: Arc<FanoutEngine>,
    metrics: Arc<SessionMetrics>,
    collaborators: Collaborators,
}

impl SessionController {
    /// Create a stopped controller
    ///
    /// Subscribes the fan-out engine to the renderer and the statistics
    /// collaborator right away.
    pub fn new(
        config: SessionConfig,
        settings: Arc<SettingsHandle>,
        collaborators: Collaborators,
    ) -> Self {
        let gate = InputGate::new(config.rate_limit_window, config.input_cache_capacity);
        gate.set_owners_only(config.lock_input_to_owners);

        let metrics = Arc::new(SessionMetrics::new());
        let registry = Arc::new(DestinationRegistry::new(Arc::clone(&settings)));
        let fanout = Arc::new(FanoutEngine::new(
            Arc::clone(&registry),
            Arc::clone(&collaborators.transport),
            Arc::clone(&metrics),
            config.gif_name.as_str(),
        ));

        collaborators.renderer.add_consumer(fanout.clone());
        collaborators.statistics.add_consumer(fanout.clone());

        Self {
            config,
            state: Mutex::new(SessionState::new()),
            settings,
            gate,
            registry,
            fanout,
            metrics,
            collaborators,
        }
    }

    /// Start the session
    ///
    /// Rebuilds the registry from settings, then starts emulator and
    /// renderer. If either fails to start, whatever was started is stopped
    /// again and the session stays stopped.
    pub async fn start(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.is_running() {
            return Err(Error::AlreadyRunning);
        }

        let destinations = self
            .registry
            .load_from_settings(self.collaborators.transport.as_ref())
            .await?;

        self.collaborators.emulator.start()?;
        if let Err(e) = self.collaborators.renderer.start() {
            tracing::error!(error = %e, "Renderer failed to start");
            self.collaborators.emulator.stop();
            return Err(e);
        }

        self.collaborators.statistics.on_session_started();
        state.on_started();
        self.metrics.session_started();

        tracing::info!(destinations = destinations, "Session started");
        Ok(())
    }

    /// Stop the session and show the offline cover everywhere
    ///
    /// Returns the report of the offline broadcast. Its faults are logged but
    /// do not undo the stop.
    pub async fn stop(&self) -> Result<DeliveryReport> {
        let mut state = self.state.lock().await;
        if !state.is_running() {
            return Err(Error::NotRunning);
        }

        self.collaborators.emulator.stop();
        self.collaborators.renderer.stop();
        self.collaborators.statistics.on_session_stopped();

        let ran_for = state.on_stopped().unwrap_or_default();
        self.metrics.session_stopped();

        tracing::info!(ran_for_secs = ran_for.as_secs(), "Session stopped");

        let cover = Payload::stream_file(
            self.config.offline_image_name.as_str(),
            self.config.offline_image.clone(),
        );
        let report = self.fanout.broadcast(cover).await;

        if !report.is_clean() {
            tracing::warn!(
                faults = report.faults.len(),
                "Offline cover could not be delivered everywhere"
            );
        }

        Ok(report)
    }

    /// Submit an actor's input
    ///
    /// Accepted input is recorded for the overlay, forwarded to the emulator
    /// and counted by statistics, in that order.
    pub async fn submit_input(&self, input: UserInput) -> InputOutcome {
        let outcome = {
            let settings = self.settings.read().await;
            self.gate.admit(&*settings, &input)
        };

        self.metrics.record_input(outcome);

        if outcome.is_accepted() {
            self.collaborators.renderer.record_input(&input);
            self.collaborators.emulator.click_button(input.button);
            self.collaborators.statistics.on_input(&input);
        } else {
            tracing::debug!(
                actor = %input.actor,
                button = %input.button,
                outcome = ?outcome,
                "Input rejected"
            );
        }

        outcome
    }

    /// Show the game on the local display
    pub fn attach_local_observer(&self, with_sound: bool) {
        self.collaborators.display.activate(with_sound);
        self.collaborators
            .renderer
            .add_consumer(Arc::clone(&self.collaborators.display_consumer));

        tracing::info!(with_sound = with_sound, "Local display attached");
    }

    /// Stop showing the game locally and mute the emulator
    pub fn detach_local_observer(&self) {
        self.collaborators
            .renderer
            .remove_consumer(&self.collaborators.display_consumer);
        self.collaborators.display.deactivate();
        self.collaborators.emulator.mute_sound();

        tracing::info!("Local display detached");
    }

    /// Set or clear the overlay message drawn on every frame
    pub fn set_global_message(&self, message: Option<String>) -> Result<()> {
        let message = non_empty(message, "global")?;
        self.collaborators.renderer.set_global_message(message);
        Ok(())
    }

    /// Set or clear the status text of a single destination
    pub async fn set_destination_message(
        &self,
        community: CommunityId,
        message: Option<String>,
    ) -> Result<DeliveryReport> {
        let message = non_empty(message, "destination")?;
        let destination = self
            .registry
            .lookup(community)
            .await
            .ok_or(RegistryError::DestinationNotFound(community))?;

        let report = self
            .fanout
            .deliver_to(&destination, &Payload::status_text(message))
            .await;

        if !report.removed.is_empty() {
            return Err(RegistryError::DestinationNotFound(community).into());
        }

        report.into_result()
    }

    /// Register a destination; one per community
    pub async fn register_destination(&self, destination: Destination) -> Result<()> {
        self.registry.add(destination).await?;
        Ok(())
    }

    /// Remove the destination of a community
    pub async fn unregister_destination(&self, community: CommunityId) -> Result<Destination> {
        Ok(self.registry.remove_community(community).await?)
    }

    /// Destination hosted by a community
    pub async fn destination(&self, community: CommunityId) -> Option<Destination> {
        self.registry.lookup(community).await
    }

    /// All registered destinations
    pub async fn destinations(&self) -> Vec<Destination> {
        self.registry.snapshot().await
    }

    /// Lock or unlock input to owners
    pub fn lock_input_to_owners(&self, locked: bool) {
        self.gate.set_owners_only(locked);
        tracing::info!(locked = locked, "Changed owner input lock");
    }

    /// Whether input is locked to owners
    pub fn input_locked_to_owners(&self) -> bool {
        self.gate.owners_only()
    }

    /// Change the rate-limit window
    pub fn set_rate_limit_window(&self, window: Duration) {
        self.gate.set_window(window);
        tracing::info!(window = ?window, "Changed rate limit window");
    }

    /// Current rate-limit window
    pub fn rate_limit_window(&self) -> Duration {
        self.gate.window()
    }

    /// Current phase
    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase
    }

    /// Whether the session is running
    pub async fn is_running(&self) -> bool {
        self.state.lock().await.is_running()
    }

    /// Snapshot of the runtime counters
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// The persisted settings
    pub fn settings(&self) -> &Arc<SettingsHandle> {
        &self.settings
    }

    /// Grant owner permission
    pub async fn add_owner(&self, actor: ActorId) -> Result<()> {
        self.settings.add_owner(actor).await
    }

    /// Ban an actor; owners cannot be banned
    pub async fn ban_user(&self, actor: ActorId) -> Result<()> {
        self.settings.ban_user(actor).await
    }

    /// Lift a ban
    pub async fn unban_user(&self, actor: ActorId) -> Result<bool> {
        self.settings.unban_user(actor).await
    }

    /// Change the ROM path or the displayed title
    pub async fn set_game_metadata(&self, entity: GameMetadata, value: impl Into<String>) -> Result<()> {
        self.settings.set_game_metadata(entity, value).await
    }

    /// Reset playtime and input counts
    pub async fn clear_statistics(&self) -> Result<()> {
        self.settings.clear_statistics().await
    }
}

fn non_empty(message: Option<String>, target: &'static str) -> Result<Option<String>> {
    match message {
        Some(text) if text.is_empty() => Err(Error::EmptyMessage(target)),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::StatisticsConsumer;
    use crate::config::MemoryStore;
    use crate::gate::Button;
    use crate::transport::MemoryTransport;

    struct Idle;

    impl Emulator for Idle {
        fn start(&self) -> Result<()> {
            Ok(())
        }
        fn stop(&self) {}
        fn click_button(&self, _button: Button) {}
        fn mute_sound(&self) {}
    }

    impl Renderer for Idle {
        fn start(&self) -> Result<()> {
            Ok(())
        }
        fn stop(&self) {}
        fn add_consumer(&self, _consumer: Arc<dyn StreamConsumer>) {}
        fn remove_consumer(&self, _consumer: &Arc<dyn StreamConsumer>) {}
        fn set_global_message(&self, _message: Option<String>) {}
        fn record_input(&self, _input: &UserInput) {}
    }

    impl Statistics for Idle {
        fn on_session_started(&self) {}
        fn on_session_stopped(&self) {}
        fn on_input(&self, _input: &UserInput) {}
        fn add_consumer(&self, _consumer: Arc<dyn StatisticsConsumer>) {}
    }

    impl LocalDisplay for Idle {
        fn activate(&self, _with_sound: bool) {}
        fn deactivate(&self) {}
    }

    impl StreamConsumer for Idle {}

    async fn controller() -> SessionController {
        let settings = SettingsHandle::load(Arc::new(MemoryStore::new()))
            .await
            .unwrap();
        let idle = Arc::new(Idle);
        let collaborators = Collaborators::new(
            idle.clone(),
            idle.clone(),
            idle.clone(),
            idle,
            Arc::new(MemoryTransport::new()),
        );

        SessionController::new(SessionConfig::default(), Arc::new(settings), collaborators)
    }

    #[tokio::test]
    async fn test_lifecycle_preconditions() {
        let controller = controller().await;

        assert!(matches!(controller.stop().await, Err(Error::NotRunning)));

        controller.start().await.unwrap();
        assert_eq!(controller.phase().await, SessionPhase::Running);
        assert!(matches!(controller.start().await, Err(Error::AlreadyRunning)));

        controller.stop().await.unwrap();
        assert_eq!(controller.phase().await, SessionPhase::Stopped);
    }

    #[tokio::test]
    async fn test_empty_messages_rejected() {
        let controller = controller().await;

        assert!(matches!(
            controller.set_global_message(Some(String::new())),
            Err(Error::EmptyMessage("global"))
        ));
        assert!(controller.set_global_message(None).is_ok());

        assert!(matches!(
            controller
                .set_destination_message(CommunityId(1), Some(String::new()))
                .await,
            Err(Error::EmptyMessage("destination"))
        ));
        assert!(matches!(
            controller
                .set_destination_message(CommunityId(1), Some("hi".into()))
                .await,
            Err(Error::Registry(RegistryError::DestinationNotFound(CommunityId(1))))
        ));
    }

    #[tokio::test]
    async fn test_runtime_configuration() {
        let controller = controller().await;

        assert!(!controller.input_locked_to_owners());
        controller.lock_input_to_owners(true);
        assert!(controller.input_locked_to_owners());

        controller.set_rate_limit_window(Duration::from_secs(3));
        assert_eq!(controller.rate_limit_window(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_rate_limit_window_beyond_millisecond_range() {
        let controller = controller().await;

        controller.set_rate_limit_window(Duration::MAX);
        assert_eq!(controller.rate_limit_window(), Duration::MAX);
    }
}
