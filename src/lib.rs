//! Session-control core for a crowd-played emulator
//!
//! Many remote actors press buttons on one shared emulated game while its
//! rendered output is rebroadcast into chat communities. This crate holds the
//! part in between:
//!
//! - [`gate`] turns concurrent input from untrusted actors into a rate-limited
//!   stream of button presses,
//! - [`registry`] tracks one broadcast destination per community and keeps it
//!   persisted,
//! - [`broadcast`] fans gifs and statistics text out to every destination,
//! - [`session`] drives the emulator and renderer through their lifecycle.
//!
//! The emulator, renderer, statistics aggregator, local display, chat
//! transport and settings storage are external; [`collab`], [`transport`]
//! and [`config`] describe what the core needs from them.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use crowdplay::config::{JsonFileStore, SessionConfig, SettingsHandle};
//! use crowdplay::gate::{Button, UserInput};
//! use crowdplay::id::ActorId;
//! use crowdplay::session::{Collaborators, SessionController};
//!
//! # async fn run(collaborators: Collaborators) -> crowdplay::Result<()> {
//! let store = Arc::new(JsonFileStore::new("settings.json"));
//! let settings = Arc::new(SettingsHandle::load(store).await?);
//! let controller = SessionController::new(SessionConfig::default(), settings, collaborators);
//!
//! controller.start().await?;
//! let outcome = controller
//!     .submit_input(UserInput::now(ActorId(42), Button::Up))
//!     .await;
//! println!("{}", outcome);
//! controller.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod broadcast;
pub mod collab;
pub mod config;
pub mod error;
pub mod gate;
pub mod id;
pub mod registry;
pub mod session;
pub mod stats;
pub mod transport;

pub use broadcast::{DeliveryFault, DeliveryReport, FanoutEngine, Payload, PayloadKind};
pub use config::{SessionConfig, Settings, SettingsHandle};
pub use error::{Error, Result};
pub use gate::{Button, InputGate, InputOutcome, UserInput};
pub use id::{ActorId, CommunityId};
pub use registry::{Destination, DestinationDescriptor, DestinationRegistry, MessageRef};
pub use session::{Collaborators, SessionController, SessionPhase};
pub use transport::{MessageHandle, MessageTransport, TransportError};
