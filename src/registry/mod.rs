//! Destination registry
//!
//! The registry tracks which communities host the broadcast and where. It is
//! the only owner of live destination handles; everyone else works on
//! snapshots.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<DestinationRegistry>
//!                  ┌──────────────────────────────┐
//!                  │ destinations: BTreeMap<      │
//!                  │   CommunityId, Destination { │
//!                  │     stream, status           │
//!                  │   }                          │
//!                  │ >                            │
//!                  └──────┬─────────────────┬─────┘
//!                         │                 │
//!              add/remove │                 │ snapshot()
//!                         ▼                 ▼
//!                 SettingsHandle      FanoutEngine
//!              (descriptors, saved)  (one task per destination)
//! ```
//!
//! # Persistence
//!
//! Every add or remove rewrites the whole descriptor set into the settings
//! document. On start the registry is rebuilt from those descriptors and
//! anything that no longer resolves is dropped for good.

pub mod descriptor;
pub mod entry;
pub mod error;
pub mod store;

pub use descriptor::{DestinationDescriptor, MessageRef};
pub use entry::Destination;
pub use error::RegistryError;
pub use store::DestinationRegistry;
