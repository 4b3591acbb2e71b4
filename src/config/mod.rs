//! Configuration
//!
//! Two layers live here: [`SessionConfig`] holds the runtime knobs of the
//! core, while [`Settings`] is the persisted document behind a
//! [`SettingsStore`].

pub mod session;
pub mod settings;
pub mod store;

pub use session::SessionConfig;
pub use settings::{GameMetadata, InputCount, Settings, SettingsHandle};
pub use store::{JsonFileStore, MemoryStore, SettingsError, SettingsStore};
