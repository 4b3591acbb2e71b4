//! Session lifecycle
//!
//! [`SessionController`] is the entry point for the command-handling layer.
//! It is meant to be shared behind an `Arc` and called from many tasks at
//! once.

pub mod controller;
pub mod state;

pub use controller::{Collaborators, SessionController};
pub use state::{SessionPhase, SessionState};
