//! Input admission
//!
//! Many actors press buttons at once; the gate turns that into the trickle
//! of inputs the emulator actually receives. It owns no I/O: callers forward
//! accepted inputs themselves.

pub mod cache;
pub mod input;
pub mod policy;

pub use cache::RateLimitCache;
pub use input::{Button, UserInput};
pub use policy::{AccessPolicy, InputGate, InputOutcome};
