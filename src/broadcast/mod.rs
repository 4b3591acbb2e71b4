//! Broadcast fan-out
//!
//! Two independent streams reach the chat destinations: gifs from the
//! renderer end up as the stream message attachment, statistics text ends up
//! in the status message. Both go through [`FanoutEngine`].

pub mod engine;
pub mod payload;

pub use engine::{DeliveryFault, DeliveryReport, FanoutEngine};
pub use payload::{Payload, PayloadKind};
