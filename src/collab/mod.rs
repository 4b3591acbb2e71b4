//! External collaborators
//!
//! The emulator, renderer, statistics aggregator and local display live
//! outside the core. This module only describes what the core calls on them
//! and what they call back into.
//!
//! ```text
//!   SessionController ──start/stop/click──▶ Emulator
//!          │
//!          ├──start/stop/overlay──▶ Renderer ──frame/gif──▶ [StreamConsumer]
//!          │                                                  FanoutEngine
//!          │                                                  LocalDisplay
//!          │
//!          └──lifecycle/input──▶ Statistics ──text──▶ [StatisticsConsumer]
//!                                                       FanoutEngine
//! ```

pub mod display;
pub mod emulator;
pub mod renderer;
pub mod statistics;
pub mod subscribers;

pub use display::LocalDisplay;
pub use emulator::Emulator;
pub use renderer::{Frame, Renderer, StreamConsumer};
pub use statistics::{Statistics, StatisticsConsumer};
pub use subscribers::Subscribers;
