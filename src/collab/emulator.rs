//! Emulator port

use crate::error::Result;
use crate::gate::Button;

/// The emulated machine
///
/// The emulator runs its own loop; the core only starts and stops it and
/// feeds it one button press at a time.
pub trait Emulator: Send + Sync {
    /// Boot the loaded game
    fn start(&self) -> Result<()>;

    /// Halt the machine
    fn stop(&self);

    /// Press and release a button
    fn click_button(&self, button: Button);

    /// Silence audio output
    fn mute_sound(&self);
}
