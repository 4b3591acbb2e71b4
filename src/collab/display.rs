//! Local physical display port

/// A screen attached to the host machine
pub trait LocalDisplay: Send + Sync {
    /// Open the display, optionally with sound
    fn activate(&self, with_sound: bool);

    /// Close the display
    fn deactivate(&self);
}
