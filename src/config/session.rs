//! Session configuration

use std::time::Duration;

use bytes::Bytes;

/// Cover shown on every destination while the session is stopped
pub const OFFLINE_COVER: &[u8] = include_bytes!("../../assets/currently_offline.png");

/// Default minimum time between two accepted inputs of one actor
pub const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_millis(1_500);

/// Default number of actors tracked by the rate-limit cache
pub const DEFAULT_INPUT_CACHE_CAPACITY: usize = 1_000;

/// Session configuration options
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Minimum time between two accepted inputs of the same actor
    pub rate_limit_window: Duration,

    /// Maximum number of actors tracked by the rate-limit cache
    pub input_cache_capacity: usize,

    /// Start with input locked to owners
    pub lock_input_to_owners: bool,

    /// Image broadcast when the session stops
    pub offline_image: Bytes,

    /// Attachment name of the offline image
    pub offline_image_name: String,

    /// Attachment name of rendered gifs
    pub gif_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rate_limit_window: DEFAULT_RATE_LIMIT_WINDOW,
            input_cache_capacity: DEFAULT_INPUT_CACHE_CAPACITY,
            lock_input_to_owners: false,
            offline_image: Bytes::from_static(OFFLINE_COVER),
            offline_image_name: "stream.png".to_string(),
            gif_name: "image.gif".to_string(),
        }
    }
}

impl SessionConfig {
    /// Set the rate-limit window
    pub fn rate_limit_window(mut self, window: Duration) -> Self {
        self.rate_limit_window = window;
        self
    }

    /// Set the rate-limit cache capacity (at least 1)
    pub fn input_cache_capacity(mut self, capacity: usize) -> Self {
        self.input_cache_capacity = capacity.max(1);
        self
    }

    /// Start with input locked to owners
    pub fn lock_input_to_owners(mut self, lock: bool) -> Self {
        self.lock_input_to_owners = lock;
        self
    }

    /// Set the offline image and its attachment name
    pub fn offline_image(mut self, name: impl Into<String>, data: Bytes) -> Self {
        self.offline_image_name = name.into();
        self.offline_image = data;
        self
    }

    /// Set the attachment name used for gifs
    pub fn gif_name(mut self, name: impl Into<String>) -> Self {
        self.gif_name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();

        assert_eq!(config.rate_limit_window, Duration::from_millis(1_500));
        assert_eq!(config.input_cache_capacity, 1_000);
        assert!(!config.lock_input_to_owners);
        assert_eq!(config.offline_image_name, "stream.png");
        assert_eq!(config.gif_name, "image.gif");
        assert!(config.offline_image.starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_builder_capacity_floor() {
        let config = SessionConfig::default().input_cache_capacity(0);

        assert_eq!(config.input_cache_capacity, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = SessionConfig::default()
            .rate_limit_window(Duration::from_secs(3))
            .input_cache_capacity(10)
            .lock_input_to_owners(true)
            .offline_image("offline.png", Bytes::from_static(b"png"))
            .gif_name("frames.gif");

        assert_eq!(config.rate_limit_window, Duration::from_secs(3));
        assert_eq!(config.input_cache_capacity, 10);
        assert!(config.lock_input_to_owners);
        assert_eq!(config.offline_image_name, "offline.png");
        assert_eq!(config.offline_image, Bytes::from_static(b"png"));
        assert_eq!(config.gif_name, "frames.gif");
    }
}
