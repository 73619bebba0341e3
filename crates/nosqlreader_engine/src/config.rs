//! Configuration for the reader connection.

use std::time::Duration;

/// Default pause between a failure and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Configuration for a [`DataReaderConnection`](crate::DataReaderConnection).
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Application name sent with the greeting.
    pub app_name: String,
    /// Client version sent with the greeting.
    pub app_version: String,
    /// Back-off interval after any loop failure.
    pub reconnect_delay: Duration,
}

impl ReaderConfig {
    /// Creates a new configuration.
    pub fn new(app_name: impl Into<String>, app_version: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            app_version: app_version.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    /// Sets the back-off interval.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self::new("nosqlreader", env!("CARGO_PKG_VERSION"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config =
            ReaderConfig::new("billing", "1.2.3").with_reconnect_delay(Duration::from_millis(250));

        assert_eq!(config.app_name, "billing");
        assert_eq!(config.app_version, "1.2.3");
        assert_eq!(config.reconnect_delay, Duration::from_millis(250));
    }

    #[test]
    fn default_config() {
        let config = ReaderConfig::default();
        assert_eq!(config.reconnect_delay, DEFAULT_RECONNECT_DELAY);
        assert_eq!(config.app_version, env!("CARGO_PKG_VERSION"));
    }
}
