//! Dispatch configuration.

use std::time::Duration;

/// Configuration for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Timeout applied to each backend attempt independently.
    pub attempt_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl DispatchConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-attempt timeout.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        assert_eq!(DispatchConfig::default().attempt_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_config_builder() {
        let config = DispatchConfig::new().with_attempt_timeout(Duration::from_millis(250));
        assert_eq!(config.attempt_timeout, Duration::from_millis(250));
    }
}
