//! Control client configuration

use std::time::Duration;

/// Default bound on a single SOAP exchange
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default `ContinuousMove` duration in seconds
pub const DEFAULT_MOVE_TIMEOUT_SECS: f64 = 1.0;

/// ONVIF control client configuration
#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// Bound on one request, connect through response body
    pub request_timeout: Duration,

    /// Bound on establishing the TCP connection
    pub connect_timeout: Duration,

    /// Move duration used when the caller gives none
    pub default_move_timeout: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: Duration::from_secs(5),
            default_move_timeout: DEFAULT_MOVE_TIMEOUT_SECS,
        }
    }
}

impl ControlConfig {
    /// Set the per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        // A connect bound longer than the whole request is meaningless
        self.connect_timeout = self.connect_timeout.min(timeout);
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the default move duration; non-positive values are ignored
    pub fn default_move_timeout(mut self, secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            self.default_move_timeout = secs;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ControlConfig::default();

        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.default_move_timeout, 1.0);
    }

    #[test]
    fn test_short_request_timeout_caps_connect() {
        let config = ControlConfig::default().request_timeout(Duration::from_millis(300));

        assert_eq!(config.request_timeout, Duration::from_millis(300));
        assert_eq!(config.connect_timeout, Duration::from_millis(300));
    }

    #[test]
    fn test_default_move_timeout() {
        let config = ControlConfig::default().default_move_timeout(0.5);
        assert_eq!(config.default_move_timeout, 0.5);

        for bad in [0.0, -2.0, f64::NAN] {
            let config = ControlConfig::default().default_move_timeout(bad);
            assert_eq!(config.default_move_timeout, 1.0);
        }
    }
}
