//! Transport configuration

use std::time::Duration;

/// Timeouts applied to every certification request.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Time allowed to establish the TCP connection.
    pub connect_timeout: Duration,
    /// Time allowed for the whole exchange, connection included.
    pub request_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.connect_timeout.is_zero() {
            return Err("connect_timeout must be greater than zero".to_string());
        }
        if self.request_timeout < self.connect_timeout {
            return Err("request_timeout must be at least connect_timeout".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(TransportConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_timeouts() {
        let config = TransportConfig {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(1),
        };
        assert!(config.validate().is_err());
    }
}
