//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{Endpoint, HostName, Password, Port, Username, duration_serde};

/// Top-level feed configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Relay to read from
    pub upstream: UpstreamConfig,
    /// Reconnect behaviour
    #[serde(default)]
    pub retry: RetryConfig,
    /// Consumer polling
    #[serde(default)]
    pub poll: PollConfig,
}

/// Address and credentials of the AIS relay
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpstreamConfig {
    pub host: HostName,
    #[serde(default)]
    pub port: Port,
    pub username: Username,
    pub password: Password,
}

impl UpstreamConfig {
    /// Endpoint handed to `open`
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(
            self.host.clone(),
            self.port,
            self.username.clone(),
            self.password.clone(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Pause between a lost connection and the next dial
    #[serde(with = "duration_serde")]
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delay: super::defaults::retry_delay(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollConfig {
    /// Pause between drains of the sentence buffer
    #[serde(with = "duration_serde")]
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: super::defaults::poll_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [upstream]
        host = "ais.example.com"
        username = "observer"
        password = "secret"
    "#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();

        assert_eq!(config.upstream.host.as_str(), "ais.example.com");
        assert_eq!(config.upstream.port, Port::default());
        assert_eq!(config.retry.delay, Duration::from_secs(10));
        assert_eq!(config.poll.interval, Duration::from_secs(5));
    }

    #[test]
    fn test_full_config() {
        let config: Config = toml::from_str(
            r#"
            [upstream]
            host = "10.0.0.7"
            port = 5631
            username = "observer"
            password = "secret"

            [retry]
            delay = 30

            [poll]
            interval = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.port.get(), 5631);
        assert_eq!(config.retry.delay, Duration::from_secs(30));
        assert_eq!(config.poll.interval, Duration::from_secs(1));
    }

    #[test]
    fn test_missing_upstream_rejected() {
        assert!(toml::from_str::<Config>("[retry]\ndelay = 3\n").is_err());
    }

    #[test]
    fn test_blank_host_rejected() {
        let text = MINIMAL.replace("ais.example.com", "  ");
        assert!(toml::from_str::<Config>(&text).is_err());
    }

    #[test]
    fn test_endpoint_from_upstream() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        let endpoint = config.upstream.endpoint();

        assert_eq!(endpoint.address(), "ais.example.com:4712");
        assert_eq!(endpoint.username.as_str(), "observer");
        assert_eq!(endpoint.password.as_str(), "secret");
    }

    #[test]
    fn test_serialize_round_trip() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(toml::from_str::<Config>(&text).unwrap(), config);
    }
}
