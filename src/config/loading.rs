//! Configuration loading from files and environment variables
//!
//! Environment variables take precedence over the file so container
//! deployments can inject credentials without editing it.

use std::path::Path;

use anyhow::{Context, Result};

use super::types::{Config, PollConfig, RetryConfig, UpstreamConfig};
use crate::types::{HostName, Password, Port, Username};

/// Prefix shared by every override variable
///
/// - `AIS_UPSTREAM_HOST`
/// - `AIS_UPSTREAM_PORT`
/// - `AIS_UPSTREAM_USERNAME`
/// - `AIS_UPSTREAM_PASSWORD`
pub const ENV_PREFIX: &str = "AIS_UPSTREAM_";

/// Apply upstream overrides looked up through `lookup`
///
/// `lookup` receives the full variable name. Passing `|key| std::env::var(key).ok()`
/// reads the process environment; tests pass a map instead.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |suffix: &str| {
        let key = format!("{ENV_PREFIX}{suffix}");
        lookup(&key).map(|value| (key, value))
    };

    if let Some((key, value)) = var("HOST") {
        config.upstream.host =
            HostName::new(value).with_context(|| format!("Invalid value in {key}"))?;
    }
    if let Some((key, value)) = var("PORT") {
        let port: u16 = value
            .trim()
            .parse()
            .with_context(|| format!("Invalid port '{value}' in {key}"))?;
        config.upstream.port = Port::try_from(port).with_context(|| format!("Invalid {key}"))?;
    }
    if let Some((key, value)) = var("USERNAME") {
        config.upstream.username =
            Username::new(value).with_context(|| format!("Invalid value in {key}"))?;
    }
    if let Some((key, value)) = var("PASSWORD") {
        config.upstream.password =
            Password::new(value).with_context(|| format!("Invalid value in {key}"))?;
    }
    Ok(())
}

/// Load configuration from a TOML file, with environment variable overrides
pub fn load_config(config_path: &Path) -> Result<Config> {
    let config_content = std::fs::read_to_string(config_path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read config file '{}': {}",
            config_path.display(),
            e
        )
    })?;

    let mut config: Config = toml::from_str(&config_content).map_err(|e| {
        anyhow::anyhow!(
            "Failed to parse config file '{}': {}",
            config_path.display(),
            e
        )
    })?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;

    Ok(config)
}

/// Configuration written when no file exists yet
#[must_use]
pub fn create_default_config() -> Config {
    Config {
        upstream: UpstreamConfig {
            host: HostName::new("ais.example.com".to_string()).expect("host is non-empty"),
            port: Port::default(),
            username: Username::new("anonymous".to_string()).expect("username has no NUL"),
            password: Password::new(String::new()).expect("password has no NUL"),
        },
        retry: RetryConfig::default(),
        poll: PollConfig::default(),
    }
}
