//! Command-line arguments for the feed consumer binary

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::Config;
use crate::types::{HostName, Password, Port, Username};

/// Parse port from command line argument
fn parse_port(s: &str) -> Result<Port, String> {
    let port: u16 = s
        .parse()
        .map_err(|e| format!("Invalid port number: {}", e))?;
    Port::try_from(port).map_err(|e| format!("Invalid port: {}", e))
}

fn parse_host(s: &str) -> Result<HostName, String> {
    HostName::try_from(s).map_err(|e| e.to_string())
}

fn parse_username(s: &str) -> Result<Username, String> {
    Username::try_from(s).map_err(|e| e.to_string())
}

fn parse_password(s: &str) -> Result<Password, String> {
    Password::try_from(s).map_err(|e| e.to_string())
}

/// Read AIS sentences from a relay and print them to stdout
#[derive(Parser, Debug, Clone)]
#[command(name = "ais-feed", version, about)]
pub struct FeedArgs {
    /// Configuration file path (created with defaults if missing)
    #[arg(short, long, default_value = "ais-feed.toml", env = "AIS_FEED_CONFIG")]
    pub config: PathBuf,

    /// Relay host (overrides config file)
    #[arg(long, env = "AIS_FEED_HOST", value_parser = parse_host)]
    pub host: Option<HostName>,

    /// Relay port (overrides config file)
    #[arg(short, long, env = "AIS_FEED_PORT", value_parser = parse_port)]
    pub port: Option<Port>,

    /// Login name (overrides config file)
    #[arg(short, long, env = "AIS_FEED_USERNAME", value_parser = parse_username)]
    pub username: Option<Username>,

    /// Login password (overrides config file)
    #[arg(long, env = "AIS_FEED_PASSWORD", hide_env_values = true, value_parser = parse_password)]
    pub password: Option<Password>,

    /// Seconds to wait before redialing a lost connection
    #[arg(long, env = "AIS_FEED_RETRY_DELAY")]
    pub retry_delay: Option<u64>,

    /// Seconds between buffer drains
    #[arg(long, env = "AIS_FEED_POLL_INTERVAL")]
    pub poll_interval: Option<u64>,

    /// Also write logs to this file
    #[arg(long, env = "AIS_FEED_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl FeedArgs {
    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.upstream.host = host.clone();
        }
        if let Some(port) = self.port {
            config.upstream.port = port;
        }
        if let Some(username) = &self.username {
            config.upstream.username = username.clone();
        }
        if let Some(password) = &self.password {
            config.upstream.password = password.clone();
        }
        if let Some(secs) = self.retry_delay {
            config.retry.delay = Duration::from_secs(secs);
        }
        if let Some(secs) = self.poll_interval {
            config.poll.interval = Duration::from_secs(secs);
        }
    }
}
