//! Configuration module
//!
//! Configuration types, defaults, loading and validation for the feed
//! consumer.

mod defaults;
mod loading;
mod types;
mod validation;

pub use loading::{ENV_PREFIX, apply_env_overrides, create_default_config, load_config};
pub use types::{Config, PollConfig, RetryConfig, UpstreamConfig};

pub use defaults::{poll_interval, retry_delay};
