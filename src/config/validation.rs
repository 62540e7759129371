//! Configuration validation
//!
//! Host, port and credential shape are enforced by the field types. What
//! remains are range checks that only warrant a warning.

use anyhow::Result;

use super::types::Config;
use crate::constants::timing::{MAX_RECOMMENDED_RETRY_DELAY, MIN_RECOMMENDED_RETRY_DELAY};

impl Config {
    /// Validate configuration for correctness
    ///
    /// Currently only warns:
    /// - retry delay outside the recommended range
    /// - zero poll interval
    pub fn validate(&self) -> Result<()> {
        let delay = self.retry.delay;
        if delay < MIN_RECOMMENDED_RETRY_DELAY {
            tracing::warn!(
                "Retry delay is set to {:?} (< {:?}). An unreachable relay will be \
                 redialed in a tight loop.",
                delay,
                MIN_RECOMMENDED_RETRY_DELAY
            );
        } else if delay > MAX_RECOMMENDED_RETRY_DELAY {
            tracing::warn!(
                "Retry delay is set to {:?} (> {:?}). Outages will leave long gaps \
                 in the feed.",
                delay,
                MAX_RECOMMENDED_RETRY_DELAY
            );
        }

        if self.poll.interval.is_zero() {
            tracing::warn!("Poll interval is 0; the consumer will drain continuously");
        }

        Ok(())
    }
}
