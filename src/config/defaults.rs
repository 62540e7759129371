//! Default values for configuration fields
//!
//! Used by serde when a field is missing from the file.

use std::time::Duration;

use crate::constants::timing::{POLL_INTERVAL, RETRY_DELAY};

/// Default delay between reconnect attempts
#[inline]
pub fn retry_delay() -> Duration {
    RETRY_DELAY
}

/// Default interval between buffer drains in the CLI consumer
#[inline]
pub fn poll_interval() -> Duration {
    POLL_INTERVAL
}
