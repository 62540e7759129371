//! Core types shared across the feed client
//!
//! Endpoint description, handle identifiers and the observable session state.

pub mod config;
pub mod validated;

pub use config::{Port, duration_serde};
pub use validated::{HostName, Password, Username, ValidationError};

use std::fmt;
use uuid::Uuid;

/// Where and how to connect to the upstream relay
///
/// Immutable once a session starts; supplied once per `open()` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: HostName,
    pub port: Port,
    pub username: Username,
    pub password: Password,
}

impl Endpoint {
    #[must_use]
    pub fn new(host: HostName, port: Port, username: Username, password: Password) -> Self {
        Self {
            host,
            port,
            username,
            password,
        }
    }

    /// Build an endpoint from raw values, validating each one
    pub fn parse(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            host: HostName::try_from(host)?,
            port: Port::try_from(port)?,
            username: Username::try_from(username)?,
            password: Password::try_from(password)?,
        })
    }

    /// `host:port` form used for DNS resolution and logging
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Unique identifier for consumer-facing connection handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(Uuid);

impl HandleId {
    /// Generate a new unique handle ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Observable lifecycle of the feed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SessionState {
    /// Never opened
    #[default]
    Idle = 0,
    /// Dialing the relay
    Connecting = 1,
    /// Handshake sent
    Authenticated = 2,
    /// Receiving lines
    Reading = 3,
    /// Connection lost, waiting out the retry delay
    Closing = 4,
    /// Loop exited
    Stopped = 5,
}

impl SessionState {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode a value previously produced by [`SessionState::as_u8`]
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Authenticated,
            3 => Self::Reading,
            4 => Self::Closing,
            5 => Self::Stopped,
            _ => Self::Idle,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Authenticated => "authenticated",
            Self::Reading => "reading",
            Self::Closing => "closing",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
