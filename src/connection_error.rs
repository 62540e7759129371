//! Connection error types for the AIS feed client
//!
//! Every variant is a transient failure: the connector logs it, drops the
//! socket and redials after the retry delay. None of them reach the consumer.

use std::fmt;

/// Errors that can occur while connecting to or reading from the relay
#[derive(Debug)]
#[non_exhaustive]
pub enum ConnectionError {
    /// Every resolved address refused or timed out
    TcpConnect {
        host: String,
        port: u16,
        source: std::io::Error,
    },

    /// DNS resolution failed or returned no addresses
    DnsResolution {
        address: String,
        source: std::io::Error,
    },

    /// Socket configuration failed (keepalive, etc.)
    SocketConfig {
        operation: String,
        source: std::io::Error,
    },

    /// Writing the login handshake failed
    Handshake {
        address: String,
        source: std::io::Error,
    },

    /// Relay closed the stream
    StreamClosed { address: String },

    /// I/O error while reading lines
    IoError(std::io::Error),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TcpConnect { host, port, source } => {
                write!(f, "Failed to dial AIS relay {}:{}: {}", host, port, source)
            }
            Self::DnsResolution { address, source } => {
                write!(f, "Could not resolve relay address {}: {}", address, source)
            }
            Self::SocketConfig { operation, source } => {
                write!(f, "Could not set {} on feed socket: {}", operation, source)
            }
            Self::Handshake { address, source } => {
                write!(f, "Failed to send login to {}: {}", address, source)
            }
            Self::StreamClosed { address } => {
                write!(f, "Stream closed by {}", address)
            }
            Self::IoError(e) => write!(f, "Feed read failed: {}", e),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TcpConnect { source, .. } => Some(source),
            Self::DnsResolution { source, .. } => Some(source),
            Self::SocketConfig { source, .. } => Some(source),
            Self::Handshake { source, .. } => Some(source),
            Self::IoError(e) => Some(e),
            Self::StreamClosed { .. } => None,
        }
    }
}

impl ConnectionError {
    /// Check if the relay simply hung up
    #[must_use]
    pub const fn is_stream_closed(&self) -> bool {
        matches!(self, Self::StreamClosed { .. })
    }

    /// Whether the relay could not be reached at all
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::TcpConnect { .. } | Self::DnsResolution { .. })
    }

    /// Level used when logging a lost connection
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        match self {
            // Relays recycle connections routinely
            Self::StreamClosed { .. } => tracing::Level::INFO,
            Self::IoError(e) if e.kind() == std::io::ErrorKind::ConnectionReset => {
                tracing::Level::INFO
            }
            Self::SocketConfig { .. } => tracing::Level::ERROR,
            _ => tracing::Level::WARN,
        }
    }
}

impl From<std::io::Error> for ConnectionError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err)
    }
}
