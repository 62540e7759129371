//! Socket configuration for the relay connection
//!
//! The feed socket stays open indefinitely with no read timeout; TCP
//! keepalive is what eventually surfaces a silently dead peer.

use std::io;
use tokio::net::TcpStream;
use tracing::debug;

use crate::connection_error::ConnectionError;

/// Apply feed-socket options using socket2
pub fn configure_feed_socket(stream: &TcpStream) -> Result<(), ConnectionError> {
    use socket2::SockRef;

    let sock_ref = SockRef::from(stream);

    sock_ref
        .set_keepalive(true)
        .map_err(|source| socket_config_error("keepalive", source))?;

    // Lines are tiny and arrive continuously
    stream
        .set_nodelay(true)
        .map_err(|source| socket_config_error("nodelay", source))?;

    debug!(
        peer = ?stream.peer_addr().ok(),
        "Configured feed socket (keepalive, nodelay)"
    );
    Ok(())
}

fn socket_config_error(operation: &str, source: io::Error) -> ConnectionError {
    ConnectionError::SocketConfig {
        operation: operation.to_string(),
        source,
    }
}
