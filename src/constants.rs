//! Constants used throughout the AIS feed client
//!
//! Wire-level markers, framing rules and timing defaults live here so the
//! session, assembler and connector agree on them.

use std::time::Duration;

/// Login handshake bytes
///
/// The upstream relay expects `0x01 <username> 0x00 <password> 0x00`
/// immediately after the TCP connection is established.
pub mod handshake {
    /// Start-of-heading byte that opens the login handshake
    pub const LOGIN_START: u8 = 0x01;

    /// Terminator written after both the username and the password
    pub const FIELD_TERMINATOR: u8 = 0x00;
}

/// Framing rules for inbound comma-separated lines
pub mod framing {
    /// Field separator within a line
    pub const FIELD_SEPARATOR: char = ',';

    /// Lines with fewer fields than this are discarded outright
    pub const MIN_FIELDS: usize = 5;

    /// Talker/sentence tag that is always ignored
    pub const IGNORED_TALKER: &str = "$ABVSI";

    /// Index of the fragment-total field
    pub const FRAGMENT_TOTAL_FIELD: usize = 1;

    /// Index of the fragment-number field
    pub const FRAGMENT_NUMBER_FIELD: usize = 2;

    /// Index of the payload field
    pub const PAYLOAD_FIELD: usize = 5;

    /// Fragment total that marks a line as part of a multi-part message
    ///
    /// Only this exact value triggers accumulation. Messages announcing any
    /// other total are treated as single-part.
    pub const MULTIPART_FRAGMENT_TOTAL: i32 = 2;

    /// Longest line kept, excluding its terminator
    ///
    /// Longer lines are discarded up to the next terminator.
    pub const MAX_LINE_LENGTH: usize = 4 * 1024;
}

/// Accepted message types, keyed by the first payload character
pub mod message_type {
    /// Position report, message type 0
    pub const TYPE_0: char = '0';
    /// Position report class A, message type 1
    pub const TYPE_1: char = '1';
    /// Position report class A (assigned schedule), message type 2
    pub const TYPE_2: char = '2';
    /// Standard class B position report, message type 18
    pub const TYPE_18: char = 'B';
}

/// Connection and retry timing
pub mod timing {
    use super::Duration;

    /// Delay between reconnect attempts
    pub const RETRY_DELAY: Duration = Duration::from_secs(10);

    /// Retry delays below this cause connection churn against the relay
    pub const MIN_RECOMMENDED_RETRY_DELAY: Duration = Duration::from_secs(1);

    /// Retry delays above this leave the feed dark for too long
    pub const MAX_RECOMMENDED_RETRY_DELAY: Duration = Duration::from_secs(300);

    /// Default interval at which the CLI drains the buffer
    pub const POLL_INTERVAL: Duration = Duration::from_secs(5);
}

/// Socket tuning
pub mod socket {
    /// Initial capacity of the per-session line buffer
    pub const LINE_BUFFER_CAPACITY: usize = 256;

    /// BufReader capacity for the inbound stream (16KB)
    pub const READER_CAPACITY: usize = 16 * 1024;
}

/// Default port of the upstream relay
pub const DEFAULT_UPSTREAM_PORT: u16 = 4712;
