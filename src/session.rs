//! One physical connection to the AIS relay
//!
//! A session dials the relay, sends the login handshake and then reads
//! lines until the stream ends, an I/O error occurs or a stop is requested.
//! It never retries on its own; every failure goes back to the connector.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, lookup_host};
use tokio::sync::watch;
use tracing::{debug, info, trace};

use crate::buffer::SentenceBuffer;
use crate::connection_error::ConnectionError;
use crate::constants::handshake::{FIELD_TERMINATOR, LOGIN_START};
use crate::constants::framing::MAX_LINE_LENGTH;
use crate::constants::socket::READER_CAPACITY;
use crate::frame::{Frame, FrameAssembler, SkipReason};
use crate::line::{LineReader, RawLine};
use crate::network::configure_feed_socket;
use crate::sentence;
use crate::status::FeedStatus;
use crate::types::{Endpoint, Password, SessionState, Username};

/// How a session ended without an I/O failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Relay closed the stream cleanly
    EndOfStream,
    /// Stop was requested
    Stopped,
}

/// What happened to a single inbound line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// Completed sentence enqueued
    Accepted,
    /// Completed sentence dropped by the type filter
    Filtered,
    /// Fragment stored, waiting for the rest
    Pending,
    /// Line dropped before reassembly
    Skipped(SkipReason),
}

/// Build the login handshake: `0x01 user 0x00 password 0x00`
#[must_use]
pub fn login_handshake(username: &Username, password: &Password) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(username.len() + password.len() + 3);
    bytes.push(LOGIN_START);
    bytes.extend_from_slice(username.as_bytes());
    bytes.push(FIELD_TERMINATOR);
    bytes.extend_from_slice(password.as_bytes());
    bytes.push(FIELD_TERMINATOR);
    bytes
}

/// Resolve and dial the relay, returning a configured stream
pub async fn connect(endpoint: &Endpoint) -> Result<TcpStream, ConnectionError> {
    let host = endpoint.host.as_str();
    let port = endpoint.port.get();

    let addrs: Vec<_> = lookup_host((host, port))
        .await
        .map_err(|source| ConnectionError::DnsResolution {
            address: endpoint.address(),
            source,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(ConnectionError::DnsResolution {
            address: endpoint.address(),
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses resolved"),
        });
    }

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                configure_feed_socket(&stream)?;
                return Ok(stream);
            }
            Err(e) => {
                debug!(%addr, error = %e, "Connect attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(ConnectionError::TcpConnect {
        host: host.to_string(),
        port,
        source: last_error.unwrap_or_else(|| io::Error::other("no address could be dialed")),
    })
}

/// Write and flush the login handshake before anything is read
pub async fn authenticate<W>(writer: &mut W, endpoint: &Endpoint) -> Result<(), ConnectionError>
where
    W: AsyncWrite + Unpin,
{
    let handshake = login_handshake(&endpoint.username, &endpoint.password);
    let result = async {
        writer.write_all(&handshake).await?;
        writer.flush().await
    }
    .await;

    result.map_err(|source| ConnectionError::Handshake {
        address: endpoint.address(),
        source,
    })
}

/// Resolve once a stop has been requested
///
/// A dropped sender means the owning connector is gone, which also counts.
pub(crate) async fn wait_for_stop(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}

/// Owns one socket from connect to close
#[derive(Debug)]
pub struct ConnectionSession {
    endpoint: Endpoint,
    assembler: FrameAssembler,
    buffer: SentenceBuffer,
    status: Arc<FeedStatus>,
}

impl ConnectionSession {
    #[must_use]
    pub fn new(endpoint: Endpoint, buffer: SentenceBuffer, status: Arc<FeedStatus>) -> Self {
        Self {
            endpoint,
            assembler: FrameAssembler::new(),
            buffer,
            status,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Connect, authenticate and read until the session ends
    ///
    /// The socket is released when this returns, whatever the outcome.
    pub async fn run(
        &mut self,
        stop: &mut watch::Receiver<bool>,
    ) -> Result<SessionEnd, ConnectionError> {
        self.status.set_state(SessionState::Connecting);
        let mut stream = tokio::select! {
            biased;
            _ = wait_for_stop(stop) => return Ok(SessionEnd::Stopped),
            stream = connect(&self.endpoint) => stream?,
        };

        // Borrowed halves keep the write side open while reading
        let (read_half, mut write_half) = stream.split();
        tokio::select! {
            biased;
            _ = wait_for_stop(stop) => return Ok(SessionEnd::Stopped),
            sent = authenticate(&mut write_half, &self.endpoint) => sent?,
        }
        self.status.set_state(SessionState::Authenticated);
        self.status.record_session_established();
        info!(
            host = %self.endpoint.host,
            port = %self.endpoint.port,
            user = %self.endpoint.username,
            "AIS connection established"
        );

        let mut reader = BufReader::with_capacity(READER_CAPACITY, read_half);
        self.status.set_state(SessionState::Reading);
        self.read_loop(&mut reader, stop).await
    }

    /// Read lines until end of stream, I/O failure or stop
    pub async fn read_loop<R>(
        &mut self,
        reader: &mut R,
        stop: &mut watch::Receiver<bool>,
    ) -> Result<SessionEnd, ConnectionError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = LineReader::new(MAX_LINE_LENGTH);
        loop {
            let line = tokio::select! {
                biased;
                _ = wait_for_stop(stop) => return Ok(SessionEnd::Stopped),
                line = lines.next_line(reader) => line?,
            };

            match line {
                None => return Ok(SessionEnd::EndOfStream),
                Some(RawLine::Line(bytes)) => {
                    // Relays occasionally emit non-UTF-8 noise
                    let text = String::from_utf8_lossy(bytes);
                    self.process_line(&text);
                }
                Some(RawLine::TooLong(length)) => {
                    self.skip_overlong_line(length);
                }
            }
        }
    }

    /// Account for a line dropped by the length limit
    pub fn skip_overlong_line(&mut self, length: usize) -> LineOutcome {
        trace!(length, limit = MAX_LINE_LENGTH, "Skipped over-long line");
        self.status.record_skipped();
        LineOutcome::Skipped(SkipReason::LineTooLong)
    }

    /// Run one line through reassembly, filtering and buffering
    pub fn process_line(&mut self, line: &str) -> LineOutcome {
        match self.assembler.push_line(line) {
            Frame::Complete(sentence) => {
                if sentence::accepts(&sentence) {
                    self.buffer.enqueue(sentence);
                    self.status.record_accepted();
                    LineOutcome::Accepted
                } else {
                    trace!(sentence = %sentence, "Filtered sentence by message type");
                    self.status.record_filtered();
                    LineOutcome::Filtered
                }
            }
            Frame::Pending => LineOutcome::Pending,
            Frame::Skipped(reason) => {
                trace!(%reason, line, "Skipped line");
                self.status.record_skipped();
                LineOutcome::Skipped(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn test_endpoint() -> Endpoint {
        Endpoint::parse("127.0.0.1", 4712, "user", "secret").unwrap()
    }

    fn test_session() -> (ConnectionSession, SentenceBuffer, Arc<FeedStatus>) {
        let buffer = SentenceBuffer::new();
        let status = Arc::new(FeedStatus::new());
        let session = ConnectionSession::new(test_endpoint(), buffer.clone(), status.clone());
        (session, buffer, status)
    }

    #[test]
    fn test_login_handshake_bytes() {
        let username = Username::try_from("user").unwrap();
        let password = Password::try_from("pw").unwrap();

        assert_eq!(
            login_handshake(&username, &password),
            b"\x01user\x00pw\x00".to_vec()
        );
    }

    #[test]
    fn test_login_handshake_empty_credentials() {
        let username = Username::try_from("").unwrap();
        let password = Password::try_from("").unwrap();

        assert_eq!(login_handshake(&username, &password), vec![0x01, 0x00, 0x00]);
    }

    #[tokio::test]
    async fn test_authenticate_writes_handshake() {
        let mut sink: Vec<u8> = Vec::new();
        authenticate(&mut sink, &test_endpoint()).await.unwrap();
        assert_eq!(sink, b"\x01user\x00secret\x00".to_vec());
    }

    #[test]
    fn test_process_line_outcomes() {
        let (mut session, buffer, status) = test_session();

        assert_eq!(session.process_line("X,1,1,Y,Z,0ABC"), LineOutcome::Accepted);
        assert_eq!(session.process_line("X,1,1,Y,Z,5ABC"), LineOutcome::Filtered);
        assert_eq!(session.process_line("X,2,1,Y,Z,B1"), LineOutcome::Pending);
        assert_eq!(session.process_line("X,2,2,Y,Z,23"), LineOutcome::Accepted);
        assert_eq!(
            session.process_line("garbage"),
            LineOutcome::Skipped(SkipReason::TooFewFields)
        );

        assert_eq!(buffer.drain_all(), vec!["0ABC", "B123"]);
        let stats = status.snapshot();
        assert_eq!(stats.sentences_accepted, 2);
        assert_eq!(stats.sentences_filtered, 1);
        assert_eq!(stats.lines_skipped, 1);
    }

    #[tokio::test]
    async fn test_read_loop_until_end_of_stream() {
        let (mut session, buffer, _status) = test_session();
        let (_stop_tx, mut stop_rx) = watch::channel(false);
        let mut input: &[u8] =
            b"garbage\nX,1,1,Y,Z,0ABC\r\n$ABVSI,1,1,Y,Z,1XYZ\nX,1,1,Y,Z,Bfinal";

        let end = session.read_loop(&mut input, &mut stop_rx).await.unwrap();

        assert_eq!(end, SessionEnd::EndOfStream);
        assert_eq!(buffer.drain_all(), vec!["0ABC", "Bfinal"]);
    }

    #[tokio::test]
    async fn test_read_loop_accepts_bare_carriage_returns() {
        let (mut session, buffer, _status) = test_session();
        let (_stop_tx, mut stop_rx) = watch::channel(false);
        let mut input: &[u8] = b"X,1,1,Y,Z,1CR\rX,2,1,Y,Z,B1\rX,2,2,Y,Z,23\r";

        let end = session.read_loop(&mut input, &mut stop_rx).await.unwrap();

        assert_eq!(end, SessionEnd::EndOfStream);
        assert_eq!(buffer.drain_all(), vec!["1CR", "B123"]);
    }

    #[tokio::test]
    async fn test_read_loop_drops_overlong_line() {
        let (mut session, buffer, status) = test_session();
        let (_stop_tx, mut stop_rx) = watch::channel(false);
        let mut input = b"X,1,1,Y,Z,1".to_vec();
        input.extend(std::iter::repeat_n(b'A', MAX_LINE_LENGTH));
        input.extend_from_slice(b"\nX,1,1,Y,Z,2AFTER\n");
        let mut reader = BufReader::with_capacity(512, input.as_slice());

        let end = session.read_loop(&mut reader, &mut stop_rx).await.unwrap();

        assert_eq!(end, SessionEnd::EndOfStream);
        assert_eq!(buffer.drain_all(), vec!["2AFTER"]);
        assert_eq!(status.snapshot().lines_skipped, 1);
    }

    #[tokio::test]
    async fn test_read_loop_survives_invalid_utf8() {
        let (mut session, buffer, _status) = test_session();
        let (_stop_tx, mut stop_rx) = watch::channel(false);
        let mut input: &[u8] = b"\xff\xfe,1,1,\xc3,Z,\x80\nX,1,1,Y,Z,1OK\n";

        let end = session.read_loop(&mut input, &mut stop_rx).await.unwrap();

        assert_eq!(end, SessionEnd::EndOfStream);
        assert_eq!(buffer.drain_all(), vec!["1OK"]);
    }

    #[tokio::test]
    async fn test_read_loop_returns_on_stop() {
        let (mut session, _buffer, _status) = test_session();
        let (stop_tx, mut stop_rx) = watch::channel(false);
        // Keep the write side alive so the read blocks forever
        let (_client, server) = tokio::io::duplex(64);
        let mut reader = BufReader::new(server);

        let reading =
            tokio::spawn(async move { session.read_loop(&mut reader, &mut stop_rx).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop_tx.send(true).unwrap();

        let end = timeout(Duration::from_secs(2), reading)
            .await
            .expect("read loop should observe stop")
            .unwrap()
            .unwrap();
        assert_eq!(end, SessionEnd::Stopped);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let endpoint = Endpoint::parse("127.0.0.1", port, "user", "secret").unwrap();
        let err = connect(&endpoint).await.unwrap_err();
        assert!(err.is_network_error(), "unexpected error: {err}");
    }
}
