//! Reconnecting supervisor for the relay connection
//!
//! The connector runs sessions back to back on a spawned tokio task. Any
//! failure or clean end of stream releases the socket, waits the retry delay
//! and dials again. A `watch` channel carries the stop request; every
//! blocking point selects on it, so a stop interrupts connects, reads and
//! retry waits alike.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::buffer::SentenceBuffer;
use crate::connection_error::ConnectionError;
use crate::constants::timing::RETRY_DELAY;
use crate::session::{ConnectionSession, SessionEnd, wait_for_stop};
use crate::status::FeedStatus;
use crate::types::{Endpoint, SessionState};

/// Errors from starting the connector
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    /// A read loop is already active
    #[error("connector is already running")]
    AlreadyRunning,

    /// The connector was stopped and cannot be restarted
    #[error("connector has been stopped")]
    Stopped,

    /// `start` was called outside a tokio runtime
    #[error("no tokio runtime available to run the read loop")]
    NoRuntime,
}

/// Supervises sessions until told to stop
#[derive(Debug)]
pub struct RetryingConnector {
    buffer: SentenceBuffer,
    status: Arc<FeedStatus>,
    retry_delay: Duration,
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl RetryingConnector {
    /// Create an idle connector with the default retry delay
    #[must_use]
    pub fn new(buffer: SentenceBuffer, status: Arc<FeedStatus>) -> Self {
        Self::with_retry_delay(buffer, status, RETRY_DELAY)
    }

    #[must_use]
    pub fn with_retry_delay(
        buffer: SentenceBuffer,
        status: Arc<FeedStatus>,
        retry_delay: Duration,
    ) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            buffer,
            status,
            retry_delay,
            stop_tx,
            task: None,
        }
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Whether a stop has been requested
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Whether the read loop task is still alive
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Spawn the read loop on the current tokio runtime
    ///
    /// Returns immediately; the open flag is raised before the task starts
    /// and stays raised until the loop exits.
    pub fn start(&mut self, endpoint: Endpoint) -> Result<(), ConnectorError> {
        if self.is_stopped() {
            return Err(ConnectorError::Stopped);
        }
        if self.task.is_some() {
            return Err(ConnectorError::AlreadyRunning);
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| ConnectorError::NoRuntime)?;

        info!(
            host = %endpoint.host,
            port = %endpoint.port,
            retry_delay_secs = self.retry_delay.as_secs_f64(),
            "Starting AIS read loop"
        );

        self.status.set_open(true);
        let task = runtime.spawn(supervise(
            endpoint,
            self.buffer.clone(),
            self.status.clone(),
            self.retry_delay,
            self.stop_tx.subscribe(),
        ));
        self.task = Some(task);
        Ok(())
    }

    /// Request a stop without waiting for the loop to exit
    ///
    /// The in-flight socket is dropped as soon as the loop observes the
    /// signal, which unblocks any pending read.
    pub fn stop(&self) {
        if !self.stop_tx.send_replace(true) && self.task.is_some() {
            self.status.set_state(SessionState::Closing);
        }
    }

    /// Stop and wait for the loop to exit
    ///
    /// After this returns the open flag is false and nothing more is
    /// enqueued into the buffer.
    pub async fn shutdown(&mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "AIS read task ended abnormally");
            }
            self.status.set_state(SessionState::Stopped);
        }
        self.status.set_open(false);
    }
}

impl Drop for RetryingConnector {
    fn drop(&mut self) {
        // Detached task exits on its own once it sees the stop
        self.stop_tx.send_replace(true);
    }
}

/// Body of the read loop task
async fn supervise(
    endpoint: Endpoint,
    buffer: SentenceBuffer,
    status: Arc<FeedStatus>,
    retry_delay: Duration,
    mut stop: watch::Receiver<bool>,
) {
    while !*stop.borrow() {
        let attempt = status.record_connect_attempt();
        debug!(attempt, address = %endpoint.address(), "Dialing AIS relay");

        let mut session = ConnectionSession::new(endpoint.clone(), buffer.clone(), status.clone());
        match session.run(&mut stop).await {
            Ok(SessionEnd::Stopped) => break,
            Ok(SessionEnd::EndOfStream) => {
                let err = ConnectionError::StreamClosed {
                    address: endpoint.address(),
                };
                log_connection_lost(&err, attempt);
            }
            Err(e) => log_connection_lost(&e, attempt),
        }
        drop(session);

        if *stop.borrow() {
            break;
        }
        status.set_state(SessionState::Closing);
        debug!(
            delay_secs = retry_delay.as_secs_f64(),
            "Waiting before reconnecting"
        );
        tokio::select! {
            biased;
            _ = wait_for_stop(&mut stop) => break,
            _ = tokio::time::sleep(retry_delay) => {}
        }
    }

    status.set_state(SessionState::Stopped);
    status.set_open(false);
    info!(address = %endpoint.address(), "AIS read loop stopped");
}

fn log_connection_lost(err: &ConnectionError, attempt: u64) {
    match err.log_level() {
        tracing::Level::ERROR => error!(attempt, error = %err, "AIS connection lost"),
        tracing::Level::WARN => warn!(attempt, error = %err, "AIS connection lost"),
        tracing::Level::INFO => info!(attempt, error = %err, "AIS connection lost"),
        _ => debug!(attempt, error = %err, "AIS connection lost"),
    }
}
