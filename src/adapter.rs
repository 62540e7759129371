//! Container-facing adapter around one feed connection
//!
//! A [`ManagedConnection`] owns the sentence buffer, the status cells and
//! the reconnecting connector for one physical feed. Hosting environments
//! obtain consumer handles from it, move handles between managed
//! connections, and receive a close event when a consumer closes the feed.
//! Transactions are not supported.

use std::any::Any;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::buffer::SentenceBuffer;
use crate::connector::{ConnectorError, RetryingConnector};
use crate::constants::timing::RETRY_DELAY;
use crate::handle::{ConnectionHandle, WeakHandle};
use crate::status::{FeedStats, FeedStatus};
use crate::types::{Endpoint, HandleId, SessionState};

/// Errors reported to the hosting environment
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("null connection handle")]
    NullHandle,

    #[error("wrong connection handle type")]
    ForeignHandle,

    /// The handle's current connection still has an active read loop
    #[error("connection handle {0} is attached to an open feed")]
    HandleInUse(HandleId),

    #[error("{0} not supported")]
    NotSupported(&'static str),
}

/// Lifecycle notifications delivered to listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A consumer closed the feed through this handle
    Closed { handle: HandleId },
}

/// Receives [`ConnectionEvent`]s from a managed connection
pub trait ConnectionEventListener: Send + Sync {
    fn on_event(&self, event: &ConnectionEvent);
}

/// Static description of the relay behind a managed connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionMetadata {
    pub product_name: &'static str,
    pub product_version: &'static str,
    /// One physical socket per managed connection
    pub max_connections: usize,
    /// Login name of the last `open`, if any
    pub user_name: Option<String>,
}

/// One physical feed shared by a group of handles
pub struct ManagedConnection {
    buffer: SentenceBuffer,
    status: Arc<FeedStatus>,
    connector: tokio::sync::Mutex<RetryingConnector>,
    handles: Mutex<HashMap<HandleId, WeakHandle>>,
    listeners: Mutex<Vec<Arc<dyn ConnectionEventListener>>>,
    user_name: Mutex<Option<String>>,
}

impl std::fmt::Debug for ManagedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedConnection")
            .field("queued", &self.buffer.len())
            .field("open", &self.status.is_open())
            .field("state", &self.status.state())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ManagedConnection {
    /// Create a managed connection with the default retry delay
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::with_retry_delay(RETRY_DELAY)
    }

    #[must_use]
    pub fn with_retry_delay(retry_delay: Duration) -> Arc<Self> {
        let buffer = SentenceBuffer::new();
        let status = Arc::new(FeedStatus::new());
        let connector =
            RetryingConnector::with_retry_delay(buffer.clone(), status.clone(), retry_delay);

        Arc::new(Self {
            buffer,
            status,
            connector: tokio::sync::Mutex::new(connector),
            handles: Mutex::new(HashMap::new()),
            listeners: Mutex::new(Vec::new()),
            user_name: Mutex::new(None),
        })
    }

    /// Hand out a new handle attached to this connection
    pub fn get_connection(self: &Arc<Self>) -> ConnectionHandle {
        let handle = ConnectionHandle::attached(Arc::clone(self));
        self.track(&handle);
        debug!(handle = %handle.id(), "Created connection handle");
        handle
    }

    /// Re-attach a handle previously obtained from any managed connection
    pub fn associate_connection(
        self: &Arc<Self>,
        connection: Option<&dyn Any>,
    ) -> Result<(), AdapterError> {
        let handle = connection
            .ok_or(AdapterError::NullHandle)?
            .downcast_ref::<ConnectionHandle>()
            .ok_or(AdapterError::ForeignHandle)?;

        if let Some(previous) = handle.connection() {
            if Arc::ptr_eq(&previous, self) {
                return Ok(());
            }
            if previous.is_open() {
                return Err(AdapterError::HandleInUse(handle.id()));
            }
            previous.untrack(handle.id());
        }

        handle.set_connection(Some(Arc::clone(self)));
        self.track(handle);
        debug!(handle = %handle.id(), "Associated connection handle");
        Ok(())
    }

    /// Detach every tracked handle still attached to this connection
    ///
    /// Handles that were re-associated elsewhere keep their new attachment.
    pub fn cleanup(self: &Arc<Self>) {
        let handles: Vec<_> = lock(&self.handles).drain().map(|(_, weak)| weak).collect();
        let mut detached = 0;
        for handle in handles.iter().filter_map(WeakHandle::upgrade) {
            if handle.detach_from(self) {
                detached += 1;
            }
        }
        debug!(detached, "Cleaned up connection handles");
    }

    /// Stop the read loop and release the socket
    pub async fn destroy(&self) {
        self.connector.lock().await.shutdown().await;
        info!("Destroyed managed AIS connection");
    }

    pub fn add_listener(&self, listener: Arc<dyn ConnectionEventListener>) {
        lock(&self.listeners).push(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn ConnectionEventListener>) {
        lock(&self.listeners).retain(|existing| !Arc::ptr_eq(existing, listener));
    }

    pub fn local_transaction(&self) -> Result<Infallible, AdapterError> {
        Err(AdapterError::NotSupported("local_transaction"))
    }

    pub fn xa_resource(&self) -> Result<Infallible, AdapterError> {
        Err(AdapterError::NotSupported("xa_resource"))
    }

    #[must_use]
    pub fn metadata(&self) -> ConnectionMetadata {
        ConnectionMetadata {
            product_name: "AIS relay",
            product_version: env!("CARGO_PKG_VERSION"),
            max_connections: 1,
            user_name: lock(&self.user_name).clone(),
        }
    }

    /// Number of handles currently attached
    #[must_use]
    pub fn handle_count(&self) -> usize {
        lock(&self.handles)
            .values()
            .filter(|weak| weak.upgrade().is_some())
            .count()
    }

    pub(crate) async fn open(&self, endpoint: Endpoint) -> Result<(), ConnectorError> {
        let user_name = endpoint.username.to_string();
        self.connector.lock().await.start(endpoint)?;
        *lock(&self.user_name) = Some(user_name);
        Ok(())
    }

    pub(crate) fn is_open(&self) -> bool {
        self.status.is_open()
    }

    pub(crate) fn sentences(&self) -> Vec<String> {
        self.buffer.drain_all()
    }

    pub(crate) fn queue_size(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.status.state()
    }

    /// Counters since this managed connection was created
    #[must_use]
    pub fn stats(&self) -> FeedStats {
        self.status.snapshot()
    }

    /// Stop the feed on behalf of a closing handle and notify listeners
    pub(crate) async fn close_handle(&self, handle: &ConnectionHandle) {
        self.connector.lock().await.shutdown().await;
        lock(&self.handles).remove(&handle.id());

        let event = ConnectionEvent::Closed {
            handle: handle.id(),
        };
        let listeners = lock(&self.listeners).clone();
        for listener in &listeners {
            listener.on_event(&event);
        }
        info!(handle = %handle.id(), "AIS connection closed");
    }

    fn track(&self, handle: &ConnectionHandle) {
        lock(&self.handles).insert(handle.id(), handle.downgrade());
    }

    fn untrack(&self, id: HandleId) {
        lock(&self.handles).remove(&id);
    }
}
