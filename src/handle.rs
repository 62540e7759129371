//! Consumer-facing connection handle
//!
//! A handle forwards every call to the managed connection it is attached
//! to. The attachment is revocable: the adapter can detach a handle during
//! cleanup and re-associate it later. A detached handle answers with empty
//! defaults instead of failing, except `open`, which reports the detachment.

use std::sync::{Arc, PoisonError, RwLock, Weak};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::adapter::ManagedConnection;
use crate::connector::ConnectorError;
use crate::status::FeedStats;
use crate::types::{Endpoint, HandleId, SessionState};

/// Errors surfaced by handle operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandleError {
    /// The handle is not attached to a managed connection
    #[error("connection handle {0} is not attached to a managed connection")]
    Detached(HandleId),

    #[error(transparent)]
    Connector(#[from] ConnectorError),
}

/// Operations available to feed consumers
#[async_trait]
pub trait AisConnection: Send + Sync {
    /// Start the background read loop against `endpoint`
    ///
    /// Returns as soon as the loop is spawned; connecting happens in the
    /// background.
    async fn open(&self, endpoint: Endpoint) -> Result<(), HandleError>;

    /// True while the read loop is active, including while it waits to redial
    fn is_open(&self) -> bool;

    /// Drain every buffered sentence, oldest first
    fn sentences(&self) -> Vec<String>;

    /// Number of sentences waiting to be drained
    fn queue_size(&self) -> usize;

    /// Stop the read loop, release the socket and detach this handle
    async fn close(&self);
}

#[derive(Debug)]
pub(crate) struct HandleInner {
    id: HandleId,
    connection: RwLock<Option<Arc<ManagedConnection>>>,
}

/// Handle held by feed consumers
///
/// Clones share the same attachment.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    inner: Arc<HandleInner>,
}

impl ConnectionHandle {
    pub(crate) fn attached(connection: Arc<ManagedConnection>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id: HandleId::new(),
                connection: RwLock::new(Some(connection)),
            }),
        }
    }

    /// A handle not yet associated with any managed connection
    #[must_use]
    pub fn detached() -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id: HandleId::new(),
                connection: RwLock::new(None),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> HandleId {
        self.inner.id
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.connection().is_some()
    }

    /// Lifecycle state of the attached connection
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.connection()
            .map_or(SessionState::Idle, |connection| connection.state())
    }

    /// Counters of the attached connection
    #[must_use]
    pub fn stats(&self) -> FeedStats {
        self.connection()
            .map_or_else(FeedStats::default, |connection| connection.stats())
    }

    pub(crate) fn set_connection(&self, connection: Option<Arc<ManagedConnection>>) {
        *self
            .inner
            .connection
            .write()
            .unwrap_or_else(PoisonError::into_inner) = connection;
    }

    /// Clear the attachment only if it still points at `owner`
    ///
    /// Returns whether the handle was detached.
    pub(crate) fn detach_from(&self, owner: &Arc<ManagedConnection>) -> bool {
        let mut connection = self
            .inner
            .connection
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match connection.as_ref() {
            Some(current) if Arc::ptr_eq(current, owner) => {
                *connection = None;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn downgrade(&self) -> WeakHandle {
        WeakHandle(Arc::downgrade(&self.inner))
    }

    pub(crate) fn connection(&self) -> Option<Arc<ManagedConnection>> {
        self.inner
            .connection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn take_connection(&self) -> Option<Arc<ManagedConnection>> {
        self.inner
            .connection
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[async_trait]
impl AisConnection for ConnectionHandle {
    async fn open(&self, endpoint: Endpoint) -> Result<(), HandleError> {
        let connection = self.connection().ok_or(HandleError::Detached(self.id()))?;
        connection.open(endpoint).await?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.connection()
            .is_some_and(|connection| connection.is_open())
    }

    fn sentences(&self) -> Vec<String> {
        self.connection()
            .map(|connection| connection.sentences())
            .unwrap_or_default()
    }

    fn queue_size(&self) -> usize {
        self.connection()
            .map_or(0, |connection| connection.queue_size())
    }

    async fn close(&self) {
        match self.take_connection() {
            Some(connection) => connection.close_handle(self).await,
            None => debug!(handle = %self.id(), "Close on detached handle ignored"),
        }
    }
}

/// Non-owning reference kept by the managed connection
#[derive(Debug, Clone)]
pub(crate) struct WeakHandle(Weak<HandleInner>);

impl WeakHandle {
    pub(crate) fn upgrade(&self) -> Option<ConnectionHandle> {
        self.0.upgrade().map(|inner| ConnectionHandle { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_detached_handle_defaults() {
        let handle = ConnectionHandle::detached();

        assert!(!handle.is_attached());
        assert!(!handle.is_open());
        assert!(handle.sentences().is_empty());
        assert_eq!(handle.queue_size(), 0);
        assert_eq!(handle.state(), SessionState::Idle);
        assert_eq!(handle.stats(), FeedStats::default());

        // Closing a detached handle is a no-op
        handle.close().await;
    }

    #[tokio::test]
    async fn test_open_on_detached_handle_fails() {
        let handle = ConnectionHandle::detached();
        let endpoint = Endpoint::parse("127.0.0.1", 4712, "user", "secret").unwrap();

        assert_eq!(
            handle.open(endpoint).await,
            Err(HandleError::Detached(handle.id()))
        );
    }

    #[test]
    fn test_clones_share_identity() {
        let handle = ConnectionHandle::detached();
        let clone = handle.clone();
        assert_eq!(handle.id(), clone.id());
        assert_ne!(handle.id(), ConnectionHandle::detached().id());
    }

    #[test]
    fn test_weak_handle_upgrade() {
        let handle = ConnectionHandle::detached();
        let weak = handle.downgrade();
        assert_eq!(weak.upgrade().map(|h| h.id()), Some(handle.id()));

        drop(handle);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_error_display() {
        let handle = ConnectionHandle::detached();
        let err = HandleError::Detached(handle.id());
        assert!(err.to_string().contains("not attached"));

        let err = HandleError::from(ConnectorError::AlreadyRunning);
        assert_eq!(err.to_string(), "connector is already running");
    }
}
