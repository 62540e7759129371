//! Shared status cells for the feed connection
//!
//! The supervisor task writes these, consumer threads read them. Everything
//! is atomic so reads never block the read loop.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};

use crate::types::SessionState;

/// Open flag, lifecycle state and running counters for one feed
#[derive(Debug, Default)]
pub struct FeedStatus {
    open: AtomicBool,
    state: AtomicU8,
    connect_attempts: AtomicU64,
    sessions_established: AtomicU64,
    sentences_accepted: AtomicU64,
    sentences_filtered: AtomicU64,
    lines_skipped: AtomicU64,
}

impl FeedStatus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub(crate) fn set_open(&self, open: bool) {
        self.open.store(open, Ordering::Release);
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    pub(crate) fn record_connect_attempt(&self) -> u64 {
        self.connect_attempts.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_session_established(&self) {
        self.sessions_established.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_accepted(&self) {
        self.sentences_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_filtered(&self) {
        self.sentences_filtered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped(&self) {
        self.lines_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    #[must_use]
    pub fn snapshot(&self) -> FeedStats {
        FeedStats {
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            sessions_established: self.sessions_established.load(Ordering::Relaxed),
            sentences_accepted: self.sentences_accepted.load(Ordering::Relaxed),
            sentences_filtered: self.sentences_filtered.load(Ordering::Relaxed),
            lines_skipped: self.lines_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Counter snapshot returned by [`FeedStatus::snapshot`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Dial attempts, successful or not
    pub connect_attempts: u64,
    /// Sessions that got as far as sending the login handshake
    pub sessions_established: u64,
    /// Sentences that passed the type filter
    pub sentences_accepted: u64,
    /// Completed sentences rejected by the type filter
    pub sentences_filtered: u64,
    /// Lines dropped as malformed or ignored
    pub lines_skipped: u64,
}

impl FeedStats {
    /// Reconnects performed after the first session
    #[must_use]
    pub const fn reconnects(&self) -> u64 {
        self.sessions_established.saturating_sub(1)
    }
}
