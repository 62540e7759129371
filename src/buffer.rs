//! Lock-free buffer of completed sentences
//!
//! The read loop appends accepted sentences while consumers drain them
//! from other tasks. Uses crossbeam's SegQueue so the producer never blocks;
//! drains are serialized against each other.

use crossbeam::queue::SegQueue;
use std::sync::{Arc, Mutex, PoisonError};

/// Unbounded, thread-safe FIFO of completed sentences
///
/// Cloning is cheap and yields another handle to the same queue.
#[derive(Debug, Clone, Default)]
pub struct SentenceBuffer {
    queue: Arc<SegQueue<String>>,
    drain_lock: Arc<Mutex<()>>,
}

impl SentenceBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sentence
    pub fn enqueue(&self, sentence: impl Into<String>) {
        self.queue.push(sentence.into());
    }

    /// Remove and return every sentence present when the call starts
    ///
    /// Sentences come back in arrival order. Sentences pushed while the drain
    /// is running stay queued for the next call, so each drain returns a
    /// contiguous prefix of the feed with no gaps or duplicates, even when
    /// several consumers drain at once.
    pub fn drain_all(&self) -> Vec<String> {
        let _guard = self
            .drain_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.queue.len();
        let mut drained = Vec::with_capacity(snapshot);
        for _ in 0..snapshot {
            match self.queue.pop() {
                Some(sentence) => drained.push(sentence),
                None => break,
            }
        }
        drained
    }

    /// Number of queued sentences
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
