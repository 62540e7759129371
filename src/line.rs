//! Bounded line splitting for the inbound stream
//!
//! Relays terminate lines with `\n`, `\r` or `\r\n`. A `\n` that directly
//! follows a `\r` belongs to the same terminator, even when the two bytes
//! arrive in separate reads. Lines longer than the configured limit are
//! dropped without buffering the excess.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::constants::socket::LINE_BUFFER_CAPACITY;

/// One line read from the stream, terminator removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawLine<'a> {
    Line(&'a [u8]),
    /// Line was longer than the limit; carries its full length
    TooLong(usize),
}

/// Splits a buffered byte stream into lines of at most `max_len` bytes
#[derive(Debug)]
pub struct LineReader {
    line: Vec<u8>,
    /// Bytes seen for the current line, including any that were dropped
    length: usize,
    max_len: usize,
    /// Previous line ended with `\r`; a leading `\n` is part of it
    after_cr: bool,
}

impl LineReader {
    #[must_use]
    pub fn new(max_len: usize) -> Self {
        Self {
            line: Vec::with_capacity(LINE_BUFFER_CAPACITY.min(max_len)),
            length: 0,
            max_len,
            after_cr: false,
        }
    }

    /// Read the next line, or `None` once the stream is exhausted
    ///
    /// A final line without a terminator is still returned. Dropping the
    /// future mid-line discards that partial line.
    pub async fn next_line<R>(&mut self, reader: &mut R) -> io::Result<Option<RawLine<'_>>>
    where
        R: AsyncBufRead + Unpin,
    {
        self.line.clear();
        self.length = 0;

        loop {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                if self.length == 0 {
                    return Ok(None);
                }
                break;
            }

            let start = usize::from(std::mem::take(&mut self.after_cr) && available[0] == b'\n');
            let terminator = available[start..]
                .iter()
                .position(|&byte| byte == b'\n' || byte == b'\r')
                .map(|offset| start + offset);

            match terminator {
                Some(end) => {
                    self.after_cr = available[end] == b'\r';
                    self.append(start, end, available);
                    reader.consume(end + 1);
                    break;
                }
                None => {
                    let end = available.len();
                    self.append(start, end, available);
                    reader.consume(end);
                }
            }
        }

        if self.length > self.max_len {
            Ok(Some(RawLine::TooLong(self.length)))
        } else {
            Ok(Some(RawLine::Line(&self.line)))
        }
    }

    fn append(&mut self, start: usize, end: usize, chunk: &[u8]) {
        self.length += end - start;
        if self.length <= self.max_len {
            self.line.extend_from_slice(&chunk[start..end]);
        } else if !self.line.is_empty() {
            self.line.clear();
        }
    }
}
