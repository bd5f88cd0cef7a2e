//! Read-side byte accumulator.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::{Error, Result};
use crate::stream::{RawStream, TryRead, wait_or_timeout};

/// Default number of bytes requested from the stream per fill (16 KiB).
pub const DEFAULT_CAPACITY: usize = 16 * 1024;

/// Default readiness-wait timeout for a single fill or write call.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Consumed-prefix length past which `consume_into` compacts the buffer.
const COMPACT_THRESHOLD: usize = 32 * 1024;

/// FIFO accumulator for bytes read from a stream but not yet consumed.
///
/// Bytes are appended at the back by [`fill`](ReadBuffer::fill) and removed
/// from the front by [`consume_into`](ReadBuffer::consume_into). The front is
/// tracked by a read cursor rather than shifting remaining bytes on every
/// consume; the consumed prefix is reclaimed once it crosses a threshold, so
/// consumption is O(1) amortized.
///
/// The buffer holds no stream of its own. Each `fill` borrows the stream for
/// the duration of the call, which keeps the accumulator and the handle from
/// aliasing each other.
#[derive(Debug)]
pub struct ReadBuffer {
    buf: Vec<u8>,
    pos: usize,
    capacity: usize,
    read_timeout: Duration,
}

impl Default for ReadBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadBuffer {
    /// Creates an empty buffer with the default capacity hint and timeout.
    pub fn new() -> Self {
        ReadBuffer {
            buf: Vec::new(),
            pos: 0,
            capacity: DEFAULT_CAPACITY,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Returns the number of buffered, unconsumed bytes.
    pub fn len(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Returns true if no unconsumed bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the per-fill read size hint.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sets the maximum number of bytes requested from the stream per fill.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
    }

    /// Returns the readiness-wait timeout.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Sets the maximum time a fill waits for the stream to become ready.
    pub fn set_read_timeout(&mut self, timeout: Duration) {
        self.read_timeout = timeout;
    }

    /// Performs one non-blocking read of up to the capacity hint, appending
    /// whatever arrives to the back of the buffer.
    ///
    /// If the stream reports blocked, waits for readiness in the direction
    /// the stream asked for and retries. All retries share one deadline
    /// computed at entry; expiry fails with [`Error::Timeout`]. End of
    /// stream fails with [`Error::EndOfStream`].
    ///
    /// Returns the number of bytes appended, which may be fewer than the
    /// capacity hint. Bytes appended by earlier fills are unaffected by a
    /// later failure.
    pub fn fill<S: RawStream>(&mut self, stream: &mut S) -> Result<usize> {
        let deadline = Instant::now() + self.read_timeout;
        let start = self.buf.len();
        self.buf.resize(start + self.capacity, 0);

        let result = read_ready(
            stream,
            &mut self.buf[start..],
            deadline,
            self.read_timeout,
        );
        match result {
            Ok(n) => {
                self.buf.truncate(start + n);
                trace!(bytes = n, buffered = self.len(), "fill appended");
                Ok(n)
            }
            Err(e) => {
                self.buf.truncate(start);
                Err(e)
            }
        }
    }

    /// Removes exactly `len` bytes from the front of the buffer, appending
    /// them to `dest`.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds [`len()`](ReadBuffer::len). Callers must
    /// check the buffered size first; requesting more than is buffered is a
    /// programming error, not a recoverable condition.
    pub fn consume_into(&mut self, len: usize, dest: &mut Vec<u8>) {
        debug_assert!(len <= self.len(), "consume past buffered data");
        let end = self.pos + len;
        dest.extend_from_slice(&self.buf[self.pos..end]);
        self.pos = end;

        if self.pos == self.buf.len() {
            self.buf.clear();
            self.pos = 0;
        } else if self.pos >= COMPACT_THRESHOLD {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
    }

    /// Returns the offset of the first occurrence of `pattern` within the
    /// unconsumed bytes, without consuming anything.
    ///
    /// The search always runs over the full unconsumed range, so a pattern
    /// spanning two fills is still found once its tail arrives.
    pub fn find(&self, pattern: &[u8]) -> Option<usize> {
        debug_assert!(!pattern.is_empty(), "empty search pattern");
        if pattern.is_empty() {
            return Some(0);
        }
        self.buf[self.pos..]
            .windows(pattern.len())
            .position(|window| window == pattern)
    }
}

/// One non-blocking read with readiness-wait retry against `deadline`.
fn read_ready<S: RawStream>(
    stream: &mut S,
    buf: &mut [u8],
    deadline: Instant,
    timeout: Duration,
) -> Result<usize> {
    loop {
        match stream.try_read(buf)? {
            TryRead::Data(n) => return Ok(n),
            TryRead::Eof => return Err(Error::EndOfStream),
            TryRead::Blocked(interest) => {
                wait_or_timeout(stream, interest, deadline, timeout)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::ScriptedStream;

    #[test]
    fn test_fill_appends_and_len_tracks() {
        let mut stream = ScriptedStream::chunks(&[b"abc", b"defg"]);
        let mut buffer = ReadBuffer::new();
        assert!(buffer.is_empty());

        assert_eq!(buffer.fill(&mut stream).unwrap(), 3);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.fill(&mut stream).unwrap(), 4);
        assert_eq!(buffer.len(), 7);

        let mut out = Vec::new();
        buffer.consume_into(7, &mut out);
        assert_eq!(out, b"abcdefg");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fill_reports_end_of_stream() {
        let mut stream = ScriptedStream::bytes(b"x");
        let mut buffer = ReadBuffer::new();
        buffer.fill(&mut stream).unwrap();
        assert!(buffer.fill(&mut stream).unwrap_err().is_end_of_stream());
        // Previously buffered bytes survive the error.
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_fill_respects_capacity_hint() {
        let mut stream = ScriptedStream::bytes(&[7u8; 100]);
        let mut buffer = ReadBuffer::new();
        buffer.set_capacity(8);

        assert_eq!(buffer.fill(&mut stream).unwrap(), 8);
        assert_eq!(buffer.len(), 8);
    }

    #[test]
    fn test_consume_partial_keeps_remainder_in_order() {
        let mut stream = ScriptedStream::bytes(b"hello world");
        let mut buffer = ReadBuffer::new();
        buffer.fill(&mut stream).unwrap();

        let mut out = Vec::new();
        buffer.consume_into(6, &mut out);
        assert_eq!(out, b"hello ");
        assert_eq!(buffer.len(), 5);

        buffer.consume_into(5, &mut out);
        assert_eq!(out, b"hello world");
    }

    #[test]
    fn test_find_non_consuming() {
        let mut stream = ScriptedStream::bytes(b"key: value\r\n");
        let mut buffer = ReadBuffer::new();
        buffer.fill(&mut stream).unwrap();

        assert_eq!(buffer.find(b":"), Some(3));
        assert_eq!(buffer.find(b"\r\n"), Some(10));
        assert_eq!(buffer.find(b"missing"), None);
        assert_eq!(buffer.len(), 12);
    }

    #[test]
    fn test_find_after_consume_is_relative_to_front() {
        let mut stream = ScriptedStream::bytes(b"aaab");
        let mut buffer = ReadBuffer::new();
        buffer.fill(&mut stream).unwrap();

        let mut out = Vec::new();
        buffer.consume_into(2, &mut out);
        assert_eq!(buffer.find(b"b"), Some(1));
    }

    #[test]
    fn test_compaction_preserves_content() {
        // Force many consume/fill cycles past the compaction threshold and
        // check nothing is lost or reordered.
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let mut stream = ScriptedStream::bytes(&data);
        let mut buffer = ReadBuffer::new();
        buffer.set_capacity(4096);

        let mut out = Vec::new();
        loop {
            match buffer.fill(&mut stream) {
                Ok(_) => {
                    // Consume in awkward odd-sized steps.
                    let step = (buffer.len() / 2).max(1).min(buffer.len());
                    buffer.consume_into(step, &mut out);
                }
                Err(e) if e.is_end_of_stream() => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        let remaining = buffer.len();
        buffer.consume_into(remaining, &mut out);
        assert_eq!(out, data);
    }

    #[test]
    #[should_panic]
    fn test_consume_past_buffered_panics() {
        let mut buffer = ReadBuffer::new();
        let mut out = Vec::new();
        buffer.consume_into(1, &mut out);
    }
}
