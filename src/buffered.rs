//! Caller-facing buffered stream operations.

use std::io;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::{Error, Result};
use crate::read_buffer::ReadBuffer;
use crate::stream::{RawStream, TryWrite, wait_or_timeout};

/// A stream wrapper providing buffered reads and tracked writes.
///
/// `BufferedStream` owns the underlying stream and a [`ReadBuffer`]. Each
/// read operation drives the buffer's fill/consume cycle until the request
/// is satisfied; writes go straight to the stream, looping over partial
/// writes until everything is delivered.
///
/// Operations block the calling thread (via the stream's readiness wait)
/// until data arrives, the stream ends, or the configured timeout elapses.
/// A single instance must not be used from multiple threads at once;
/// callers sharing one must synchronize externally.
#[derive(Debug)]
pub struct BufferedStream<S> {
    stream: S,
    buffer: ReadBuffer,
}

impl<S: RawStream> BufferedStream<S> {
    /// Creates a new `BufferedStream` wrapping `stream`.
    pub fn new(stream: S) -> Self {
        BufferedStream {
            stream,
            buffer: ReadBuffer::new(),
        }
    }

    /// Reads exactly `len` bytes, returning them as a new vector.
    ///
    /// See [`read_into`](BufferedStream::read_into).
    pub fn read(&mut self, len: usize, ignore_eof: bool) -> Result<Vec<u8>> {
        let mut dest = Vec::with_capacity(len);
        self.read_into(len, &mut dest, ignore_eof)?;
        Ok(dest)
    }

    /// Reads exactly `len` bytes from the stream, appending them to `dest`.
    ///
    /// Drains the entire buffer into `dest` before each refill, so the
    /// number of fills is minimized. Returns the number of bytes appended.
    ///
    /// If the stream ends first: with `ignore_eof` the bytes read so far
    /// are kept in `dest` and their (short) count returned; without it the
    /// error propagates, though `dest` still holds the partial data.
    pub fn read_into(&mut self, len: usize, dest: &mut Vec<u8>, ignore_eof: bool) -> Result<usize> {
        let mut read = 0;
        while read + self.buffer.len() < len {
            let buffered = self.buffer.len();
            self.buffer.consume_into(buffered, dest);
            read += buffered;
            match self.buffer.fill(&mut self.stream) {
                Ok(_) => {}
                Err(Error::EndOfStream) if ignore_eof => return Ok(read),
                Err(e) => return Err(e),
            }
        }
        let rest = len - read;
        self.buffer.consume_into(rest, dest);
        Ok(read + rest)
    }

    /// Reads all remaining bytes until the stream ends.
    ///
    /// End of stream is the expected termination here, not an error. A
    /// subsequent call returns an empty vector. Timeouts and IO errors
    /// still propagate.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut dest = Vec::new();
        self.read_all_into(&mut dest)?;
        Ok(dest)
    }

    /// Reads all remaining bytes into `dest`, returning the count appended.
    pub fn read_all_into(&mut self, dest: &mut Vec<u8>) -> Result<usize> {
        let mut read = 0;
        loop {
            let buffered = self.buffer.len();
            self.buffer.consume_into(buffered, dest);
            read += buffered;
            match self.buffer.fill(&mut self.stream) {
                Ok(_) => {}
                Err(Error::EndOfStream) => return Ok(read),
                Err(e) => return Err(e),
            }
        }
    }

    /// Reads up to and including the first occurrence of `terminator`.
    ///
    /// The search is re-run over the full buffered range after every fill,
    /// so a terminator split across two reads from the stream is still
    /// found. If the stream ends before the terminator appears: with
    /// `ignore_eof` whatever remains buffered is returned; without it the
    /// error propagates and the buffered bytes stay put.
    pub fn read_until(&mut self, terminator: &[u8], ignore_eof: bool) -> Result<Vec<u8>> {
        debug_assert!(!terminator.is_empty(), "empty terminator");
        loop {
            if let Some(idx) = self.buffer.find(terminator) {
                let take = idx + terminator.len();
                let mut dest = Vec::with_capacity(take);
                self.buffer.consume_into(take, &mut dest);
                return Ok(dest);
            }
            match self.buffer.fill(&mut self.stream) {
                Ok(_) => {}
                Err(Error::EndOfStream) if ignore_eof => {
                    let remaining = self.buffer.len();
                    let mut dest = Vec::with_capacity(remaining);
                    self.buffer.consume_into(remaining, &mut dest);
                    return Ok(dest);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Reads one line, terminated by `\n`.
    ///
    /// With `strip` (the usual case), removes exactly one trailing line
    /// terminator: the final `\n` and, if present, the `\r` before it.
    /// Without it the line is returned terminator included.
    pub fn read_line(&mut self, strip: bool) -> Result<Vec<u8>> {
        let mut line = self.read_until(b"\n", false)?;
        if strip {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        Ok(line)
    }

    /// Writes all of `data` to the stream, returning the number of bytes
    /// written by this call.
    ///
    /// Partial writes are retried until everything is delivered; blocked
    /// writes wait for readiness under the configured timeout, one deadline
    /// for the whole call.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.write_parts(&[data])
    }

    /// Writes `data` followed by CRLF, returning the number of bytes
    /// written by this call (`data.len() + 2` on success).
    pub fn write_line(&mut self, data: &[u8]) -> Result<usize> {
        self.write_parts(&[data, b"\r\n"])
    }

    /// Returns the readiness-wait timeout for fills and writes.
    pub fn read_timeout(&self) -> Duration {
        self.buffer.read_timeout()
    }

    /// Sets the readiness-wait timeout for fills and writes.
    pub fn set_read_timeout(&mut self, timeout: Duration) {
        self.buffer.set_read_timeout(timeout);
    }

    /// Returns the per-fill read size hint.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Sets the maximum number of bytes requested from the stream per fill.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.buffer.set_capacity(capacity);
    }

    /// Returns the number of bytes read from the stream but not yet
    /// consumed by any read operation.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Returns a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Returns a mutable reference to the underlying stream.
    ///
    /// Reading from or writing to the stream directly bypasses the buffer
    /// and will lose or reorder data relative to buffered reads.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Consumes the wrapper, returning the underlying stream.
    ///
    /// Any buffered-but-unconsumed bytes are discarded.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Delivers every part in full, accumulating the byte count in a local
    /// scoped to this call so nothing leaks across calls or error paths.
    fn write_parts(&mut self, parts: &[&[u8]]) -> Result<usize> {
        let timeout = self.buffer.read_timeout();
        let deadline = Instant::now() + timeout;
        let mut written = 0;
        for part in parts {
            let mut sent = 0;
            while sent < part.len() {
                match self.stream.try_write(&part[sent..])? {
                    TryWrite::Written(0) => {
                        return Err(Error::Io(io::Error::new(
                            io::ErrorKind::WriteZero,
                            "stream accepted zero bytes",
                        )));
                    }
                    TryWrite::Written(n) => {
                        sent += n;
                        written += n;
                        trace!(bytes = n, total = written, "write delivered");
                    }
                    TryWrite::Blocked(interest) => {
                        wait_or_timeout(&mut self.stream, interest, deadline, timeout)?;
                    }
                }
            }
        }
        Ok(written)
    }
}
