//! Non-blocking stream contract.
//!
//! This module defines the interface the buffering layer requires from the
//! underlying byte stream: a non-blocking read, a non-blocking write, and a
//! readiness wait bounded by a deadline. Sockets, pipes, and TLS-wrapped
//! streams can all satisfy this contract; constructing and closing them is
//! the caller's concern.
//!
//! Both [`RawStream::try_read`] and [`RawStream::try_write`] may report
//! [`Blocked`](TryRead::Blocked) in *either* direction. A TLS stream in the
//! middle of a renegotiation may need to write before a read can make
//! progress, and vice versa; callers wait for whichever direction the stream
//! asks for.

use std::io;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Readiness direction a stream can be waited on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    /// The stream has bytes to read (or a pending condition to report).
    Readable,
    /// The stream can accept more bytes.
    Writable,
}

/// Outcome of a non-blocking read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRead {
    /// This many bytes were copied into the destination. May be fewer than
    /// the destination holds.
    Data(usize),
    /// No progress until the stream is ready in the given direction.
    Blocked(Interest),
    /// The stream has ended; no further data will arrive.
    Eof,
}

/// Outcome of a non-blocking write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryWrite {
    /// This many bytes were accepted by the stream. May be fewer than
    /// offered.
    Written(usize),
    /// No progress until the stream is ready in the given direction.
    Blocked(Interest),
}

/// A byte stream supporting non-blocking reads and writes plus a bounded
/// readiness wait.
///
/// Genuine stream failures surface as [`io::Error`]; transient "not ready
/// yet" conditions are reported in-band via [`TryRead::Blocked`] and
/// [`TryWrite::Blocked`] so callers can wait and retry.
pub trait RawStream {
    /// Attempts to read into `buf` without blocking.
    ///
    /// Returns [`TryRead::Eof`] once the stream has ended. A return of
    /// `Data(0)` is only permitted when `buf` is empty.
    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<TryRead>;

    /// Attempts to write `buf` without blocking.
    fn try_write(&mut self, buf: &[u8]) -> io::Result<TryWrite>;

    /// Blocks the calling thread until the stream is ready in the given
    /// direction, or until `timeout` elapses.
    ///
    /// Returns `Ok(true)` if readiness was achieved, `Ok(false)` on timeout.
    fn wait_ready(&mut self, interest: Interest, timeout: Duration) -> io::Result<bool>;
}

/// Waits for readiness against a deadline computed once by the caller.
///
/// The deadline spans all retries of a single fill or write call, so the
/// overall operation respects the configured timeout no matter how many
/// times the stream reports blocked.
pub(crate) fn wait_or_timeout<S: RawStream>(
    stream: &mut S,
    interest: Interest,
    deadline: Instant,
    timeout: Duration,
) -> Result<()> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        debug!(?interest, ?timeout, "readiness deadline already expired");
        return Err(Error::Timeout(timeout));
    }
    trace!(?interest, ?remaining, "waiting for stream readiness");
    if stream.wait_ready(interest, remaining)? {
        Ok(())
    } else {
        debug!(?interest, ?timeout, "readiness wait timed out");
        Err(Error::Timeout(timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcomes_are_copy_eq() {
        let blocked = TryRead::Blocked(Interest::Writable);
        assert_eq!(blocked, blocked);
        assert_ne!(TryRead::Eof, TryRead::Data(0));
        assert_ne!(
            TryWrite::Written(1),
            TryWrite::Blocked(Interest::Readable)
        );
    }
}
