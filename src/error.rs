//! Error types for bufio.

use std::io;
use std::time::Duration;

/// Result type alias for bufio.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for buffered stream operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying stream has no more data.
    ///
    /// Read operations on [`BufferedStream`](crate::BufferedStream) accept an
    /// `ignore_eof` flag to turn this into a short result instead.
    #[error("end of stream")]
    EndOfStream,

    /// The stream did not become ready within the configured timeout.
    ///
    /// Never suppressible: once a readiness wait expires, no forward
    /// progress is possible on the blocked operation.
    #[error("timed out after {0:?} waiting for stream readiness")]
    Timeout(Duration),

    /// IO error reported by the underlying stream.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns true if this error is [`Error::EndOfStream`].
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Error::EndOfStream)
    }

    /// Returns true if this error is [`Error::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}
