//! Buffered, terminator-aware reading and tracked writing over non-blocking
//! byte streams.
//!
//! Protocol code frequently needs "read N bytes", "read until a delimiter",
//! or "read everything" from a socket or pipe. This crate provides those
//! operations on top of any handle implementing the [`RawStream`] contract
//! (non-blocking read/write plus a bounded readiness wait), so callers never
//! re-implement buffering, partial-read accumulation, or retry-on-not-ready
//! logic.
//!
//! ## Components
//!
//! - [`RawStream`]: the contract the underlying stream must satisfy, with
//!   [`TryRead`]/[`TryWrite`] outcomes and an [`Interest`]-directed wait
//! - [`ReadBuffer`]: the byte accumulator driving the non-blocking
//!   fill/consume cycle, with readiness-wait retry under a timeout
//! - [`BufferedStream`]: the caller-facing operations — fixed-length read,
//!   read-to-end, read-until-terminator, line read, tracked write
//!
//! ## Example
//!
//! ```
//! use bufio::{BufferedStream, Interest, RawStream, TryRead, TryWrite};
//! # use std::io;
//! # use std::time::Duration;
//! # struct MemStream { data: Vec<u8>, pos: usize, sent: Vec<u8> }
//! # impl RawStream for MemStream {
//! #     fn try_read(&mut self, buf: &mut [u8]) -> io::Result<TryRead> {
//! #         if self.pos == self.data.len() { return Ok(TryRead::Eof); }
//! #         let n = buf.len().min(self.data.len() - self.pos);
//! #         buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
//! #         self.pos += n;
//! #         Ok(TryRead::Data(n))
//! #     }
//! #     fn try_write(&mut self, buf: &[u8]) -> io::Result<TryWrite> {
//! #         self.sent.extend_from_slice(buf);
//! #         Ok(TryWrite::Written(buf.len()))
//! #     }
//! #     fn wait_ready(&mut self, _: Interest, _: Duration) -> io::Result<bool> { Ok(true) }
//! # }
//! # fn main() -> bufio::Result<()> {
//! # let stream = MemStream { data: b"PING\r\n42".to_vec(), pos: 0, sent: Vec::new() };
//! let mut io = BufferedStream::new(stream);
//!
//! let line = io.read_line(true)?;     // b"PING"
//! let rest = io.read_all()?;          // b"42"
//! let sent = io.write_line(b"PONG")?; // 6 bytes written
//! # assert_eq!(line, b"PING");
//! # assert_eq!(rest, b"42");
//! # assert_eq!(sent, 6);
//! # Ok(())
//! # }
//! ```
//!
//! ## Blocking and timeouts
//!
//! Every operation is synchronous: it completes, blocks the calling thread
//! via the stream's readiness wait, or fails with [`Error::Timeout`] once
//! the configured deadline expires. End of stream surfaces as
//! [`Error::EndOfStream`] unless an operation's `ignore_eof` flag accepts a
//! short result instead. One instance serves one thread at a time; sharing
//! requires external synchronization.

mod buffered;
mod error;
mod read_buffer;
mod stream;

pub use buffered::BufferedStream;
pub use error::{Error, Result};
pub use read_buffer::{DEFAULT_CAPACITY, DEFAULT_READ_TIMEOUT, ReadBuffer};
pub use stream::{Interest, RawStream, TryRead, TryWrite};
