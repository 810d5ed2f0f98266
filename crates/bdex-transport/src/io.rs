//! Adapters from `std::io` streams.

use std::io::{ErrorKind, Read, Write};

use tracing::debug;

use crate::error::{Result, SinkError};
use crate::traits::{ByteSink, ByteSource};

/// Byte sink over any `Write` stream (file, socket, pipe).
///
/// Each `put_bytes` call writes the whole run before returning.
pub struct IoSink<W> {
    inner: W,
    written: u64,
}

impl<W: Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Total bytes accepted by the underlying stream.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(SinkError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consume the sink and return the inner stream.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ByteSink for IoSink<W> {
    fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => {
                    debug!(offset, len = bytes.len(), "sink stream accepted zero bytes");
                    return Err(SinkError::Closed);
                }
                Ok(n) => {
                    offset += n;
                    self.written += n as u64;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => {
                    debug!(error = %err, "sink stream write failed");
                    return Err(SinkError::Io(err));
                }
            }
        }
        Ok(())
    }
}

impl<W> std::fmt::Debug for IoSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoSink")
            .field("written", &self.written)
            .finish()
    }
}

/// Byte source over any `Read` stream.
///
/// A pull keeps reading until the request is satisfied or the stream reports
/// EOF or an error. Errors end the pull early; the last one is kept for
/// [`IoSource::take_error`].
pub struct IoSource<R> {
    inner: R,
    read: u64,
    error: Option<std::io::Error>,
}

impl<R: Read> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            read: 0,
            error: None,
        }
    }

    /// Total bytes pulled from the underlying stream.
    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    /// Take the error that cut the most recent short pull, if any.
    pub fn take_error(&mut self) -> Option<std::io::Error> {
        self.error.take()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the source and return the inner stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteSource for IoSource<R> {
    fn pull_bytes(&mut self, dst: &mut [u8]) -> usize {
        let mut filled = 0usize;
        while filled < dst.len() {
            match self.inner.read(&mut dst[filled..]) {
                Ok(0) => {
                    debug!(filled, wanted = dst.len(), "source stream reached EOF");
                    break;
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    debug!(error = %err, filled, "source stream read failed");
                    self.error = Some(err);
                    break;
                }
            }
        }
        self.read += filled as u64;
        filled
    }
}

impl<R> std::fmt::Debug for IoSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoSource")
            .field("read", &self.read)
            .field("error", &self.error)
            .finish()
    }
}
