use std::io::{ErrorKind, Read, Write};

use tracing::debug;

use crate::error::{Result, TransportError};

/// A duplex byte channel carrying one request/response exchange at a time.
///
/// Implementations close themselves on the first failed transfer: once a
/// method has returned an error, every later call returns
/// [`TransportError::Closed`].
pub trait Link {
    /// Write all of `bytes` in a single transfer.
    ///
    /// A partial write is reported as [`TransportError::ShortWrite`]; the
    /// remainder is never resent.
    fn write_exact(&mut self, bytes: &[u8]) -> Result<()>;

    /// Block until exactly `buf.len()` bytes have been received.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Read exactly `count` bytes into a new buffer.
    fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; count];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }
}

impl<L: Link + ?Sized> Link for &mut L {
    fn write_exact(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_exact(bytes)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read_exact(buf)
    }
}

/// Adapts any `Read + Write` stream (socket, pipe, tty file) to [`Link`].
///
/// Read timeouts, if any, are whatever the wrapped stream is configured
/// with; `WouldBlock`/`TimedOut` surface as [`TransportError::Timeout`].
pub struct StreamLink<T> {
    inner: Option<T>,
}

impl<T> StreamLink<T> {
    pub fn new(inner: T) -> Self {
        Self { inner: Some(inner) }
    }

    /// Whether the link is still usable.
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// Borrow the underlying stream, if the link is still open.
    pub fn get_ref(&self) -> Option<&T> {
        self.inner.as_ref()
    }

    /// Consume the link and return the inner stream, if still open.
    pub fn into_inner(self) -> Option<T> {
        self.inner
    }
}

impl<T: Read + Write> Link for StreamLink<T> {
    fn write_exact(&mut self, bytes: &[u8]) -> Result<()> {
        let inner = self.inner.as_mut().ok_or(TransportError::Closed)?;
        let result = write_once(inner, bytes);
        if result.is_err() {
            self.inner = None;
        }
        result
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let inner = self.inner.as_mut().ok_or(TransportError::Closed)?;
        let result = read_full(inner, buf);
        if result.is_err() {
            self.inner = None;
        }
        result
    }
}

impl<T> std::fmt::Debug for StreamLink<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamLink")
            .field("open", &self.is_open())
            .finish()
    }
}

/// Issue one write for the whole buffer. Only `Interrupted` (nothing
/// transferred) is retried.
pub(crate) fn write_once<W: Write + ?Sized>(inner: &mut W, bytes: &[u8]) -> Result<()> {
    let expected = bytes.len();
    let written = loop {
        match inner.write(bytes) {
            Ok(n) => break n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                return Err(TransportError::ShortWrite {
                    written: 0,
                    expected,
                    source: Some(err),
                })
            }
        }
    };

    if written != expected {
        debug!(written, expected, "short write");
        return Err(TransportError::ShortWrite {
            written,
            expected,
            source: None,
        });
    }

    inner.flush().map_err(|err| TransportError::ShortWrite {
        written,
        expected,
        source: Some(err),
    })
}

/// Read until `buf` is full, the stream ends, or it fails.
pub(crate) fn read_full<R: Read + ?Sized>(inner: &mut R, buf: &mut [u8]) -> Result<()> {
    let expected = buf.len();
    let mut received = 0usize;

    while received < expected {
        match inner.read(&mut buf[received..]) {
            Ok(0) => {
                debug!(received, expected, "stream closed mid-read");
                return Err(TransportError::ShortRead {
                    received,
                    expected,
                    source: None,
                });
            }
            Ok(n) => received += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                return Err(TransportError::Timeout { received, expected });
            }
            Err(err) => {
                return Err(TransportError::ShortRead {
                    received,
                    expected,
                    source: Some(err),
                })
            }
        }
    }

    Ok(())
}
