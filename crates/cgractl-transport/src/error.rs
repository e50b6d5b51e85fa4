use std::path::PathBuf;

/// Errors that can occur on the serial transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The device path could not be opened.
    #[error("failed to open {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The device opened but raw-mode configuration could not be applied.
    #[error("failed to configure {path}: {source}")]
    Configure {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The requested baud rate has no termios equivalent.
    #[error("unsupported baud rate {0}")]
    UnsupportedBaud(u32),

    /// Fewer bytes were accepted than requested.
    #[error("short write ({written} of {expected} bytes)")]
    ShortWrite {
        written: usize,
        expected: usize,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The channel closed or failed before all requested bytes arrived.
    #[error("short read ({received} of {expected} bytes)")]
    ShortRead {
        received: usize,
        expected: usize,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The configured read timeout elapsed before all requested bytes arrived.
    #[error("read timed out ({received} of {expected} bytes)")]
    Timeout { received: usize, expected: usize },

    /// The link was closed by an earlier failure or explicit close.
    #[error("link closed")]
    Closed,

    /// An I/O error outside of a read or write exchange.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
