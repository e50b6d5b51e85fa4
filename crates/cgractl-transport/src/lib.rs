//! Byte transport to the custom CPU.
//!
//! The remote unit speaks a strictly synchronous protocol over a UART:
//! - [`SerialLink`] opens a tty in raw 8N1 mode and performs exact-count I/O
//! - [`Link`] is the seam the command protocol is written against
//! - [`StreamLink`] adapts any `Read + Write` stream to [`Link`]
//!
//! Reads block without limit unless a timeout is configured. Any failed
//! read or write closes the link; it cannot be reused afterwards.

pub mod error;
pub mod link;

#[cfg(unix)]
pub mod serial;

pub use error::{Result, TransportError};
pub use link::{Link, StreamLink};

#[cfg(unix)]
pub use serial::{SerialConfig, SerialLink, DEFAULT_BAUD_RATE, DEFAULT_SERIAL_PATH};
