use std::fmt;
use std::io;

use cgractl_bus::BusError;
use cgractl_frame::FrameError;
use cgractl_protocol::ProtocolError;
use cgractl_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;
pub const INTERRUPTED: i32 = 130;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::OpenFailed { path, source } => {
            io_error(&format!("{context}: {}", path.display()), source)
        }
        TransportError::Io(source) => io_error(context, source),
        TransportError::UnsupportedBaud(_) => CliError::usage(format!("{context}: {err}")),
        TransportError::Timeout { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn bus_error(context: &str, err: BusError) -> CliError {
    match err {
        BusError::DeviceNotFound {
            source: Some(ref source),
            ..
        } => CliError::new(FAILURE, format!("{context}: {err} ({source})")),
        BusError::DeviceNotFound { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
        BusError::MapFailed { path, source } => {
            io_error(&format!("{context}: {}", path.display()), source)
        }
        BusError::AlreadyMapped { .. } => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::InvalidLength { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::usage(format!("{context}: {other}")),
    }
}

pub fn protocol_error(context: &str, err: ProtocolError) -> CliError {
    match err {
        ProtocolError::InvalidOpcode(_) => CliError::usage(format!("{context}: {err}")),
        ProtocolError::SendFailed(err) => transport_error(&format!("{context}: send"), err),
        ProtocolError::RecvFailed(err) => transport_error(&format!("{context}: receive"), err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_map_to_124() {
        let err = protocol_error(
            "exchange failed",
            ProtocolError::RecvFailed(TransportError::Timeout {
                received: 1,
                expected: 2,
            }),
        );
        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.starts_with("exchange failed: receive: "));
    }

    #[test]
    fn short_read_is_a_transport_error() {
        let err = protocol_error(
            "exchange failed",
            ProtocolError::RecvFailed(TransportError::ShortRead {
                received: 0,
                expected: 2,
                source: None,
            }),
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
    }

    #[test]
    fn missing_port_is_failure_with_path() {
        let err = transport_error(
            "open failed",
            TransportError::OpenFailed {
                path: "/dev/ttyUSB9".into(),
                source: io::Error::from(io::ErrorKind::NotFound),
            },
        );
        assert_eq!(err.code, FAILURE);
        assert!(err.message.contains("/dev/ttyUSB9"));
    }

    #[test]
    fn device_not_found_keeps_os_cause() {
        let err = bus_error(
            "discovery failed",
            BusError::DeviceNotFound {
                name: "CGRA".to_string(),
                source: Some(io::Error::from(io::ErrorKind::PermissionDenied)),
            },
        );
        assert_eq!(err.code, FAILURE);
        assert!(err.message.contains("not found"));
        assert!(err.message.contains("permission denied"));
    }

    #[test]
    fn bad_operands_are_usage_errors() {
        let err = frame_error("invalid operand a", FrameError::OutOfRange(300.0));
        assert_eq!(err.code, USAGE);
        let err = protocol_error("exchange failed", ProtocolError::InvalidOpcode(9));
        assert_eq!(err.code, USAGE);
    }
}
