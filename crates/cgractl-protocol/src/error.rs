use cgractl_transport::TransportError;

/// Errors that end an ALU exchange.
///
/// None of these are retried; the remote unit's state after a partial
/// exchange is unknown, so a caller must start a fresh exchange.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The opcode is outside the ALU's instruction set; nothing was sent.
    #[error("invalid opcode {0} (expected 0..=7)")]
    InvalidOpcode(u8),

    /// The command frame could not be transmitted.
    #[error("send failed: {0}")]
    SendFailed(#[source] TransportError),

    /// The response frame was not fully received.
    #[error("receive failed: {0}")]
    RecvFailed(#[source] TransportError),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
