use bytes::BytesMut;
use cgractl_frame::{
    encode_command, AluValue, CommandFrame, FixedValue16, OpCode, ResponseFrame,
    COMMAND_FRAME_SIZE, RESPONSE_FRAME_SIZE,
};
use cgractl_transport::Link;
use tracing::{debug, warn};

use crate::error::{ProtocolError, Result};

/// Where a session is within an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// No exchange in flight.
    Idle,
    /// A command has been sent and its reply has not been fully received.
    AwaitingResponse,
}

/// Session behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Reject opcodes outside the ALU's instruction set before sending.
    /// When false, [`Session::execute_raw`] transmits any opcode byte as-is.
    pub validate_opcodes: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            validate_opcodes: true,
        }
    }
}

/// Run one exchange over `link`: send `[opcode, a, b]`, wait for the 2-byte result.
///
/// The result is returned as a 16-bit pattern; it is a Q8.7 value only for
/// arithmetic opcodes.
pub fn execute<L: Link + ?Sized>(
    opcode: OpCode,
    a: FixedValue16,
    b: FixedValue16,
    link: &mut L,
) -> Result<FixedValue16> {
    let mut buf = BytesMut::with_capacity(COMMAND_FRAME_SIZE);
    let frame = CommandFrame::new(opcode, a, b);
    let response = exchange(link, &mut buf, &frame)?;
    Ok(response.as_fixed())
}

fn exchange<L: Link + ?Sized>(
    link: &mut L,
    buf: &mut BytesMut,
    frame: &CommandFrame,
) -> Result<ResponseFrame> {
    buf.clear();
    encode_command(frame, buf);
    link.write_exact(buf).map_err(ProtocolError::SendFailed)?;
    debug!(frame = ?&buf[..], "command sent");

    let mut reply = [0u8; RESPONSE_FRAME_SIZE];
    link.read_exact(&mut reply).map_err(ProtocolError::RecvFailed)?;
    let response = ResponseFrame::new(u16::from_be_bytes(reply));
    debug!(result = format_args!("{:#06x}", response.value()), "response received");
    Ok(response)
}

/// An owned link plus exchange bookkeeping.
///
/// Every method that talks to the remote unit takes `&mut self`, so one
/// session can never have two exchanges in flight.
pub struct Session<L> {
    link: L,
    buf: BytesMut,
    state: ExchangeState,
    config: SessionConfig,
    completed: u64,
}

impl<L: Link> Session<L> {
    /// Create a session with default configuration.
    pub fn new(link: L) -> Self {
        Self::with_config(link, SessionConfig::default())
    }

    /// Create a session with explicit configuration.
    pub fn with_config(link: L, config: SessionConfig) -> Self {
        Self {
            link,
            buf: BytesMut::with_capacity(COMMAND_FRAME_SIZE),
            state: ExchangeState::Idle,
            config,
            completed: 0,
        }
    }

    /// Run one exchange for a known opcode. Unary opcodes send `b` as zero.
    pub fn execute(
        &mut self,
        opcode: OpCode,
        a: FixedValue16,
        b: FixedValue16,
    ) -> Result<FixedValue16> {
        let frame = CommandFrame::new(opcode, a, b);
        self.run(&frame).map(|response| response.as_fixed())
    }

    /// Run one exchange for an opcode byte.
    ///
    /// Unknown opcodes fail with [`ProtocolError::InvalidOpcode`] without
    /// touching the link, unless opcode validation is disabled.
    pub fn execute_raw(&mut self, opcode: u8, a: u16, b: u16) -> Result<u16> {
        let frame = match OpCode::try_from(opcode) {
            Ok(op) => CommandFrame::new(op, a.into(), b.into()),
            Err(_) if self.config.validate_opcodes => {
                return Err(ProtocolError::InvalidOpcode(opcode));
            }
            Err(_) => {
                warn!(opcode, "sending opcode outside the ALU instruction set");
                CommandFrame::from_raw(opcode, a, b)
            }
        };
        self.run(&frame).map(|response| response.value())
    }

    /// Run one exchange and interpret the result according to `opcode`.
    pub fn evaluate(
        &mut self,
        opcode: OpCode,
        a: FixedValue16,
        b: FixedValue16,
    ) -> Result<AluValue> {
        let result = self.execute(opcode, a, b)?;
        Ok(AluValue::interpret(Some(opcode), result.to_bits()))
    }

    /// Current exchange state.
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Number of exchanges that completed successfully.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Borrow the underlying link.
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Consume the session and return the link.
    pub fn into_inner(self) -> L {
        self.link
    }

    fn run(&mut self, frame: &CommandFrame) -> Result<ResponseFrame> {
        self.state = ExchangeState::AwaitingResponse;
        let result = exchange(&mut self.link, &mut self.buf, frame);
        self.state = ExchangeState::Idle;

        match &result {
            Ok(_) => self.completed += 1,
            Err(err) => warn!(opcode = frame.opcode_byte(), %err, "exchange failed"),
        }
        result
    }
}

impl<L> std::fmt::Debug for Session<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("completed", &self.completed)
            .field("config", &self.config)
            .finish()
    }
}
