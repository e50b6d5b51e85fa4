use bytes::{Buf, BufMut, BytesMut};

use crate::error::{FrameError, Result};
use crate::fixed::FixedValue16;
use crate::opcode::OpCode;

/// Command frame: opcode (1) + operand a (2) + operand b (2) = 5 bytes.
pub const COMMAND_FRAME_SIZE: usize = 5;

/// Response frame: one big-endian 16-bit result.
pub const RESPONSE_FRAME_SIZE: usize = 2;

/// An immutable 5-byte request.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────────┬──────────────┐
/// │ Opcode   │ Operand a    │ Operand b    │
/// │ (1B)     │ (2B BE)      │ (2B BE)      │
/// └──────────┴──────────────┴──────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    bytes: [u8; COMMAND_FRAME_SIZE],
}

impl CommandFrame {
    /// Build a frame for a known opcode. Unary opcodes send `b` as zero.
    pub fn new(opcode: OpCode, a: FixedValue16, b: FixedValue16) -> Self {
        let b = if opcode.is_unary() {
            FixedValue16::ZERO
        } else {
            b
        };
        Self::from_raw(opcode.as_u8(), a.to_bits(), b.to_bits())
    }

    /// Build a frame with an unchecked opcode byte.
    pub fn from_raw(opcode: u8, a: u16, b: u16) -> Self {
        let [a_hi, a_lo] = a.to_be_bytes();
        let [b_hi, b_lo] = b.to_be_bytes();
        Self {
            bytes: [opcode, a_hi, a_lo, b_hi, b_lo],
        }
    }

    /// Rebuild a frame from exactly five wire bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; COMMAND_FRAME_SIZE] =
            bytes.try_into().map_err(|_| FrameError::InvalidLength {
                expected: COMMAND_FRAME_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self { bytes })
    }

    /// The opcode byte as sent.
    pub fn opcode_byte(&self) -> u8 {
        self.bytes[0]
    }

    /// The opcode, if it is a known one.
    pub fn opcode(&self) -> Result<OpCode> {
        OpCode::try_from(self.bytes[0])
    }

    pub fn operand_a(&self) -> u16 {
        u16::from_be_bytes([self.bytes[1], self.bytes[2]])
    }

    pub fn operand_b(&self) -> u16 {
        u16::from_be_bytes([self.bytes[3], self.bytes[4]])
    }

    /// The exact wire bytes.
    pub fn as_bytes(&self) -> &[u8; COMMAND_FRAME_SIZE] {
        &self.bytes
    }
}

/// An immutable 2-byte reply carrying one 16-bit result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFrame {
    bytes: [u8; RESPONSE_FRAME_SIZE],
}

impl ResponseFrame {
    pub fn new(value: u16) -> Self {
        Self {
            bytes: value.to_be_bytes(),
        }
    }

    /// Rebuild a frame from exactly two wire bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; RESPONSE_FRAME_SIZE] =
            bytes.try_into().map_err(|_| FrameError::InvalidLength {
                expected: RESPONSE_FRAME_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self { bytes })
    }

    /// The big-endian 16-bit result.
    pub fn value(&self) -> u16 {
        u16::from_be_bytes(self.bytes)
    }

    /// The result viewed as a Q8.7 value.
    pub fn as_fixed(&self) -> FixedValue16 {
        FixedValue16::from_be_bytes(self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8; RESPONSE_FRAME_SIZE] {
        &self.bytes
    }
}

/// Append a command frame to `dst`.
pub fn encode_command(frame: &CommandFrame, dst: &mut BytesMut) {
    dst.reserve(COMMAND_FRAME_SIZE);
    dst.put_u8(frame.opcode_byte());
    dst.put_u16(frame.operand_a());
    dst.put_u16(frame.operand_b());
}

/// Decode a command frame from a buffer.
///
/// Returns `None` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_command(src: &mut BytesMut) -> Option<CommandFrame> {
    if src.len() < COMMAND_FRAME_SIZE {
        return None;
    }
    let opcode = src.get_u8();
    let a = src.get_u16();
    let b = src.get_u16();
    Some(CommandFrame::from_raw(opcode, a, b))
}

/// Append a response frame to `dst`.
pub fn encode_response(frame: &ResponseFrame, dst: &mut BytesMut) {
    dst.reserve(RESPONSE_FRAME_SIZE);
    dst.put_u16(frame.value());
}

/// Decode a response frame from a buffer.
///
/// Returns `None` if fewer than two bytes are buffered.
pub fn decode_response(src: &mut BytesMut) -> Option<ResponseFrame> {
    if src.len() < RESPONSE_FRAME_SIZE {
        return None;
    }
    Some(ResponseFrame::new(src.get_u16()))
}
