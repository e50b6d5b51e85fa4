//! ALU opcode set.
//!
//! The wire carries any byte in the opcode slot; this enum is the closed
//! set the remote unit implements.

use std::fmt;
use std::str::FromStr;

use crate::error::FrameError;

/// An ALU operation selected by the first byte of a command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    Nop = 0,
    Add = 1,
    Sub = 2,
    Mul = 3,
    And = 4,
    Or = 5,
    Not = 6,
    Xor = 7,
}

impl OpCode {
    /// Every opcode, in wire order.
    pub const ALL: [OpCode; 8] = [
        OpCode::Nop,
        OpCode::Add,
        OpCode::Sub,
        OpCode::Mul,
        OpCode::And,
        OpCode::Or,
        OpCode::Not,
        OpCode::Xor,
    ];

    /// The wire byte.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Unary opcodes transmit operand `b` as zero.
    pub const fn is_unary(self) -> bool {
        matches!(self, OpCode::Nop | OpCode::Not)
    }

    /// Arithmetic opcodes take and return Q8.7 values; all others work on raw bit patterns.
    pub const fn is_arithmetic(self) -> bool {
        matches!(self, OpCode::Add | OpCode::Sub | OpCode::Mul)
    }

    /// Upper-case mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Nop => "NOP",
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::And => "AND",
            OpCode::Or => "OR",
            OpCode::Not => "NOT",
            OpCode::Xor => "XOR",
        }
    }
}

impl TryFrom<u8> for OpCode {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        OpCode::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(FrameError::InvalidOpcode(value))
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self {
        op.as_u8()
    }
}

/// Parses a mnemonic (case-insensitive) or a decimal opcode number.
impl FromStr for OpCode {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(op) = OpCode::ALL
            .iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(s))
        {
            return Ok(*op);
        }
        let value: u8 = s.parse().map_err(|_| FrameError::InvalidOperand {
            input: s.to_string(),
            reason: "expected an opcode mnemonic or number",
        })?;
        OpCode::try_from(value)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
