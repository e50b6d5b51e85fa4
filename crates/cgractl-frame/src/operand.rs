//! Operand parsing and result interpretation.
//!
//! Arithmetic opcodes exchange Q8.7 values; every other opcode exchanges
//! raw 16-bit patterns written in hexadecimal.

use std::fmt;

use crate::error::{FrameError, Result};
use crate::fixed::{FixedValue16, MAX_VALUE, MIN_VALUE};
use crate::opcode::OpCode;

/// Parse a user-supplied operand for `op`.
///
/// Arithmetic opcodes take a decimal real (clamped on encode), the rest a
/// hexadecimal word with an optional `0x` prefix.
pub fn parse_operand(op: OpCode, input: &str) -> Result<FixedValue16> {
    if op.is_arithmetic() {
        let value = parse_real(input)?;
        Ok(FixedValue16::encode(value))
    } else {
        parse_hex_word(input).map(FixedValue16::from_bits)
    }
}

/// Parse a decimal real number.
pub fn parse_real(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    let value: f64 = trimmed.parse().map_err(|_| FrameError::InvalidOperand {
        input: trimmed.to_string(),
        reason: "expected a decimal number",
    })?;
    if value.is_nan() {
        return Err(FrameError::InvalidOperand {
            input: trimmed.to_string(),
            reason: "NaN is not a value",
        });
    }
    Ok(value)
}

/// Parse a 16-bit hexadecimal word, with or without a `0x` prefix.
pub fn parse_hex_word(input: &str) -> Result<u16> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u16::from_str_radix(digits, 16).map_err(|_| FrameError::InvalidOperand {
        input: trimmed.to_string(),
        reason: "expected a 16-bit hexadecimal word",
    })
}

/// Reject reals the wire format cannot represent instead of clamping them.
pub fn check_range(value: f64) -> Result<f64> {
    if (MIN_VALUE..=MAX_VALUE).contains(&value) {
        Ok(value)
    } else {
        Err(FrameError::OutOfRange(value))
    }
}

/// A 16-bit ALU result, interpreted according to the opcode that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluValue {
    /// Result of an arithmetic opcode.
    Fixed(FixedValue16),
    /// Opaque bit pattern from a bitwise (or unknown) opcode.
    Bits(u16),
}

impl AluValue {
    /// Interpret `bits` as the result of `op`. Unknown opcodes yield raw bits.
    pub fn interpret(op: Option<OpCode>, bits: u16) -> Self {
        match op {
            Some(op) if op.is_arithmetic() => AluValue::Fixed(FixedValue16::from_bits(bits)),
            _ => AluValue::Bits(bits),
        }
    }

    /// The underlying 16-bit pattern.
    pub fn bits(&self) -> u16 {
        match self {
            AluValue::Fixed(v) => v.to_bits(),
            AluValue::Bits(bits) => *bits,
        }
    }

    /// The real value, for arithmetic results only.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            AluValue::Fixed(v) => Some(v.decode()),
            AluValue::Bits(_) => None,
        }
    }
}

/// Arithmetic results print as `3.750`, bit patterns as `0x01E0`.
impl fmt::Display for AluValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AluValue::Fixed(v) => write!(f, "{v}"),
            AluValue::Bits(bits) => write!(f, "0x{bits:04X}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_operands_are_fixed_point() {
        assert_eq!(parse_operand(OpCode::Add, "1.5").unwrap().to_bits(), 0x00C0);
        assert_eq!(parse_operand(OpCode::Mul, " -0.5 ").unwrap().to_bits(), 0xFFC0);
        // Clamped, not rejected.
        assert_eq!(parse_operand(OpCode::Sub, "1000").unwrap(), FixedValue16::MAX);
        assert!(parse_operand(OpCode::Add, "abc").is_err());
        assert!(parse_operand(OpCode::Add, "NaN").is_err());
    }

    #[test]
    fn bitwise_operands_are_hex() {
        assert_eq!(parse_operand(OpCode::And, "00ff").unwrap().to_bits(), 0x00FF);
        assert_eq!(parse_operand(OpCode::Xor, "0xBEEF").unwrap().to_bits(), 0xBEEF);
        assert_eq!(parse_operand(OpCode::Not, "0X10").unwrap().to_bits(), 0x0010);
        assert!(matches!(
            parse_operand(OpCode::Or, "10000"),
            Err(FrameError::InvalidOperand { .. })
        ));
        assert!(parse_operand(OpCode::Or, "zz").is_err());
    }

    #[test]
    fn range_check_is_strict() {
        assert_eq!(check_range(-256.0).unwrap(), -256.0);
        assert_eq!(check_range(255.9921875).unwrap(), 255.9921875);
        assert!(matches!(check_range(256.0), Err(FrameError::OutOfRange(_))));
        assert!(check_range(-256.01).is_err());
        assert!(check_range(f64::NAN).is_err());
    }

    #[test]
    fn interpretation_follows_opcode() {
        let sum = AluValue::interpret(Some(OpCode::Add), 0x01E0);
        assert_eq!(sum.as_real(), Some(3.75));
        assert_eq!(sum.to_string(), "3.750");

        let mask = AluValue::interpret(Some(OpCode::And), 0x01E0);
        assert_eq!(mask.as_real(), None);
        assert_eq!(mask.to_string(), "0x01E0");
        assert_eq!(mask.bits(), sum.bits());

        assert_eq!(AluValue::interpret(None, 7), AluValue::Bits(7));
        assert_eq!(
            AluValue::interpret(Some(OpCode::Nop), 0xFFFF).to_string(),
            "0xFFFF"
        );
    }
}
