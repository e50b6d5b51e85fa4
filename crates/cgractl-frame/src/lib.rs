//! Wire formats for the CGRA ALU command link.
//!
//! Every exchange is one fixed-size request followed by one fixed-size reply:
//! - A 5-byte command frame: opcode, then operands `a` and `b` as big-endian 16-bit words
//! - A 2-byte response frame: the big-endian 16-bit result
//!
//! Operands and results of arithmetic opcodes are Q8.7 fixed-point values
//! (see [`FixedValue16`]); bitwise opcodes carry opaque 16-bit patterns.

pub mod codec;
pub mod error;
pub mod fixed;
pub mod opcode;
pub mod operand;

pub use codec::{
    decode_command, decode_response, encode_command, encode_response, CommandFrame,
    ResponseFrame, COMMAND_FRAME_SIZE, RESPONSE_FRAME_SIZE,
};
pub use error::{FrameError, Result};
pub use fixed::{decode, encode, FixedValue16, FRAC_BITS, MAX_VALUE, MIN_VALUE, SCALE};
pub use opcode::OpCode;
pub use operand::{check_range, parse_hex_word, parse_operand, parse_real, AluValue};
