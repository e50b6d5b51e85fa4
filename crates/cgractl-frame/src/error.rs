/// Errors that can occur while building or decoding ALU frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The opcode byte does not name a known ALU operation.
    #[error("invalid opcode {0} (expected 0..=7)")]
    InvalidOpcode(u8),

    /// A frame was built from a buffer of the wrong size.
    #[error("invalid frame length ({actual} bytes, expected {expected})")]
    InvalidLength { expected: usize, actual: usize },

    /// An operand string could not be parsed for the selected opcode.
    #[error("invalid operand {input:?}: {reason}")]
    InvalidOperand { input: String, reason: &'static str },

    /// A real operand lies outside the representable Q8.7 range.
    #[error("value {0} out of range (expected -256.000 to 255.992)")]
    OutOfRange(f64),
}

pub type Result<T> = std::result::Result<T, FrameError>;
