use std::fmt;

/// Number of fractional bits in the wire format.
pub const FRAC_BITS: u32 = 7;

/// Scale factor between real values and their fixed-point encoding (2^7).
pub const SCALE: f64 = (1u32 << FRAC_BITS) as f64;

/// Largest representable value: `0x7FFF / 128`.
pub const MAX_VALUE: f64 = 255.9921875;

/// Smallest representable value: `0x8000 / 128`.
pub const MIN_VALUE: f64 = -256.0;

/// A 16-bit signed Q8.7 fixed-point value (1 sign bit, 8 integer bits, 7 fractional bits).
///
/// The bit pattern is the two's-complement encoding of `round(value * 128)`.
/// Bitwise ALU operations reuse this type as a plain 16-bit container; use
/// [`FixedValue16::from_bits`] and [`FixedValue16::to_bits`] for those.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FixedValue16(u16);

impl FixedValue16 {
    /// Encoding of `0.0`.
    pub const ZERO: Self = Self(0x0000);
    /// Encoding of [`MAX_VALUE`].
    pub const MAX: Self = Self(0x7FFF);
    /// Encoding of [`MIN_VALUE`].
    pub const MIN: Self = Self(0x8000);

    /// Wrap a raw 16-bit pattern.
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// The raw 16-bit pattern.
    pub const fn to_bits(self) -> u16 {
        self.0
    }

    /// Encode a real value.
    ///
    /// Out-of-range input is clamped to `[MIN_VALUE, MAX_VALUE]` without error.
    /// Rounding is half away from zero. NaN encodes as zero.
    pub fn encode(value: f64) -> Self {
        let clamped = value.clamp(MIN_VALUE, MAX_VALUE);
        let scaled = clamped * SCALE;
        let rounded = if clamped >= 0.0 {
            scaled + 0.5
        } else {
            scaled - 0.5
        };
        // `as i32` truncates toward zero and maps NaN to 0.
        Self(rounded as i32 as i16 as u16)
    }

    /// Decode to a real value by sign-extending and dividing by 128.
    pub fn decode(self) -> f64 {
        f64::from(self.0 as i16) / SCALE
    }

    /// Big-endian wire bytes `[hi, lo]`.
    pub const fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    /// Build from big-endian wire bytes `[hi, lo]`.
    pub const fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }
}

impl From<u16> for FixedValue16 {
    fn from(bits: u16) -> Self {
        Self(bits)
    }
}

impl From<FixedValue16> for u16 {
    fn from(value: FixedValue16) -> Self {
        value.0
    }
}

impl fmt::Display for FixedValue16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.decode())
    }
}

impl fmt::UpperHex for FixedValue16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

impl fmt::Binary for FixedValue16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Binary::fmt(&self.0, f)
    }
}

/// Encode a real value into its 16-bit wire pattern.
pub fn encode(value: f64) -> u16 {
    FixedValue16::encode(value).to_bits()
}

/// Decode a 16-bit wire pattern into a real value.
pub fn decode(bits: u16) -> f64 {
    FixedValue16::from_bits(bits).decode()
}
