//! The 20-bit fractional machine word.

use std::fmt;

/// A 20-bit two's-complement fraction in [-1, 1).
///
/// The binary point sits immediately after the sign bit, so one LSB is
/// 2^-19. The raw bits are stored in the low 20 bits of a `u32`; the upper
/// bits are always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Word(u32);

impl Word {
    /// Width of a word in bits.
    pub const BITS: u32 = 20;
    /// Mask of the valid bits.
    pub const MASK: u32 = 0xF_FFFF;
    /// The sign bit.
    pub const SIGN: u32 = 0x8_0000;

    pub const ZERO: Self = Self(0);
    /// Largest positive value, 1 - 2^-19.
    pub const MAX: Self = Self(0x7_FFFF);
    /// Most negative value, -1.
    pub const MIN: Self = Self(0x8_0000);
    /// All bits set (-2^-19).
    pub const ONES: Self = Self(Self::MASK);

    /// Build a word from raw bits; anything above bit 19 is discarded.
    #[must_use]
    pub const fn new(bits: u32) -> Self {
        Self(bits & Self::MASK)
    }

    /// Raw bit pattern.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Build a word from a signed integer count of LSBs, wrapping to 20 bits.
    #[must_use]
    pub const fn from_i32(value: i32) -> Self {
        Self((value as u32) & Self::MASK)
    }

    /// Signed integer count of LSBs (-524288..=524287).
    #[must_use]
    pub const fn to_i32(self) -> i32 {
        ((self.0 << 12) as i32) >> 12
    }

    /// Nearest word at or below `value`, saturating outside [-1, 1).
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        let scaled = (value * f64::from(1u32 << 19)).floor();
        let clamped = scaled.clamp(-524_288.0, 524_287.0);
        Self::from_i32(clamped as i32)
    }

    /// The fraction this word represents.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        f64::from(self.to_i32()) / f64::from(1u32 << 19)
    }

    /// State of bit `n` (0 = LSB, 19 = sign).
    #[must_use]
    pub const fn bit(self, n: u32) -> bool {
        (self.0 >> n) & 1 != 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 & Self::SIGN != 0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Two's-complement negation; -1 negates to itself.
    #[must_use]
    pub const fn wrapping_neg(self) -> Self {
        Self(self.0.wrapping_neg() & Self::MASK)
    }
}

impl From<Word> for u32 {
    fn from(word: Word) -> Self {
        word.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:05X}", self.0)
    }
}

impl fmt::UpperHex for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}
