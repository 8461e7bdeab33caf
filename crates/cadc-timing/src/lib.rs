//! CADC timing generator.
//!
//! Derives the two phase clocks and the three-level counter hierarchy that
//! paces the whole processor from the master tick:
//!
//! | Level     | Range  | Advances                         |
//! |-----------|--------|----------------------------------|
//! | bit time  | 0-19   | every (divided) tick             |
//! | word type | WA, WO | when bit time wraps 19 -> 0      |
//! | operation | 0-511  | when bit time wraps during WO    |
//!
//! One operation is 40 bit times and one frame is 512 operations, so a
//! frame is 20,480 ticks with the divider at 1.
//!
//! Word mark and frame mark are combinational: they describe the state the
//! generator is in *now*, qualified by the divided tick, so logic clocked on
//! the same edge sees them before the counters move.

use cadc_core::{Observable, Tickable, Value};

/// Bit times per word.
pub const BITS_PER_WORD: u8 = 20;
/// Operations per frame.
pub const OPS_PER_FRAME: u16 = 512;
/// Master ticks in one frame with the divider at 1.
pub const TICKS_PER_FRAME: u64 = 2 * BITS_PER_WORD as u64 * OPS_PER_FRAME as u64;

/// Which half of an operation slot is being clocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordType {
    /// First word of the operation.
    #[default]
    Wa,
    /// Second word of the operation.
    Wo,
}

impl WordType {
    #[must_use]
    pub const fn is_wo(self) -> bool {
        matches!(self, Self::Wo)
    }
}

/// Master timing generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingGenerator {
    /// Pre-divider factor (1 = every master tick).
    clk_div: u32,
    /// Pre-divider counter, 0..clk_div-1. The generator advances when it is 0.
    div_count: u32,
    bit_count: u8,
    word_type: WordType,
    op_count: u16,
    phi1: bool,
    phi2: bool,
}

impl TimingGenerator {
    /// Create a generator in its reset state. A divider of 0 is treated as 1.
    #[must_use]
    pub fn new(clk_div: u32) -> Self {
        Self {
            clk_div: clk_div.max(1),
            div_count: 0,
            bit_count: 0,
            word_type: WordType::Wa,
            op_count: 0,
            phi1: false,
            phi2: false,
        }
    }

    /// True when the current master tick is a divided tick.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.clk_div == 1 || self.div_count == 0
    }

    /// Word mark: bit time 18, one tick before the bit counter wraps.
    #[must_use]
    pub fn word_mark(&self) -> bool {
        self.bit_count == BITS_PER_WORD - 2 && self.enabled()
    }

    /// Frame mark: last bit of the WO word of operation 511.
    #[must_use]
    pub fn frame_mark(&self) -> bool {
        self.bit_count == BITS_PER_WORD - 1
            && self.word_type.is_wo()
            && self.op_count == OPS_PER_FRAME - 1
            && self.enabled()
    }

    #[must_use]
    pub fn bit_count(&self) -> u8 {
        self.bit_count
    }

    #[must_use]
    pub fn word_type(&self) -> WordType {
        self.word_type
    }

    #[must_use]
    pub fn op_count(&self) -> u16 {
        self.op_count
    }

    #[must_use]
    pub fn phi1(&self) -> bool {
        self.phi1
    }

    #[must_use]
    pub fn phi2(&self) -> bool {
        self.phi2
    }

    #[must_use]
    pub fn clk_div(&self) -> u32 {
        self.clk_div
    }

    /// Force every counter and phase back to zero, keeping the divider.
    pub fn reset(&mut self) {
        *self = Self::new(self.clk_div);
    }

    fn advance(&mut self) {
        if self.enabled() {
            self.phi2 = self.phi1;
            self.phi1 = !self.phi1;

            if self.bit_count == BITS_PER_WORD - 1 {
                self.bit_count = 0;
                match self.word_type {
                    WordType::Wa => self.word_type = WordType::Wo,
                    WordType::Wo => {
                        self.word_type = WordType::Wa;
                        self.op_count = (self.op_count + 1) % OPS_PER_FRAME;
                    }
                }
            } else {
                self.bit_count += 1;
            }
        }

        self.div_count = if self.div_count + 1 >= self.clk_div {
            0
        } else {
            self.div_count + 1
        };
    }
}

impl Default for TimingGenerator {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Tickable for TimingGenerator {
    fn tick(&mut self, reset: bool) {
        if reset {
            self.reset();
        } else {
            self.advance();
        }
    }
}

impl Observable for TimingGenerator {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "bit" => Some(self.bit_count.into()),
            "word_type" => Some(
                match self.word_type {
                    WordType::Wa => "WA",
                    WordType::Wo => "WO",
                }
                .into(),
            ),
            "op" => Some(self.op_count.into()),
            "phi1" => Some(self.phi1.into()),
            "phi2" => Some(self.phi2.into()),
            "word_mark" => Some(self.word_mark().into()),
            "frame_mark" => Some(self.frame_mark().into()),
            "clk_div" => Some(self.clk_div.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "bit",
            "word_type",
            "op",
            "phi1",
            "phi2",
            "word_mark",
            "frame_mark",
            "clk_div",
        ]
    }
}
