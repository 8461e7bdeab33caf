//! CADC parallel multiplier unit (PMU).
//!
//! A radix-2 Booth multiplier that retires one multiplier bit per tick.
//! The product register holds the multiplier in its low bits with a zero
//! recoding bit below it; the multiplicand is aligned above the 20
//! multiplier bits so every add lands in the upper half before the shift.
//!
//! Timeline after the tick that samples `start`:
//!
//! | State     | Ticks | busy | done |
//! |-----------|-------|------|------|
//! | Computing | 20    | 1    | 0    |
//! | Rounding  | 1     | 1    | 0    |
//! | Finished  | 1     | 1    | 0    |
//! | Idle      | -     | 0    | 1 for one tick |
//!
//! `start` is only sampled in Idle. A start pulse while busy is dropped.

use cadc_core::{Observable, Synchronous, Value, Word};

/// Number of Booth iterations.
pub const ITERATIONS: u8 = 20;

/// Ticks for which `busy` reads high after a start is accepted.
pub const BUSY_TICKS: u32 = ITERATIONS as u32 + 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PmuState {
    #[default]
    Idle,
    Computing,
    Rounding,
    Finished,
}

/// Signals presented to the PMU on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PmuInputs {
    pub start: bool,
    /// Multiplicand (the accumulator in the full machine).
    pub operand_a: Word,
    /// Multiplier (the temp register in the full machine).
    pub operand_b: Word,
}

/// The multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pmu {
    state: PmuState,
    /// Product register. Needs 42 bits for the -1 x -1 corner.
    product: i64,
    /// Multiplicand shifted into the upper half.
    multiplicand: i64,
    bit_count: u8,
    result: Word,
    busy: bool,
    done: bool,
}

impl Pmu {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> PmuState {
        self.state
    }

    #[must_use]
    pub fn busy(&self) -> bool {
        self.busy
    }

    /// One-tick pulse after the result is valid.
    #[must_use]
    pub fn done(&self) -> bool {
        self.done
    }

    /// Last rounded product. Holds until the next multiply completes.
    #[must_use]
    pub fn result(&self) -> Word {
        self.result
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn booth_step(&self) -> i64 {
        let product = match self.product & 0b11 {
            0b01 => self.product + self.multiplicand,
            0b10 => self.product - self.multiplicand,
            _ => self.product,
        };
        product >> 1
    }

    /// Upper word of the product, rounded half-up on the first discarded bit.
    fn rounded(&self) -> Word {
        let upper = Word::new((self.product >> 20) as u32);
        if (self.product >> 19) & 1 != 0 {
            Word::new(upper.bits().wrapping_add(1))
        } else {
            upper
        }
    }
}

impl Synchronous for Pmu {
    type Inputs = PmuInputs;

    fn step(&self, inputs: &PmuInputs) -> Self {
        let mut next = *self;
        next.done = false;

        match self.state {
            PmuState::Idle => {
                if inputs.start {
                    next.multiplicand = i64::from(inputs.operand_a.to_i32()) << 21;
                    next.product = i64::from(inputs.operand_b.bits()) << 1;
                    next.bit_count = 0;
                    next.busy = true;
                    next.state = PmuState::Computing;
                }
            }
            PmuState::Computing => {
                next.product = self.booth_step();
                if self.bit_count == ITERATIONS - 1 {
                    next.state = PmuState::Rounding;
                } else {
                    next.bit_count = self.bit_count + 1;
                }
            }
            PmuState::Rounding => {
                next.result = self.rounded();
                next.state = PmuState::Finished;
            }
            PmuState::Finished => {
                next.done = true;
                next.busy = false;
                next.state = PmuState::Idle;
            }
        }

        next
    }
}

impl Observable for Pmu {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "result" => Some(self.result.into()),
            "busy" => Some(self.busy.into()),
            "done" => Some(self.done.into()),
            "state" => Some(format!("{:?}", self.state).as_str().into()),
            "bit_count" => Some(self.bit_count.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["result", "busy", "done", "state", "bit_count"]
    }
}
