//! CADC parallel divider unit (PDU).
//!
//! Non-restoring division on magnitudes, one quotient bit per tick, with
//! the signs reapplied in a final correction step. The divisor register is
//! aligned one place above the dividend magnitude so that the first
//! quotient bit carries unit weight and a fractional dividend smaller than
//! the divisor produces a fractional quotient:
//!
//! ```text
//! dividend * 2^19 == quotient * divisor + remainder     (|dividend| < |divisor|)
//! ```
//!
//! with `|remainder| < |divisor|` and the remainder taking the dividend's
//! sign. Quotients of magnitude one or more wrap to 20 bits.
//!
//! | State      | Ticks | busy |
//! |------------|-------|------|
//! | Setup      | 1     | 1    |
//! | Dividing   | 20    | 1    |
//! | Correction | 1     | 1    |
//! | Finished   | 1     | 1    |
//!
//! A zero divisor never leaves Idle: `done` and `div_by_zero` assert on the
//! tick after the start and both outputs read zero.

use cadc_core::{Observable, Synchronous, Value, Word};

/// Number of quotient bits developed.
pub const ITERATIONS: u8 = 20;

/// Ticks for which `busy` reads high after a start is accepted.
pub const BUSY_TICKS: u32 = ITERATIONS as u32 + 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PduState {
    #[default]
    Idle,
    Setup,
    Dividing,
    Correction,
    Finished,
}

/// Signals presented to the PDU on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PduInputs {
    pub start: bool,
    /// Dividend (the accumulator in the full machine).
    pub dividend: Word,
    /// Divisor (the temp register in the full machine).
    pub divisor: Word,
}

/// The divider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pdu {
    state: PduState,
    dividend_neg: bool,
    divisor_neg: bool,
    /// Magnitudes captured at start. -1 has magnitude 2^19.
    abs_dividend: i64,
    abs_divisor: i64,
    /// Signed partial remainder.
    partial: i64,
    /// Aligned divisor magnitude.
    divisor_reg: i64,
    quotient_bits: u32,
    bit_count: u8,
    quotient: Word,
    remainder: Word,
    div_by_zero: bool,
    busy: bool,
    done: bool,
}

impl Pdu {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> PduState {
        self.state
    }

    #[must_use]
    pub fn busy(&self) -> bool {
        self.busy
    }

    #[must_use]
    pub fn done(&self) -> bool {
        self.done
    }

    #[must_use]
    pub fn div_by_zero(&self) -> bool {
        self.div_by_zero
    }

    #[must_use]
    pub fn quotient(&self) -> Word {
        self.quotient
    }

    #[must_use]
    pub fn remainder(&self) -> Word {
        self.remainder
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn start(&mut self, dividend: Word, divisor: Word) {
        if divisor.is_zero() {
            self.div_by_zero = true;
            self.quotient = Word::ZERO;
            self.remainder = Word::ZERO;
            self.done = true;
            return;
        }

        self.div_by_zero = false;
        self.busy = true;
        self.dividend_neg = dividend.is_negative();
        self.divisor_neg = divisor.is_negative();
        self.abs_dividend = i64::from(dividend.to_i32()).abs();
        self.abs_divisor = i64::from(divisor.to_i32()).abs();
        self.state = PduState::Setup;
    }

    fn divide_step(&mut self) {
        self.partial = if self.partial >= 0 {
            2 * self.partial - self.divisor_reg
        } else {
            2 * self.partial + self.divisor_reg
        };
        self.quotient_bits = ((self.quotient_bits << 1) | u32::from(self.partial >= 0)) & Word::MASK;
    }

    fn correct(&mut self) {
        let mut partial = self.partial;
        if partial < 0 {
            partial += self.divisor_reg;
        }
        let magnitude = partial >> 1;

        let quotient = Word::new(self.quotient_bits);
        self.quotient = if self.dividend_neg == self.divisor_neg {
            quotient
        } else {
            quotient.wrapping_neg()
        };
        self.remainder = Word::from_i32(if self.dividend_neg {
            -(magnitude as i32)
        } else {
            magnitude as i32
        });
        self.partial = partial;
    }
}

impl Synchronous for Pdu {
    type Inputs = PduInputs;

    fn step(&self, inputs: &PduInputs) -> Self {
        let mut next = *self;
        next.done = false;

        match self.state {
            PduState::Idle => {
                if inputs.start {
                    next.start(inputs.dividend, inputs.divisor);
                }
            }
            PduState::Setup => {
                next.partial = self.abs_dividend;
                next.divisor_reg = self.abs_divisor << 1;
                next.quotient_bits = 0;
                next.bit_count = 0;
                next.state = PduState::Dividing;
            }
            PduState::Dividing => {
                next.divide_step();
                if self.bit_count == ITERATIONS - 1 {
                    next.state = PduState::Correction;
                } else {
                    next.bit_count = self.bit_count + 1;
                }
            }
            PduState::Correction => {
                next.correct();
                next.state = PduState::Finished;
            }
            PduState::Finished => {
                next.done = true;
                next.busy = false;
                next.state = PduState::Idle;
            }
        }

        next
    }
}

impl Observable for Pdu {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "quotient" | "q" => Some(self.quotient.into()),
            "remainder" | "r" => Some(self.remainder.into()),
            "busy" => Some(self.busy.into()),
            "done" => Some(self.done.into()),
            "dbz" | "div_by_zero" => Some(self.div_by_zero.into()),
            "state" => Some(format!("{:?}", self.state).as_str().into()),
            "bit_count" => Some(self.bit_count.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["quotient", "remainder", "busy", "done", "dbz", "state", "bit_count"]
    }
}
