//! CADC control sequencer.
//!
//! Fetches the microword at the micro program counter, fans its fields out
//! as the control signals for the tick, and chooses the next address. The
//! return stack is a 4-slot circular buffer: a fifth nested call overwrites
//! the oldest return address, and a return with nothing pushed falls
//! through to the next sequential address.
//!
//! Frame mark from the timing generator wins over every other decision: the
//! next address is forced to 0 and the return stack is left untouched.

mod microword;
mod store;

pub use microword::{MICROWORD_MASK, MicroWord, NextControl};
pub use store::{
    CONSTANT_TABLE_DEPTH, CONTROL_STORE_DEPTH, ConstantTable, ControlStore, StoreError,
};

use cadc_core::{Observable, Synchronous, Value};
use cadc_slf::Flags;

/// Micro program counter mask (10 bits).
pub const PC_MASK: u16 = 0x3FF;
/// Return stack slots.
pub const STACK_DEPTH: usize = 4;

/// Status presented to the sequencer on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SequencerInputs {
    /// The microword fetched at the current address.
    pub word: MicroWord,
    /// Registered ALU flags.
    pub flags: Flags,
    pub pmu_busy: bool,
    pub pdu_busy: bool,
    pub frame_mark: bool,
}

/// Micro program counter and return stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlSequencer {
    pc: u16,
    stack: [u16; STACK_DEPTH],
    /// Next free slot.
    top: u8,
    /// Live entries, saturating at `STACK_DEPTH`.
    depth: u8,
}

impl ControlSequencer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Number of return addresses that a return can still pop.
    #[must_use]
    pub fn depth(&self) -> u8 {
        self.depth
    }

    #[must_use]
    pub fn top(&self) -> u8 {
        self.top
    }

    #[must_use]
    pub fn stack(&self) -> [u16; STACK_DEPTH] {
        self.stack
    }

    /// Microword at the current address.
    #[must_use]
    pub fn fetch(&self, store: &ControlStore) -> MicroWord {
        store.fetch(self.pc)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Point the counter somewhere else. Intended for test setup.
    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc & PC_MASK;
    }

    fn sequential(&self) -> u16 {
        (self.pc + 1) & PC_MASK
    }

    fn branch(&self, taken: bool, word: &MicroWord) -> u16 {
        if taken { word.target() } else { self.sequential() }
    }

    fn wait(&self, busy: bool) -> u16 {
        if busy { self.pc } else { self.sequential() }
    }

    /// Combinational next address for the given inputs.
    #[must_use]
    pub fn next_address(&self, inputs: &SequencerInputs) -> u16 {
        self.step(inputs).pc
    }
}

impl Synchronous for ControlSequencer {
    type Inputs = SequencerInputs;

    fn step(&self, inputs: &SequencerInputs) -> Self {
        let mut next = *self;

        if inputs.frame_mark {
            next.pc = 0;
            return next;
        }

        let word = &inputs.word;
        let flags = inputs.flags;
        next.pc = match word.next_control {
            NextControl::Seq | NextControl::Other(_) => self.sequential(),
            NextControl::Jump => word.target(),
            NextControl::BranchZero => self.branch(flags.z, word),
            NextControl::BranchNegative => self.branch(flags.n, word),
            NextControl::BranchCarry => self.branch(flags.c, word),
            NextControl::BranchPmuBusy => self.branch(inputs.pmu_busy, word),
            NextControl::BranchPduBusy => self.branch(inputs.pdu_busy, word),
            NextControl::WaitPmu => self.wait(inputs.pmu_busy),
            NextControl::WaitPdu => self.wait(inputs.pdu_busy),
            NextControl::Call => {
                next.stack[usize::from(self.top)] = self.sequential();
                next.top = (self.top + 1) % STACK_DEPTH as u8;
                next.depth = (self.depth + 1).min(STACK_DEPTH as u8);
                word.target()
            }
            NextControl::Return => {
                if self.depth == 0 {
                    self.sequential()
                } else {
                    next.top = (self.top + STACK_DEPTH as u8 - 1) % STACK_DEPTH as u8;
                    next.depth = self.depth - 1;
                    self.stack[usize::from(next.top)]
                }
            }
        };

        next
    }
}

impl Observable for ControlSequencer {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pc" => Some(self.pc.into()),
            "depth" => Some(self.depth.into()),
            "top" => Some(self.top.into()),
            "stack" => Some(Value::Array(self.stack.iter().map(|&a| a.into()).collect())),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["pc", "depth", "top", "stack"]
    }
}
