//! CADC random access storage (RAS) and steering logic (SL).
//!
//! The register file has one read port and one write port that share a
//! single address. The read is combinational; a write lands at the end of
//! the tick, so a read during a write tick returns the old contents.
//!
//! The steering network is the crossbar that picks the ALU operand, the
//! register file write data and the I/O bridge write data from the machine's
//! data sources. It holds no state.

mod steering;

pub use steering::{
    AluSource, IoSource, RasSource, SteeringOutputs, SteeringSelect, SteeringSources, steer,
};

use cadc_core::{Observable, Synchronous, Value, Word};

/// Default number of words in the register file.
pub const DEFAULT_DEPTH: usize = 64;

/// Write-port signals for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RasInputs {
    pub write_enable: bool,
    /// Shared read/write address.
    pub address: u8,
    pub write_data: Word,
}

/// The register file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    words: Vec<Word>,
}

impl RegisterFile {
    /// Create a zeroed register file. A depth of 0 is treated as 1.
    #[must_use]
    pub fn new(depth: usize) -> Self {
        Self {
            words: vec![Word::ZERO; depth.max(1)],
        }
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.words.len()
    }

    fn index(&self, address: u8) -> usize {
        usize::from(address) % self.words.len()
    }

    /// Combinational read port.
    #[must_use]
    pub fn read(&self, address: u8) -> Word {
        self.words[self.index(address)]
    }

    #[must_use]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Preload a word. Intended for test setup.
    pub fn poke(&mut self, address: u8, value: Word) {
        let index = self.index(address);
        self.words[index] = value;
    }

    pub fn reset(&mut self) {
        self.words.fill(Word::ZERO);
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH)
    }
}

impl Synchronous for RegisterFile {
    type Inputs = RasInputs;

    fn step(&self, inputs: &RasInputs) -> Self {
        let mut next = self.clone();
        next.commit(inputs);
        next
    }

    fn commit(&mut self, inputs: &RasInputs) {
        if inputs.write_enable {
            let index = self.index(inputs.address);
            self.words[index] = inputs.write_data;
        }
    }
}

impl Observable for RegisterFile {
    fn query(&self, path: &str) -> Option<Value> {
        if path == "words" {
            return Some(Value::Array(self.words.iter().map(|&w| w.into()).collect()));
        }
        if path == "depth" {
            return Some(Value::U64(self.words.len() as u64));
        }
        // "r<n>" reads entry n.
        let index: usize = path.strip_prefix('r')?.parse().ok()?;
        self.words.get(index).map(|&w| w.into())
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["words", "depth", "r<n>"]
    }
}
