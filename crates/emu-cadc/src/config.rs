//! CADC configuration.

use std::fmt;

use cadc_ras::DEFAULT_DEPTH;
use cadc_sequencer::{ConstantTable, ControlStore};

/// Largest supported timing pre-divider.
pub const MAX_CLK_DIV: u32 = 1 << 16;
/// Largest supported register file depth.
pub const MAX_RAS_DEPTH: usize = 1 << 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ClockDivider(u32),
    RegisterDepth(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClockDivider(div) => {
                write!(f, "invalid clock divider {div} (expected 1..={MAX_CLK_DIV})")
            }
            Self::RegisterDepth(depth) => {
                write!(f, "invalid register file depth {depth} (expected 1..={MAX_RAS_DEPTH})")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for creating a CADC instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CadcConfig {
    /// Timing generator pre-divider (master ticks per bit time).
    pub clk_div: u32,
    /// Register file depth in words.
    pub ras_depth: usize,
    pub control_store: ControlStore,
    pub constants: ConstantTable,
}

impl CadcConfig {
    /// Check the numeric parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_CLK_DIV).contains(&self.clk_div) {
            return Err(ConfigError::ClockDivider(self.clk_div));
        }
        if !(1..=MAX_RAS_DEPTH).contains(&self.ras_depth) {
            return Err(ConfigError::RegisterDepth(self.ras_depth));
        }
        Ok(())
    }
}

impl Default for CadcConfig {
    fn default() -> Self {
        Self {
            clk_div: 1,
            ras_depth: DEFAULT_DEPTH,
            control_store: ControlStore::new(),
            constants: ConstantTable::new(),
        }
    }
}
