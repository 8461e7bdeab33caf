//! Cycle-accurate model of the F-14 Central Air Data Computer core.
//!
//! The CADC is a microprogrammed fixed-point machine: a timing generator,
//! a control sequencer reading a 1024-word control store, an ALU with
//! accumulator/temp/flags, a serial Booth multiplier, a non-restoring
//! divider, a small register file behind a steering crossbar, and an I/O
//! bridge to the air data sensors and output channels. All of it advances
//! on one master tick.

mod cadc;
mod config;
pub mod image;
pub mod mcp;

pub use cadc::{Cadc, TickSignals};
pub use config::{CadcConfig, ConfigError, MAX_CLK_DIV, MAX_RAS_DEPTH};
pub use image::{Image, ImageError};

pub use cadc_core::{MasterClock, Observable, Tickable, Ticks, Value, Word};
pub use cadc_io::{OutputChannel, Outputs, SensorChannel, Sensors};
pub use cadc_sequencer::{ConstantTable, ControlStore, MicroWord, NextControl};
