//! Core traits and types for the cycle-accurate CADC model.
//!
//! Everything advances on the single master tick. All arithmetic is done on
//! 20-bit two's-complement fractions.

mod clock;
mod observable;
mod synchronous;
mod tickable;
mod ticks;
mod word;

pub use clock::MasterClock;
pub use observable::{Observable, Value};
pub use synchronous::Synchronous;
pub use tickable::Tickable;
pub use ticks::Ticks;
pub use word::Word;
