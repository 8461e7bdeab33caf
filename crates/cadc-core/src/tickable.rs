//! Trait for components advanced by the master tick.

use crate::Ticks;

/// A component that can be advanced by master clock ticks.
///
/// This is the outer abstraction of the model: the timing generator and the
/// complete machine implement it. Every tick carries the state of the global
/// reset line, which forces the component back to its power-on state instead
/// of advancing it.
pub trait Tickable {
    /// Advance the component by one master clock tick.
    fn tick(&mut self, reset: bool);

    /// Advance the component by multiple ticks with reset deasserted.
    ///
    /// Default implementation calls `tick(false)` in a loop. Components may
    /// override for efficiency, but must produce identical results.
    fn tick_n(&mut self, count: Ticks) {
        for _ in 0..count.get() {
            self.tick(false);
        }
    }
}
