//! Evaluate-then-commit contract for clocked blocks.

/// A clocked block whose next register state is a pure function of its
/// current state and the inputs presented during the tick.
///
/// The machine first computes every block's inputs from the previous tick's
/// registers, then commits all blocks. Because `step` only sees `&self`, no
/// block can observe another block's update from the same tick.
pub trait Synchronous: Sized {
    /// Signals presented to the block for one tick.
    type Inputs;

    /// Compute the register state after the next rising edge.
    #[must_use]
    fn step(&self, inputs: &Self::Inputs) -> Self;

    /// Apply the next state in place.
    ///
    /// Implementations may override this to avoid rebuilding large state,
    /// but the result must equal `step`.
    fn commit(&mut self, inputs: &Self::Inputs) {
        *self = self.step(inputs);
    }
}
