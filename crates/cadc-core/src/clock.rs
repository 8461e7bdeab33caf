//! Master clock configuration.

use crate::Ticks;

/// Master clock configuration.
///
/// The CADC runs from a 5 MHz crystal. Bit times, words, operations and
/// frames are all counted in these ticks.
#[derive(Debug, Clone, Copy)]
pub struct MasterClock {
    /// Crystal frequency in Hz.
    pub frequency_hz: u64,
}

impl MasterClock {
    /// The 5 MHz crystal of the original unit.
    pub const CADC: Self = Self::new(5_000_000);

    #[must_use]
    pub const fn new(frequency_hz: u64) -> Self {
        Self { frequency_hz }
    }

    /// Emulated wall time covered by `ticks`, in seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn seconds(&self, ticks: Ticks) -> f64 {
        ticks.get() as f64 / self.frequency_hz as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_frame_at_five_megahertz() {
        // 512 operations x 40 bit times
        let secs = MasterClock::CADC.seconds(Ticks::new(20_480));
        assert!((secs - 0.004_096).abs() < 1e-12);
    }
}
