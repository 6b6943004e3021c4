//! Lock-free hand-off of the latest reading to a display thread.
//!
//! Only the smoothed frequency crosses threads. The subscriber derives the
//! note and in-tune frequency from the value it loaded, so it can never see
//! a frequency paired with another cycle's note.

use atomic_float::AtomicF64;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::pipeline::PitchReading;
use crate::smoothing::NO_ESTIMATE;

/// Single-value slot written by the processing thread and read by the display.
#[derive(Debug)]
pub struct DisplaySlot {
    frequency: AtomicF64,
}

impl Default for DisplaySlot {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySlot {
    pub fn new() -> Self {
        Self {
            frequency: AtomicF64::new(NO_ESTIMATE),
        }
    }

    /// Convenience constructor for sharing between threads.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn publish(&self, reading: &PitchReading) {
        self.frequency
            .store(reading.frequency.unwrap_or(NO_ESTIMATE), Ordering::Release);
    }

    pub fn clear(&self) {
        self.frequency.store(NO_ESTIMATE, Ordering::Release);
    }

    /// The most recently published reading. `raw` is always `None`.
    pub fn latest(&self) -> PitchReading {
        let frequency = self.frequency.load(Ordering::Acquire);
        let frequency = (frequency > 0.0).then_some(frequency);
        PitchReading::from_frequency(None, frequency)
    }
}
