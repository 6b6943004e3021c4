use super::{Estimator, valid_frequency};

/// Zero-crossing statistics of a signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZeroCrossings {
    /// Number of sign changes.
    pub count: usize,
    /// Position of the first sign change, in samples.
    pub first: f64,
    /// Position of the last sign change, in samples.
    pub last: f64,
}

impl ZeroCrossings {
    /// Converts the crossing statistics into a frequency.
    ///
    /// Two crossings make one period, so `count - 1` crossings spanning
    /// `last - first` samples give `0.5 * (count - 1)` periods.
    /// Returns `None` with fewer than two crossings.
    pub fn frequency(&self, sample_rate: f64) -> Option<f64> {
        if self.count <= 1 {
            return None;
        }
        let span = self.last - self.first;
        if span <= 0.0 {
            return None;
        }
        valid_frequency(sample_rate * 0.5 * (self.count - 1) as f64 / span)
    }
}

/// Counts the sign changes of `samples`.
///
/// A sample is positive when it is strictly greater than zero, so exact zeros
/// belong to the negative side. With `interpolate` set, each crossing is
/// placed between the two straddling samples by linear interpolation instead
/// of at the index of the sample that flipped the sign.
pub fn count_zero_crossings(samples: &[f64], interpolate: bool) -> ZeroCrossings {
    let mut crossings = ZeroCrossings {
        count: 0,
        first: 0.0,
        last: 0.0,
    };
    let Some(&first_sample) = samples.first() else {
        return crossings;
    };

    let mut positive = first_sample > 0.0;
    for (index, pair) in samples.windows(2).enumerate() {
        let (previous, current) = (pair[0], pair[1]);
        if (current > 0.0) == positive {
            continue;
        }
        positive = !positive;

        let position = if interpolate {
            // The two samples lie on opposite sides of zero, so the
            // denominator cannot vanish.
            index as f64 + previous / (previous - current)
        } else {
            (index + 1) as f64
        };

        if crossings.count == 0 {
            crossings.first = position;
        }
        crossings.last = position;
        crossings.count += 1;
    }
    crossings
}

/// Estimates pitch by counting sign changes over the block.
///
/// Cheap and accurate on clean periodic tones, but easily fooled by strong
/// harmonics or noise; the smoother downstream absorbs the outliers.
#[derive(Debug, Clone, Default)]
pub struct ZeroCrossingEstimator {
    interpolate: bool,
}

impl ZeroCrossingEstimator {
    pub fn new(interpolate: bool) -> Self {
        Self { interpolate }
    }
}

impl Estimator for ZeroCrossingEstimator {
    fn name(&self) -> &'static str {
        "zero_crossing"
    }

    fn estimate(&mut self, samples: &[f64], sample_rate: f64) -> Option<f64> {
        count_zero_crossings(samples, self.interpolate).frequency(sample_rate)
    }
}
