//! # Smoothing Module
//!
//! Reduces a rolling window of raw frequency estimates to one robust value.
//!
//! Raw estimates from a single block are noisy: a zero-crossing count can
//! jump an octave on a strong harmonic, and silent blocks produce no estimate
//! at all. The smoother keeps the last `S` estimates, sorts a scratch copy,
//! trims a fraction from each end and averages the middle.

/// Value pushed into the window for a cycle without an estimate.
pub const NO_ESTIMATE: f64 = 0.0;

/// Rolling window of raw estimates with a trimmed-mean reduction.
#[derive(Debug, Clone)]
pub struct TrimmedMeanSmoother {
    window: Vec<f64>,
    /// Slot the next estimate is written to.
    next: usize,
    /// Number of slots written since construction or the last reset.
    filled: usize,
    ignore_non_positive: bool,
    scratch: Vec<f64>,
}

impl TrimmedMeanSmoother {
    /// Creates a window of `size` estimates.
    ///
    /// With `ignore_non_positive` set, non-positive entries ("no estimate"
    /// cycles) are skipped when averaging so gaps do not drag the result
    /// toward zero.
    ///
    /// # Panics
    /// * If `size` is zero
    pub fn new(size: usize, ignore_non_positive: bool) -> Self {
        assert!(size > 0, "smoothing window size must be non-zero");
        Self {
            window: vec![NO_ESTIMATE; size],
            next: 0,
            filled: 0,
            ignore_non_positive,
            scratch: Vec::with_capacity(size),
        }
    }

    /// Inserts a raw estimate, overwriting the oldest once the window is full.
    pub fn push(&mut self, estimate: f64) {
        self.window[self.next] = estimate;
        self.next = (self.next + 1) % self.window.len();
        self.filled = (self.filled + 1).min(self.window.len());
    }

    /// Inserts an estimator result, recording `None` as [`NO_ESTIMATE`].
    pub fn push_estimate(&mut self, estimate: Option<f64>) {
        self.push(estimate.unwrap_or(NO_ESTIMATE));
    }

    /// Trimmed mean of the window.
    ///
    /// Sorts the written entries, discards the lowest `floor(n * trim)` and
    /// everything from `ceil(n * (1 - trim))` upward, then averages what is
    /// left.
    ///
    /// # Returns
    /// * `Some(mean)` - The smoothed estimate
    /// * `None` - Nothing survived trimming and filtering
    pub fn value(&mut self, trim_fraction: f64) -> Option<f64> {
        let n = self.filled;
        if n == 0 {
            return None;
        }

        self.scratch.clear();
        self.scratch.extend_from_slice(&self.window[..n]);
        self.scratch.sort_by(f64::total_cmp);

        let trim = trim_fraction.clamp(0.0, 1.0);
        let low = (n as f64 * trim).floor() as usize;
        // ceil(n * (1 - trim)) == n - floor(n * trim) for integer n.
        let high = n.saturating_sub(low);

        let mut sum = 0.0;
        let mut count = 0usize;
        for &value in self.scratch.iter().take(high).skip(low) {
            if self.ignore_non_positive && value <= 0.0 {
                continue;
            }
            sum += value;
            count += 1;
        }

        if count == 0 {
            return None;
        }
        let mean = sum / count as f64;
        mean.is_finite().then_some(mean)
    }

    /// Forgets every estimate.
    pub fn reset(&mut self) {
        self.window.fill(NO_ESTIMATE);
        self.next = 0;
        self.filled = 0;
    }

    /// Number of estimates currently in the window.
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Capacity `S` of the window.
    pub fn window_size(&self) -> usize {
        self.window.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn smoother_with(values: &[f64], ignore_non_positive: bool) -> TrimmedMeanSmoother {
        let mut smoother = TrimmedMeanSmoother::new(values.len(), ignore_non_positive);
        for &value in values {
            smoother.push(value);
        }
        smoother
    }

    #[test]
    fn outlier_is_trimmed() {
        let mut smoother = smoother_with(&[100.0, 100.0, 100.0, 100.0, 10_000.0], true);
        assert_relative_eq!(smoother.value(0.2).unwrap(), 100.0);
    }

    #[test]
    fn non_positive_entries_are_ignored() {
        let mut smoother = smoother_with(&[440.0, -1.0, 440.0, 0.0, 440.0], true);
        assert_relative_eq!(smoother.value(0.2).unwrap(), 440.0);
    }

    #[test]
    fn basic_variant_keeps_non_positive_entries() {
        // Sorted: [-1, 0, 440, 440, 440]; trimming one from each end keeps
        // [0, 440, 440].
        let mut smoother = smoother_with(&[440.0, -1.0, 440.0, 0.0, 440.0], false);
        assert_relative_eq!(smoother.value(0.2).unwrap(), 880.0 / 3.0);
    }

    #[test]
    fn no_trim_is_plain_mean() {
        let mut smoother = smoother_with(&[1.0, 2.0, 3.0, 6.0], true);
        assert_relative_eq!(smoother.value(0.0).unwrap(), 3.0);
    }

    #[test]
    fn all_filtered_is_no_estimate() {
        let mut smoother = smoother_with(&[0.0, -5.0, 0.0], true);
        assert_eq!(smoother.value(0.25), None);
        assert_eq!(TrimmedMeanSmoother::new(4, true).value(0.25), None);
    }

    #[test]
    fn trimming_everything_is_no_estimate() {
        let mut smoother = smoother_with(&[1.0, 2.0, 3.0, 4.0], true);
        assert_eq!(smoother.value(0.5), None);
    }

    #[test]
    fn window_overwrites_oldest() {
        let mut smoother = TrimmedMeanSmoother::new(3, true);
        for value in [1000.0, 2000.0, 3000.0, 10.0, 20.0, 30.0] {
            smoother.push(value);
        }
        assert_eq!(smoother.len(), 3);
        assert_relative_eq!(smoother.value(0.0).unwrap(), 20.0);
    }

    #[test]
    fn partially_filled_window_uses_written_slots_only() {
        let mut smoother = TrimmedMeanSmoother::new(64, true);
        smoother.push_estimate(Some(220.0));
        smoother.push_estimate(None);
        smoother.push_estimate(Some(230.0));
        assert_eq!(smoother.len(), 3);
        assert_relative_eq!(smoother.value(0.25).unwrap(), 225.0);
    }

    #[test]
    fn reset_empties_the_window() {
        let mut smoother = smoother_with(&[5.0, 6.0], true);
        smoother.reset();
        assert!(smoother.is_empty());
        assert_eq!(smoother.value(0.0), None);
        assert_eq!(smoother.window_size(), 2);
    }
}
