//! Time-domain lag search estimators.
//!
//! Both compare the signal with lagged copies of itself over the lag range
//! implied by the configured frequency band, and refine the winning lag with
//! parabolic interpolation.

use super::{Estimator, FrequencyRange, parabolic_peak, rms, valid_frequency};

/// Picks the lag with the strongest autocorrelation `r[m] = Σ x[i]·x[i+m]`.
///
/// The sums are unnormalised, so longer lags (fewer overlapping terms) are
/// naturally penalised and the first period wins over its multiples.
#[derive(Debug, Clone)]
pub struct AutocorrelationEstimator {
    range: FrequencyRange,
    silence_threshold: f64,
    correlations: Vec<f64>,
}

impl AutocorrelationEstimator {
    pub fn new(range: FrequencyRange, silence_threshold: f64) -> Self {
        Self {
            range,
            silence_threshold,
            correlations: Vec::new(),
        }
    }
}

impl Estimator for AutocorrelationEstimator {
    fn name(&self) -> &'static str {
        "autocorrelation"
    }

    fn estimate(&mut self, samples: &[f64], sample_rate: f64) -> Option<f64> {
        if rms(samples) < self.silence_threshold {
            return None;
        }
        let (min_lag, max_lag) = self.range.lag_range(sample_rate, samples.len())?;

        self.correlations.clear();
        self.correlations.resize(max_lag + 2, 0.0);
        // One extra lag on each side so the peak can be interpolated at the
        // edges of the search range.
        let last = (max_lag + 1).min(samples.len() - 1);
        for lag in min_lag - 1..=last {
            self.correlations[lag] = samples[..samples.len() - lag]
                .iter()
                .zip(&samples[lag..])
                .map(|(a, b)| a * b)
                .sum();
        }

        let (best_lag, best) = (min_lag..=max_lag)
            .map(|lag| (lag, self.correlations[lag]))
            .max_by(|a, b| a.1.total_cmp(&b.1))?;
        if best <= 0.0 {
            return None;
        }

        let lag = parabolic_peak(&self.correlations, best_lag);
        valid_frequency(sample_rate / lag)
    }
}

/// Average Magnitude Difference Function estimator.
///
/// Scores each lag by the mean of `|x[i] - x[i+m]|^b` and takes the first
/// clear dip rather than the global minimum, which would otherwise favour a
/// multiple of the period that happens to land closer to an integer lag.
#[derive(Debug, Clone)]
pub struct AmdfEstimator {
    range: FrequencyRange,
    silence_threshold: f64,
    exponent: f64,
    differences: Vec<f64>,
}

/// A lag qualifies as a dip when its normalised difference is within this
/// distance of the global minimum.
const DIP_TOLERANCE: f64 = 0.05;

impl AmdfEstimator {
    pub fn new(range: FrequencyRange, silence_threshold: f64, exponent: f64) -> Self {
        Self {
            range,
            silence_threshold,
            exponent,
            differences: Vec::new(),
        }
    }
}

fn mean_difference(samples: &[f64], lag: usize, exponent: f64) -> f64 {
    let pairs = samples.len() - lag;
    let total: f64 = samples[..pairs]
        .iter()
        .zip(&samples[lag..])
        .map(|(a, b)| (a - b).abs().powf(exponent))
        .sum();
    total / pairs as f64
}

impl Estimator for AmdfEstimator {
    fn name(&self) -> &'static str {
        "amdf"
    }

    fn estimate(&mut self, samples: &[f64], sample_rate: f64) -> Option<f64> {
        if rms(samples) < self.silence_threshold {
            return None;
        }
        let (min_lag, max_lag) = self.range.lag_range(sample_rate, samples.len())?;

        self.differences.clear();
        self.differences.resize(max_lag + 2, 0.0);
        let last = (max_lag + 1).min(samples.len() - 1);
        for lag in min_lag - 1..=last {
            self.differences[lag] = mean_difference(samples, lag, self.exponent);
        }
        let differences = &self.differences;

        let window = &differences[min_lag..=max_lag];
        let max = window.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min = window.iter().cloned().fold(f64::INFINITY, f64::min);
        if max <= 0.0 {
            return None;
        }
        let threshold = min / max + DIP_TOLERANCE;

        let mut lag = (min_lag..=max_lag).find(|&lag| differences[lag] / max <= threshold)?;
        while lag < max_lag && differences[lag + 1] < differences[lag] {
            lag += 1;
        }

        // Interpolate the dip as a peak of the negated curve.
        let negated: Vec<f64> = differences[lag - 1..=lag + 1].iter().map(|d| -d).collect();
        let refined = lag as f64 - 1.0 + parabolic_peak(&negated, 1);
        valid_frequency(sample_rate / refined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal;

    const SAMPLE_RATE: f64 = 44_100.0;

    fn relative_error(estimate: f64, expected: f64) -> f64 {
        (estimate - expected).abs() / expected
    }

    #[test]
    fn autocorrelation_finds_sine_period() {
        let tone = signal::sine(440.0, 2048, SAMPLE_RATE);
        let estimate = AutocorrelationEstimator::new(FrequencyRange::default(), 1e-4)
            .estimate(&tone, SAMPLE_RATE)
            .unwrap();
        assert!(relative_error(estimate, 440.0) < 0.01, "{}", estimate);
    }

    #[test]
    fn autocorrelation_prefers_first_period_of_square_wave() {
        let tone = signal::square(330.0, 4096, SAMPLE_RATE);
        let estimate = AutocorrelationEstimator::new(FrequencyRange::default(), 1e-4)
            .estimate(&tone, SAMPLE_RATE)
            .unwrap();
        assert!(relative_error(estimate, 330.0) < 0.01, "{}", estimate);
    }

    #[test]
    fn amdf_avoids_octave_errors() {
        // 440 Hz has a period of ~100.23 samples; two, three and four
        // periods land closer to integer lags than one period does.
        let tone = signal::sine(440.0, 4096, SAMPLE_RATE);
        let estimate = AmdfEstimator::new(FrequencyRange::default(), 1e-4, 1.0)
            .estimate(&tone, SAMPLE_RATE)
            .unwrap();
        assert!(relative_error(estimate, 440.0) < 0.01, "{}", estimate);
    }

    #[test]
    fn amdf_squared_distance_tracks_sawtooth() {
        let tone = signal::sawtooth(196.0, 4096, SAMPLE_RATE);
        let estimate = AmdfEstimator::new(FrequencyRange::default(), 1e-4, 2.0)
            .estimate(&tone, SAMPLE_RATE)
            .unwrap();
        assert!(relative_error(estimate, 196.0) < 0.01, "{}", estimate);
    }

    #[test]
    fn too_short_for_the_range_is_no_estimate() {
        let tone = signal::sine(440.0, 32, SAMPLE_RATE);
        let range = FrequencyRange::new(40.0, 500.0);
        assert_eq!(
            AutocorrelationEstimator::new(range, 1e-4).estimate(&tone, SAMPLE_RATE),
            None
        );
        assert_eq!(
            AmdfEstimator::new(range, 1e-4, 1.0).estimate(&tone, SAMPLE_RATE),
            None
        );
    }
}
