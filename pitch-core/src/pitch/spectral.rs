//! Frequency-domain estimators built on the in-crate FFT.
//!
//! Both prepare the most recent power-of-two block the same way (DC removal,
//! Hann window) and search only the bins inside the configured frequency
//! band.

use super::{Estimator, FrequencyRange, parabolic_peak, rms, valid_frequency};
use crate::fft;

/// Magnitude spectrum of the most recent power-of-two block, or `None` when
/// the block is too short or too quiet.
fn prepared_magnitudes(samples: &[f64], silence_threshold: f64) -> Option<(Vec<f64>, usize)> {
    let block = fft::power_of_two_tail(samples);
    if block.len() < 4 || rms(block) < silence_threshold {
        return None;
    }
    let mut processed = block.to_vec();
    fft::remove_dc_offset(&mut processed);
    fft::apply_hann_window(&mut processed);
    let magnitudes = fft::spectrum_to_magnitudes(&fft::forward_real(&processed));
    Some((magnitudes, block.len()))
}

/// Inclusive bin range covering `range` for an `n`-point transform.
fn bin_range(range: &FrequencyRange, sample_rate: f64, n: usize, last_bin: usize) -> Option<(usize, usize)> {
    let first = ((range.min * n as f64 / sample_rate).ceil() as usize).max(1);
    let last = ((range.max * n as f64 / sample_rate).floor() as usize).min(last_bin);
    (first <= last).then_some((first, last))
}

/// Parabolic refinement on the logarithm of the values around `bin`.
fn log_parabolic_peak(values: &[f64], bin: usize) -> f64 {
    if bin == 0 || bin + 1 >= values.len() {
        return bin as f64;
    }
    let logs = [values[bin - 1].ln(), values[bin].ln(), values[bin + 1].ln()];
    if logs.iter().any(|y| !y.is_finite()) {
        return bin as f64;
    }
    bin as f64 - 1.0 + parabolic_peak(&logs, 1)
}

/// Picks the strongest bin of the magnitude spectrum.
///
/// Works well for tones whose fundamental is also their loudest partial, and
/// reports a harmonic otherwise.
#[derive(Debug, Clone)]
pub struct SpectralPeakEstimator {
    range: FrequencyRange,
    silence_threshold: f64,
}

impl SpectralPeakEstimator {
    pub fn new(range: FrequencyRange, silence_threshold: f64) -> Self {
        Self {
            range,
            silence_threshold,
        }
    }
}

impl Estimator for SpectralPeakEstimator {
    fn name(&self) -> &'static str {
        "spectral_peak"
    }

    fn estimate(&mut self, samples: &[f64], sample_rate: f64) -> Option<f64> {
        let (magnitudes, n) = prepared_magnitudes(samples, self.silence_threshold)?;
        let (first, last) = bin_range(&self.range, sample_rate, n, magnitudes.len() - 2)?;

        let (peak_bin, peak) = (first..=last)
            .map(|bin| (bin, magnitudes[bin]))
            .max_by(|a, b| a.1.total_cmp(&b.1))?;
        if peak <= 0.0 {
            return None;
        }

        let refined = log_parabolic_peak(&magnitudes, peak_bin);
        valid_frequency(refined * sample_rate / n as f64)
    }
}

/// Harmonic Product Spectrum estimator.
///
/// Multiplies the magnitude spectrum with copies of itself decimated by
/// 2, 3, .. `harmonics`, so the partials of a harmonic tone reinforce the bin
/// of the fundamental even when the fundamental itself is weak. The product
/// is accumulated as a sum of logarithms.
#[derive(Debug, Clone)]
pub struct HarmonicProductEstimator {
    range: FrequencyRange,
    silence_threshold: f64,
    harmonics: usize,
    product: Vec<f64>,
}

impl HarmonicProductEstimator {
    pub fn new(range: FrequencyRange, silence_threshold: f64, harmonics: usize) -> Self {
        Self {
            range,
            silence_threshold,
            harmonics: harmonics.max(1),
            product: Vec::new(),
        }
    }
}

impl Estimator for HarmonicProductEstimator {
    fn name(&self) -> &'static str {
        "harmonic_product"
    }

    fn estimate(&mut self, samples: &[f64], sample_rate: f64) -> Option<f64> {
        let (magnitudes, n) = prepared_magnitudes(samples, self.silence_threshold)?;
        let usable = (magnitudes.len() - 1) / self.harmonics;
        let (first, last) = bin_range(&self.range, sample_rate, n, usable.saturating_sub(1))?;

        self.product.clear();
        self.product.extend((0..=usable).map(|bin| {
            (1..=self.harmonics)
                .map(|factor| (magnitudes[bin * factor] + f64::MIN_POSITIVE).ln())
                .sum::<f64>()
        }));

        let (peak_bin, _) = (first..=last)
            .map(|bin| (bin, self.product[bin]))
            .max_by(|a, b| a.1.total_cmp(&b.1))?;

        let refined = parabolic_peak(&self.product, peak_bin);
        valid_frequency(refined * sample_rate / n as f64)
    }
}
