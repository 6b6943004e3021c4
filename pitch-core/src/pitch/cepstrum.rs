use super::{Estimator, FrequencyRange, parabolic_peak, rms, valid_frequency};
use crate::fft;
use rustfft::num_complex::Complex;

/// Floor added to the power spectrum so empty bins have a finite logarithm.
const LOG_FLOOR: f64 = 1e-12;

/// Estimates pitch from the real cepstrum of the block.
///
/// The log power spectrum of a periodic signal ripples with a spacing equal
/// to the fundamental, so transforming it again produces a peak at the
/// period (the quefrency). Costs two FFTs per block, and analyses only the
/// most recent power-of-two samples it is given.
#[derive(Debug, Clone)]
pub struct CepstralEstimator {
    range: FrequencyRange,
    silence_threshold: f64,
}

impl CepstralEstimator {
    pub fn new(range: FrequencyRange, silence_threshold: f64) -> Self {
        Self {
            range,
            silence_threshold,
        }
    }

    /// Squared magnitudes of the real cepstrum of a power-of-two block.
    ///
    /// # Panics
    /// * If `block.len()` is not a power of two
    pub fn cepstrum(block: &[f64]) -> Vec<f64> {
        let log_power: Vec<Complex<f64>> = fft::forward_real(block)
            .iter()
            .map(|bin| Complex::new((bin.norm_sqr() + LOG_FLOOR).ln(), 0.0))
            .collect();
        fft::forward(&log_power)
            .iter()
            .map(|bin| bin.norm_sqr())
            .collect()
    }
}

impl Estimator for CepstralEstimator {
    fn name(&self) -> &'static str {
        "cepstrum"
    }

    fn estimate(&mut self, samples: &[f64], sample_rate: f64) -> Option<f64> {
        let block = fft::power_of_two_tail(samples);
        if block.len() < 4 || rms(block) < self.silence_threshold {
            return None;
        }
        let (min_lag, max_lag) = self.range.lag_range(sample_rate, block.len())?;

        let cepstrum = Self::cepstrum(block);
        let (peak_lag, peak) = (min_lag..=max_lag)
            .map(|lag| (lag, cepstrum[lag]))
            .max_by(|a, b| a.1.total_cmp(&b.1))?;
        if peak <= 0.0 {
            return None;
        }

        log::trace!("[CEPSTRUM] peak at lag {} ({:.3e})", peak_lag, peak);
        valid_frequency(sample_rate / parabolic_peak(&cepstrum, peak_lag))
    }
}
