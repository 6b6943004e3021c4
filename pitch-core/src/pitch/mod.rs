//! # Pitch Detection Module
//!
//! Interchangeable fundamental-frequency estimators behind a single
//! [`Estimator`] trait, so the processing pipeline can switch strategy
//! without structural change.
//!
//! ## Estimators
//! - Zero-crossing counting (the primary, cheapest method)
//! - Autocorrelation and AMDF lag search
//! - Real cepstrum (two FFTs per block)
//! - Spectral peak picking and harmonic product spectrum
//!
//! Every estimator returns `None` when it has no reliable estimate
//! (silence, too few periods, no clear peak). Callers never see NaN or
//! infinite frequencies.

mod cepstrum;
mod correlation;
mod spectral;
mod zero_crossing;

pub use cepstrum::CepstralEstimator;
pub use correlation::{AmdfEstimator, AutocorrelationEstimator};
pub use spectral::{HarmonicProductEstimator, SpectralPeakEstimator};
pub use zero_crossing::{ZeroCrossingEstimator, count_zero_crossings};

use serde::{Deserialize, Serialize};

use crate::config::PitchConfig;

/// A fundamental-frequency estimation strategy.
pub trait Estimator: Send {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Estimates the fundamental frequency of a mono signal in Hz.
    ///
    /// # Returns
    /// * `Some(frequency)` - A finite, positive estimate
    /// * `None` - No reliable estimate for this block
    fn estimate(&mut self, samples: &[f64], sample_rate: f64) -> Option<f64>;
}

/// Selects which [`Estimator`] the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    #[default]
    ZeroCrossing,
    Autocorrelation,
    Amdf,
    Cepstrum,
    SpectralPeak,
    HarmonicProduct,
}

impl EstimatorKind {
    pub const ALL: [EstimatorKind; 6] = [
        EstimatorKind::ZeroCrossing,
        EstimatorKind::Autocorrelation,
        EstimatorKind::Amdf,
        EstimatorKind::Cepstrum,
        EstimatorKind::SpectralPeak,
        EstimatorKind::HarmonicProduct,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EstimatorKind::ZeroCrossing => "zero_crossing",
            EstimatorKind::Autocorrelation => "autocorrelation",
            EstimatorKind::Amdf => "amdf",
            EstimatorKind::Cepstrum => "cepstrum",
            EstimatorKind::SpectralPeak => "spectral_peak",
            EstimatorKind::HarmonicProduct => "harmonic_product",
        }
    }
}

impl std::str::FromStr for EstimatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EstimatorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown estimator '{}'", s))
    }
}

impl std::fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The band of fundamentals the lag and spectral estimators search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyRange {
    pub min: f64,
    pub max: f64,
}

impl FrequencyRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive lag range in samples for a signal of `len` samples.
    ///
    /// Lags never exceed half the signal, so at least two periods are
    /// compared. Returns `None` when the range is empty.
    pub fn lag_range(&self, sample_rate: f64, len: usize) -> Option<(usize, usize)> {
        let min_lag = ((sample_rate / self.max).floor() as usize).max(1);
        let max_lag = ((sample_rate / self.min).ceil() as usize).min(len / 2);
        (min_lag < max_lag).then_some((min_lag, max_lag))
    }
}

impl Default for FrequencyRange {
    fn default() -> Self {
        Self::new(40.0, 2000.0)
    }
}

/// Instruments with a preset fundamental range.
///
/// Each range spans the instrument's lowest to highest fundamental, widened
/// by 250 cents on both sides to absorb estimator bin error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    /// A0 to C8.
    Piano,
    /// E2 to E6, 24 frets.
    Guitar,
    /// C2 to A5.
    Cello,
    /// G3 to A7.
    Violin,
    /// F2 to A5, bass through soprano.
    Voice,
    /// E1 to E5, 24 frets.
    BassGuitar,
    /// F#3 to D6.
    Trumpet,
}

impl Instrument {
    pub const ALL: [Instrument; 7] = [
        Instrument::Piano,
        Instrument::Guitar,
        Instrument::Cello,
        Instrument::Violin,
        Instrument::Voice,
        Instrument::BassGuitar,
        Instrument::Trumpet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Instrument::Piano => "piano",
            Instrument::Guitar => "guitar",
            Instrument::Cello => "cello",
            Instrument::Violin => "violin",
            Instrument::Voice => "voice",
            Instrument::BassGuitar => "bass_guitar",
            Instrument::Trumpet => "trumpet",
        }
    }

    pub fn range(self) -> FrequencyRange {
        match self {
            Instrument::Piano => FrequencyRange::new(23.80, 4836.32),
            Instrument::Guitar => FrequencyRange::new(71.33, 1523.34),
            Instrument::Cello => FrequencyRange::new(56.61, 1016.71),
            Instrument::Violin => FrequencyRange::new(169.64, 4066.84),
            Instrument::Voice => FrequencyRange::new(75.57, 1016.71),
            Instrument::BassGuitar => FrequencyRange::new(35.66, 761.67),
            Instrument::Trumpet => FrequencyRange::new(160.12, 1357.15),
        }
    }
}

impl std::str::FromStr for Instrument {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Instrument::ALL
            .into_iter()
            .find(|instrument| instrument.as_str() == s)
            .ok_or_else(|| format!("unknown instrument '{}'", s))
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the estimator selected in `config`.
pub fn build_estimator(config: &PitchConfig) -> Box<dyn Estimator> {
    let range = config.frequency_range();
    let gate = config.silence_threshold;
    match config.estimator {
        EstimatorKind::ZeroCrossing => {
            Box::new(ZeroCrossingEstimator::new(config.interpolate_crossings))
        }
        EstimatorKind::Autocorrelation => Box::new(AutocorrelationEstimator::new(range, gate)),
        EstimatorKind::Amdf => Box::new(AmdfEstimator::new(range, gate, config.amdf_exponent)),
        EstimatorKind::Cepstrum => Box::new(CepstralEstimator::new(range, gate)),
        EstimatorKind::SpectralPeak => Box::new(SpectralPeakEstimator::new(range, gate)),
        EstimatorKind::HarmonicProduct => {
            Box::new(HarmonicProductEstimator::new(range, gate, config.harmonics))
        }
    }
}

/// Root-mean-square level of a signal; zero for empty input.
pub fn rms(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|&s| s * s).sum::<f64>() / signal.len() as f64).sqrt()
}

/// Refines the position of an extremum at `index` by fitting a parabola
/// through it and its two neighbours.
///
/// Falls back to `index` at the edges or when the three points are collinear.
pub(crate) fn parabolic_peak(values: &[f64], index: usize) -> f64 {
    if index == 0 || index + 1 >= values.len() {
        return index as f64;
    }
    let y1 = values[index - 1];
    let y2 = values[index];
    let y3 = values[index + 1];
    let denominator = y1 - 2.0 * y2 + y3;
    if denominator.abs() < f64::EPSILON {
        return index as f64;
    }
    let shift = (y1 - y3) / (2.0 * denominator);
    if shift.is_finite() && shift.abs() <= 1.0 {
        index as f64 + shift
    } else {
        index as f64
    }
}

/// Keeps only finite, positive frequencies.
pub(crate) fn valid_frequency(frequency: f64) -> Option<f64> {
    (frequency.is_finite() && frequency > 0.0).then_some(frequency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal;

    const SAMPLE_RATE: f64 = 44_100.0;

    #[test]
    fn estimator_kind_parses_its_own_names() {
        for kind in EstimatorKind::ALL {
            assert_eq!(kind.as_str().parse::<EstimatorKind>(), Ok(kind));
        }
        assert!("yin".parse::<EstimatorKind>().is_err());
    }

    #[test]
    fn lag_range_is_capped_by_signal_length() {
        let range = FrequencyRange::new(40.0, 2000.0);
        assert_eq!(range.lag_range(SAMPLE_RATE, 4096), Some((22, 1103)));
        assert_eq!(range.lag_range(SAMPLE_RATE, 512), Some((22, 256)));
        assert_eq!(range.lag_range(SAMPLE_RATE, 20), None);
    }

    #[test]
    fn instrument_ranges_cover_their_notes() {
        use crate::tuning::{frequency_from_midi, midi_from_note_name};

        let cases = [
            (Instrument::Piano, "A0", "C8"),
            (Instrument::Guitar, "E2", "E6"),
            (Instrument::Cello, "C2", "A5"),
            (Instrument::Violin, "G3", "A7"),
            (Instrument::Voice, "F2", "A5"),
            (Instrument::BassGuitar, "E1", "E5"),
            (Instrument::Trumpet, "F#3", "D6"),
        ];
        for (instrument, lowest, highest) in cases {
            let range = instrument.range();
            let low = frequency_from_midi(midi_from_note_name(lowest).unwrap() as f64);
            let high = frequency_from_midi(midi_from_note_name(highest).unwrap() as f64);
            // 250 cents of padding on each side, to within rounding.
            assert!((low / range.min - 2f64.powf(250.0 / 1200.0)).abs() < 1e-3, "{}", instrument);
            assert!((range.max / high - 2f64.powf(250.0 / 1200.0)).abs() < 1e-3, "{}", instrument);
            assert_eq!(instrument.as_str().parse::<Instrument>(), Ok(instrument));
        }
        assert!("kazoo".parse::<Instrument>().is_err());
    }

    #[test]
    fn parabolic_peak_finds_vertex() {
        // y = -(x - 2.25)^2
        let values: Vec<f64> = (0..5).map(|x| -(x as f64 - 2.25).powi(2)).collect();
        assert!((parabolic_peak(&values, 2) - 2.25).abs() < 1e-12);
        assert_eq!(parabolic_peak(&values, 0), 0.0);
        assert_eq!(parabolic_peak(&[1.0, 1.0, 1.0], 1), 1.0);
    }

    #[test]
    fn every_estimator_rejects_silence() {
        let silence = vec![0.0; 2048];
        for kind in EstimatorKind::ALL {
            let config = PitchConfig {
                estimator: kind,
                ..PitchConfig::default()
            };
            let mut estimator = build_estimator(&config);
            assert_eq!(estimator.estimate(&silence, SAMPLE_RATE), None, "{}", kind);
        }
    }

    #[test]
    fn estimators_track_a_harmonic_tone() {
        let tone = signal::sine_with_harmonics(220.0, 4096, SAMPLE_RATE, 4);
        // The cepstrum needs a richer spectrum than four partials; it has its
        // own pulse-train test.
        for kind in EstimatorKind::ALL
            .into_iter()
            .filter(|kind| *kind != EstimatorKind::Cepstrum)
        {
            let config = PitchConfig {
                estimator: kind,
                ..PitchConfig::default()
            };
            let mut estimator = build_estimator(&config);
            let estimate = estimator
                .estimate(&tone, SAMPLE_RATE)
                .unwrap_or_else(|| panic!("{} returned no estimate", kind));
            let error = (estimate - 220.0).abs() / 220.0;
            assert!(error < 0.05, "{} estimated {} Hz", kind, estimate);
        }
    }
}
