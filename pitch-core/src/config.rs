//! Pipeline configuration.
//!
//! Loaded from JSON by the binary; every field has a default so a partial
//! file (or none at all) is valid.

use serde::{Deserialize, Serialize};

use crate::error::PitchError;
use crate::pitch::{EstimatorKind, FrequencyRange, Instrument};

/// Which samples the estimator analyses each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    /// Channel 0 of the incoming block.
    #[default]
    Block,
    /// A snapshot of the history buffer, oldest sample first.
    History,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchConfig {
    /// Frames per processing cycle delivered by the capture host.
    pub block_size: usize,
    /// Requested capture rate in Hz.
    pub sample_rate: u32,
    pub history_capacity: usize,
    /// Write channel 0 of each block into the history buffer.
    pub record_history: bool,
    pub analysis_source: AnalysisSource,
    /// Number of raw estimates the smoother keeps.
    pub window_size: usize,
    /// Fraction trimmed from each end of the sorted window, in `[0, 0.5)`.
    pub trim_fraction: f64,
    /// Skip non-positive ("no estimate") entries when averaging.
    pub ignore_non_positive: bool,
    pub estimator: EstimatorKind,
    pub interpolate_crossings: bool,
    pub min_frequency: f64,
    pub max_frequency: f64,
    /// Preset search band; replaces `min_frequency`/`max_frequency` when set.
    pub instrument: Option<Instrument>,
    /// RMS below which the lag and spectral estimators report nothing.
    pub silence_threshold: f64,
    pub amdf_exponent: f64,
    pub harmonics: usize,
    /// Gain used when the host does not supply one.
    pub gain_percent: f64,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            block_size: 1024,
            sample_rate: 44_100,
            history_capacity: 1024,
            record_history: true,
            analysis_source: AnalysisSource::Block,
            window_size: 64,
            trim_fraction: 0.25,
            ignore_non_positive: true,
            estimator: EstimatorKind::ZeroCrossing,
            interpolate_crossings: true,
            min_frequency: 40.0,
            max_frequency: 2000.0,
            instrument: None,
            silence_threshold: 1e-4,
            amdf_exponent: 1.0,
            harmonics: 4,
            gain_percent: 100.0,
        }
    }
}

impl PitchConfig {
    /// The band the lag and spectral estimators search.
    pub fn frequency_range(&self) -> FrequencyRange {
        match self.instrument {
            Some(instrument) => instrument.range(),
            None => FrequencyRange::new(self.min_frequency, self.max_frequency),
        }
    }

    /// Switches the search band to an instrument preset.
    pub fn set_instrument(&mut self, instrument: Instrument) {
        let range = instrument.range();
        self.instrument = Some(instrument);
        self.min_frequency = range.min;
        self.max_frequency = range.max;
    }

    pub fn validate(&self) -> Result<(), PitchError> {
        for (name, value) in [
            ("block_size", self.block_size),
            ("history_capacity", self.history_capacity),
            ("window_size", self.window_size),
            ("harmonics", self.harmonics),
        ] {
            if value == 0 {
                return Err(PitchError::ZeroCapacity { name });
            }
        }
        if self.sample_rate == 0 {
            return Err(PitchError::InvalidSampleRate(self.sample_rate as f64));
        }
        if !(0.0..0.5).contains(&self.trim_fraction) {
            return Err(PitchError::InvalidTrim(self.trim_fraction));
        }
        let range = self.frequency_range();
        let range_ok = range.min.is_finite()
            && range.max.is_finite()
            && range.min > 0.0
            && range.min < range.max;
        if !range_ok {
            return Err(PitchError::InvalidFrequencyRange {
                min: range.min,
                max: range.max,
            });
        }
        if self.analysis_source == AnalysisSource::History && !self.record_history {
            return Err(PitchError::HistoryNotRecorded);
        }
        if !(self.amdf_exponent.is_finite() && self.amdf_exponent > 0.0) {
            return Err(PitchError::Invalid(format!(
                "amdf_exponent {} must be positive",
                self.amdf_exponent
            )));
        }
        if !(self.silence_threshold.is_finite() && self.silence_threshold >= 0.0) {
            return Err(PitchError::Invalid(format!(
                "silence_threshold {} must be non-negative",
                self.silence_threshold
            )));
        }
        Ok(())
    }
}
