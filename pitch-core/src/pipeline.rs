//! # Processing Pipeline
//!
//! One processing cycle per host block:
//!
//! 1. Channel 0 is (optionally) recorded into the history buffer.
//! 2. The active estimator analyses channel 0, or a snapshot of the history,
//!    before any gain is applied.
//! 3. The raw estimate enters the smoothing window; its trimmed mean is the
//!    published frequency.
//! 4. The nearest in-tune frequency and note are derived from it.
//! 5. Gain is applied to every sample of every channel in place.
//!
//! The pipeline owns all of its buffers; they are allocated once and never
//! resized while a session runs.

use crate::buffer::CircularSampleBuffer;
use crate::config::{AnalysisSource, PitchConfig};
use crate::error::PitchError;
use crate::pitch::{Estimator, build_estimator};
use crate::smoothing::TrimmedMeanSmoother;
use crate::tuning::{self, NoteValue};

/// A planar block of audio: one sample vector per channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBlock {
    pub channels: Vec<Vec<f64>>,
}

impl SampleBlock {
    pub fn mono(samples: Vec<f64>) -> Self {
        Self {
            channels: vec![samples],
        }
    }

    /// Splits interleaved frames into planar channels.
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(interleaved: &[f32], channel_count: usize) -> Self {
        let channel_count = channel_count.max(1);
        let frames = interleaved.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in interleaved.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample as f64);
            }
        }
        Self { channels }
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// The channel the estimators analyse.
    pub fn primary(&self) -> &[f64] {
        self.channels.first().map_or(&[], Vec::as_slice)
    }

    /// Scales every sample of every channel by `gain_percent / 100`, with the
    /// gain clamped to `[0, 100]`.
    pub fn apply_gain(&mut self, gain_percent: f64) {
        let gain = if gain_percent.is_nan() {
            1.0
        } else {
            gain_percent.clamp(0.0, 100.0) / 100.0
        };
        for sample in self.channels.iter_mut().flatten() {
            *sample *= gain;
        }
    }
}

/// Outcome of one processing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PitchReading {
    /// Estimate for this block alone.
    pub raw: Option<f64>,
    /// Smoothed frequency in Hz.
    pub frequency: Option<f64>,
    /// Equal-tempered frequency of the note nearest to `frequency`.
    pub nearest_in_tune: Option<f64>,
    pub note: Option<NoteValue>,
}

impl PitchReading {
    /// Derives the in-tune frequency and note from a smoothed frequency.
    pub fn from_frequency(raw: Option<f64>, frequency: Option<f64>) -> Self {
        let frequency = frequency.filter(|f| f.is_finite() && *f > 0.0);
        Self {
            raw,
            frequency,
            nearest_in_tune: frequency.and_then(tuning::nearest_in_tune_frequency),
            note: frequency.and_then(tuning::to_note),
        }
    }
}

/// The owned state of a pitch-tracking session.
pub struct PitchPipeline {
    config: PitchConfig,
    estimator: Box<dyn Estimator>,
    history: CircularSampleBuffer,
    smoother: TrimmedMeanSmoother,
    snapshot: Vec<f64>,
}

impl PitchPipeline {
    pub fn new(config: PitchConfig) -> Result<Self, PitchError> {
        config.validate()?;
        log::info!(
            "[PIPELINE] estimator={} window={} trim={} source={:?}",
            config.estimator,
            config.window_size,
            config.trim_fraction,
            config.analysis_source
        );
        Ok(Self {
            estimator: build_estimator(&config),
            history: CircularSampleBuffer::new(config.history_capacity),
            smoother: TrimmedMeanSmoother::new(config.window_size, config.ignore_non_positive),
            snapshot: Vec::with_capacity(config.history_capacity),
            config,
        })
    }

    /// Runs one processing cycle over `block` and applies gain to it.
    pub fn process(
        &mut self,
        block: &mut SampleBlock,
        sample_rate: f64,
        gain_percent: f64,
    ) -> PitchReading {
        let input = block.primary();

        if self.config.record_history {
            self.history.extend_from_slice(input);
        }

        let raw = match self.config.analysis_source {
            AnalysisSource::Block => self.estimator.estimate(input, sample_rate),
            AnalysisSource::History => {
                self.history.copy_to(&mut self.snapshot);
                self.estimator.estimate(&self.snapshot, sample_rate)
            }
        };

        self.smoother.push_estimate(raw);
        let smoothed = self.smoother.value(self.config.trim_fraction);
        let reading = PitchReading::from_frequency(raw, smoothed);

        block.apply_gain(gain_percent);

        log::trace!(
            "[PIPELINE] {} frames raw={:?} smoothed={:?} note={:?}",
            block.frames(),
            raw,
            smoothed,
            reading.note.map(|note| note.to_string())
        );
        reading
    }

    /// Forgets the history and every smoothed estimate.
    pub fn reset(&mut self) {
        self.history.clear();
        self.smoother.reset();
    }

    pub fn config(&self) -> &PitchConfig {
        &self.config
    }

    pub fn estimator_name(&self) -> &'static str {
        self.estimator.name()
    }

    pub fn history(&self) -> &CircularSampleBuffer {
        &self.history
    }

    pub fn smoother(&self) -> &TrimmedMeanSmoother {
        &self.smoother
    }
}
