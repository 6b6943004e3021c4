//! Error metrics for comparing an estimate against a known frequency.

use crate::tuning::midi_note_with_cents;

/// Relative error `|expected - actual| / expected`.
pub fn percentage_error(expected: f64, actual: f64) -> f64 {
    (expected - actual).abs() / expected
}

/// Absolute distance in semitones between two frequencies.
///
/// `None` if either frequency is not positive.
pub fn midi_error(expected: f64, actual: f64) -> Option<f64> {
    Some((midi_note_with_cents(expected)? - midi_note_with_cents(actual)?).abs())
}

/// Whether `actual` names the same note as `expected`, i.e. lies within a
/// 100-cent band centred on it.
pub fn within_100_cents(expected: f64, actual: f64) -> bool {
    midi_error(expected, actual).is_some_and(|error| error <= 0.5)
}

/// Like [`within_100_cents`] but also accepts an answer one octave off.
pub fn within_100_cents_with_octave_error(expected: f64, actual: f64) -> bool {
    midi_error(expected, actual)
        .is_some_and(|error| error <= 0.5 || (11.5..=12.5).contains(&error))
}

/// Running totals of the four metrics over many trials.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccuracySummary {
    pub trials: usize,
    /// Trials for which the estimator produced no frequency.
    pub misses: usize,
    total_percentage_error: f64,
    total_midi_error: f64,
    correct_notes: usize,
    correct_with_octave: usize,
}

impl AccuracySummary {
    pub fn record(&mut self, expected: f64, estimate: Option<f64>) {
        self.trials += 1;
        let Some((actual, midi)) = estimate.and_then(|f| Some((f, midi_error(expected, f)?)))
        else {
            self.misses += 1;
            return;
        };
        self.total_percentage_error += percentage_error(expected, actual);
        self.total_midi_error += midi;
        self.correct_notes += within_100_cents(expected, actual) as usize;
        self.correct_with_octave += within_100_cents_with_octave_error(expected, actual) as usize;
    }

    fn hits(&self) -> usize {
        self.trials - self.misses
    }

    /// Mean relative error over the trials that produced an estimate.
    pub fn mean_percentage_error(&self) -> Option<f64> {
        (self.hits() > 0).then(|| self.total_percentage_error / self.hits() as f64)
    }

    /// Mean semitone error over the trials that produced an estimate.
    pub fn mean_midi_error(&self) -> Option<f64> {
        (self.hits() > 0).then(|| self.total_midi_error / self.hits() as f64)
    }

    /// Fraction of all trials that named the right note.
    pub fn correct_note_rate(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.correct_notes as f64 / self.trials as f64
    }

    /// Fraction of all trials that named the right note, octave errors allowed.
    pub fn correct_with_octave_rate(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.correct_with_octave as f64 / self.trials as f64
    }
}
