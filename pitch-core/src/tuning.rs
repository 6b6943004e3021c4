//! # Musical Tuning Module
//!
//! Converts between frequencies and twelve-tone equal-tempered notes,
//! anchored at A4 = 440 Hz = MIDI note 69.
//!
//! ## Features
//! - Frequency to fractional MIDI note number
//! - Nearest note with octave and cents offset
//! - Nearest in-tune frequency for display
//! - Note name parsing ("A4", "C#3", "Bb2")
//! - Cent deviation between two frequencies

use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;

/// Reference pitch of A4 in Hz.
pub const A4_FREQUENCY: f64 = 440.0;
/// MIDI note number of A4.
pub const A4_MIDI: i32 = 69;

/// The twelve pitch classes, in table order starting at A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitchClass {
    A,
    ASharp,
    B,
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
}

impl PitchClass {
    const TABLE: [PitchClass; 12] = [
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
    ];

    /// Pitch class of a MIDI note number.
    ///
    /// MIDI numbers count from C, the table counts from A, hence the offset.
    pub fn from_midi(midi: i32) -> Self {
        Self::TABLE[(midi + 3).rem_euclid(12) as usize]
    }

    /// Sharp spelling, e.g. `"C#"`.
    pub fn name(self) -> &'static str {
        match self {
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
        }
    }

    /// Semitones above C.
    fn semitone(self) -> i32 {
        (Self::TABLE.iter().position(|&p| p == self).unwrap_or(0) as i32 + 9) % 12
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The nearest equal-tempered note to a frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteValue {
    pub pitch_class: PitchClass,
    pub octave: i32,
    /// Deviation from the note in cents, in `[-50, 50)`.
    pub cents: i32,
    /// MIDI number of the note.
    pub midi: i32,
}

impl NoteValue {
    /// Frequency implied by the note and its cents offset.
    pub fn frequency(&self) -> f64 {
        frequency_from_midi(self.midi as f64 + self.cents as f64 / 100.0)
    }

    /// Frequency of the note itself, without the cents offset.
    pub fn in_tune_frequency(&self) -> f64 {
        frequency_from_midi(self.midi as f64)
    }

    /// Note name with octave, e.g. `"A4"`.
    pub fn name(&self) -> String {
        format!("{}{}", self.pitch_class, self.octave)
    }
}

impl fmt::Display for NoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} {:+}¢", self.pitch_class, self.octave, self.cents)
    }
}

/// Fractional MIDI note number of a frequency: `69 + 12·log2(f / 440)`.
///
/// Returns `None` for non-positive or non-finite input.
pub fn midi_note_with_cents(frequency: f64) -> Option<f64> {
    if !(frequency.is_finite() && frequency > 0.0) {
        return None;
    }
    Some(A4_MIDI as f64 + 12.0 * (frequency / A4_FREQUENCY).log2())
}

/// Frequency of a (fractional) MIDI note number.
pub fn frequency_from_midi(midi: f64) -> f64 {
    A4_FREQUENCY * 2.0_f64.powf((midi - A4_MIDI as f64) / 12.0)
}

/// Finds the closest musical note to a given frequency.
///
/// The frequency is rounded to whole cents first and then split into the
/// nearest note and a remainder in `[-50, 50)`, so the note and the cents
/// always agree.
///
/// # Returns
/// * `Some(note)` - Nearest note with octave and cents offset
/// * `None` - The frequency was not positive and finite
pub fn to_note(frequency: f64) -> Option<NoteValue> {
    let midi_float = midi_note_with_cents(frequency)?;
    let total_cents = (midi_float * 100.0).round() as i64;
    let midi = (total_cents + 50).div_euclid(100);
    let cents = (total_cents - midi * 100) as i32;
    let midi = midi as i32;
    Some(NoteValue {
        pitch_class: PitchClass::from_midi(midi),
        octave: midi.div_euclid(12) - 1,
        cents,
        midi,
    })
}

/// The equal-tempered frequency of the note nearest to `frequency`.
///
/// `440 · 2^((round(midi) − 69) / 12)`; 446 Hz gives exactly 440 Hz.
pub fn nearest_in_tune_frequency(frequency: f64) -> Option<f64> {
    let midi = midi_note_with_cents(frequency)?.round();
    Some(frequency_from_midi(midi))
}

/// Calculates the deviation from a target frequency in cents.
///
/// Positive values are sharp, negative values flat.
pub fn cents_deviation(frequency: f64, target_frequency: f64) -> f64 {
    1200.0 * (frequency / target_frequency).log2()
}

/// Spellings accepted by [`midi_from_note_name`], mapped to semitones above C.
static PITCH_NAMES: Lazy<BTreeMap<&'static str, i32>> = Lazy::new(|| {
    let mut names: BTreeMap<&'static str, i32> = PitchClass::TABLE
        .iter()
        .map(|&pitch| (pitch.name(), pitch.semitone()))
        .collect();
    for (flat, semitone) in [("Db", 1), ("Eb", 3), ("Gb", 6), ("Ab", 8), ("Bb", 10)] {
        names.insert(flat, semitone);
    }
    names
});

/// Parses a note name such as `"A4"`, `"C#3"` or `"Bb-1"` into a MIDI number.
///
/// # Returns
/// * `Some(midi)` - MIDI note number (C4 = 60)
/// * `None` - The name was not recognised or the octave is out of range
pub fn midi_from_note_name(name: &str) -> Option<i32> {
    let name = name.trim();
    let split = name
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit() || *c == '-')
        .map(|(i, _)| i)?;
    let (pitch, octave) = name.split_at(split);
    let semitone = *PITCH_NAMES.get(pitch)?;
    let octave: i32 = octave.parse().ok()?;
    octave.checked_add(1)?.checked_mul(12)?.checked_add(semitone)
}
