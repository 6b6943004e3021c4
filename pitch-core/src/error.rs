/// Errors raised while setting up a pitch pipeline.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PitchError {
    #[error("{name} must be non-zero")]
    ZeroCapacity { name: &'static str },

    #[error("trim fraction {0} is outside [0, 0.5)")]
    InvalidTrim(f64),

    #[error("invalid frequency range {min}..{max} Hz")]
    InvalidFrequencyRange { min: f64, max: f64 },

    #[error("sample rate {0} Hz must be positive")]
    InvalidSampleRate(f64),

    #[error("analysis_source is history but record_history is off")]
    HistoryNotRecorded,

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
