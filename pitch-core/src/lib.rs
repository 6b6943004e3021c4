// pitch-core/src/lib.rs

//! The core logic of the live pitch estimator.
//! This crate is responsible for audio capture, pitch estimation,
//! smoothing and note conversion. It contains no display code.

pub mod accuracy;
pub mod audio;
pub mod buffer;
pub mod config;
pub mod display;
pub mod error;
pub mod fft;
pub mod pipeline;
pub mod pitch;
pub mod signal;
pub mod smoothing;
pub mod tuning;

pub use config::{AnalysisSource, PitchConfig};
pub use display::DisplaySlot;
pub use error::PitchError;
pub use pipeline::{PitchPipeline, PitchReading, SampleBlock};
pub use pitch::{Estimator, EstimatorKind, Instrument};
pub use tuning::NoteValue;
