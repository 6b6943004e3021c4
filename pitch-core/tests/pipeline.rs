use approx::assert_relative_eq;
use pitch_core::config::{AnalysisSource, PitchConfig};
use pitch_core::display::DisplaySlot;
use pitch_core::pipeline::{PitchPipeline, SampleBlock};
use pitch_core::pitch::EstimatorKind;
use pitch_core::signal;

const SAMPLE_RATE: f64 = 44_100.0;
const BLOCK: usize = 1024;

/// Splits a continuous tone into consecutive mono blocks.
fn blocks_of(frequency: f64, count: usize) -> Vec<SampleBlock> {
    signal::sine(frequency, BLOCK * count, SAMPLE_RATE)
        .chunks(BLOCK)
        .map(|chunk| SampleBlock::mono(chunk.to_vec()))
        .collect()
}

fn run(pipeline: &mut PitchPipeline, blocks: Vec<SampleBlock>) -> pitch_core::PitchReading {
    let mut reading = Default::default();
    for mut block in blocks {
        reading = pipeline.process(&mut block, SAMPLE_RATE, 100.0);
    }
    reading
}

#[test]
fn sine_converges_to_its_frequency() {
    let mut pipeline = PitchPipeline::new(PitchConfig::default()).unwrap();
    let reading = run(&mut pipeline, blocks_of(440.0, 20));

    let frequency = reading.frequency.unwrap();
    assert!((frequency - 440.0).abs() / 440.0 < 0.01, "{}", frequency);
    assert_eq!(reading.nearest_in_tune, Some(440.0));
    assert_eq!(reading.note.unwrap().name(), "A4");
}

#[test]
fn silence_has_no_reading() {
    let mut pipeline = PitchPipeline::new(PitchConfig::default()).unwrap();
    let silent = (0..5).map(|_| SampleBlock::mono(vec![0.0; BLOCK])).collect();
    let reading = run(&mut pipeline, silent);
    assert_eq!(reading.raw, None);
    assert_eq!(reading.frequency, None);
    assert_eq!(reading.note, None);
    assert!(pipeline.history().is_empty());
}

#[test]
fn smoothed_value_survives_short_gaps_and_outliers() {
    let mut pipeline = PitchPipeline::new(PitchConfig::default()).unwrap();
    run(&mut pipeline, blocks_of(440.0, 10));

    let octave_jump = run(&mut pipeline, blocks_of(880.0, 1));
    assert!((octave_jump.frequency.unwrap() - 440.0).abs() < 5.0);

    let silent = (0..3).map(|_| SampleBlock::mono(vec![0.0; BLOCK])).collect();
    let gap = run(&mut pipeline, silent);
    assert_eq!(gap.raw, None);
    assert!((gap.frequency.unwrap() - 440.0).abs() < 5.0);
}

#[test]
fn gain_is_applied_after_analysis() {
    let mut muted = PitchPipeline::new(PitchConfig::default()).unwrap();
    let mut full = PitchPipeline::new(PitchConfig::default()).unwrap();

    let original = blocks_of(330.0, 1).remove(0);
    let mut block_a = original.clone();
    let mut block_b = original.clone();

    let reading_a = muted.process(&mut block_a, SAMPLE_RATE, 0.0);
    let reading_b = full.process(&mut block_b, SAMPLE_RATE, 100.0);

    assert_eq!(reading_a, reading_b);
    assert!(reading_a.raw.is_some());
    assert!(block_a.channels[0].iter().all(|&s| s == 0.0));
    assert_eq!(block_b, original);

    let mut halved = original.clone();
    full.process(&mut halved, SAMPLE_RATE, 50.0);
    for (scaled, source) in halved.channels[0].iter().zip(&original.channels[0]) {
        assert_relative_eq!(*scaled, source * 0.5);
    }
}

#[test]
fn only_the_first_channel_is_analysed() {
    let mut pipeline = PitchPipeline::new(PitchConfig::default()).unwrap();
    let mut reading = Default::default();
    let left = signal::sine(220.0, BLOCK * 10, SAMPLE_RATE);
    let right = signal::sine(660.0, BLOCK * 10, SAMPLE_RATE);
    for (l, r) in left.chunks(BLOCK).zip(right.chunks(BLOCK)) {
        let mut block = SampleBlock {
            channels: vec![l.to_vec(), r.to_vec()],
        };
        reading = pipeline.process(&mut block, SAMPLE_RATE, 100.0);
    }
    let frequency: f64 = reading.frequency.unwrap();
    assert!((frequency - 220.0).abs() / 220.0 < 0.01, "{}", frequency);
}

#[test]
fn history_source_analyses_accumulated_samples() {
    let config = PitchConfig {
        estimator: EstimatorKind::Autocorrelation,
        analysis_source: AnalysisSource::History,
        history_capacity: 4096,
        ..PitchConfig::default()
    };
    let mut pipeline = PitchPipeline::new(config).unwrap();
    let reading = run(&mut pipeline, blocks_of(220.0, 8));

    assert!(pipeline.history().is_full());
    let frequency = reading.frequency.unwrap();
    assert!((frequency - 220.0).abs() / 220.0 < 0.02, "{}", frequency);
}

#[test]
fn history_source_without_recording_is_rejected() {
    let config = PitchConfig {
        analysis_source: AnalysisSource::History,
        record_history: false,
        ..PitchConfig::default()
    };
    assert_eq!(
        PitchPipeline::new(config).err(),
        Some(pitch_core::PitchError::HistoryNotRecorded)
    );
}

#[test]
fn history_recording_can_be_disabled() {
    let config = PitchConfig {
        record_history: false,
        ..PitchConfig::default()
    };
    let mut pipeline = PitchPipeline::new(config).unwrap();
    run(&mut pipeline, blocks_of(440.0, 2));
    assert!(pipeline.history().is_empty());
}

#[test]
fn reset_forgets_previous_estimates() {
    let mut pipeline = PitchPipeline::new(PitchConfig::default()).unwrap();
    run(&mut pipeline, blocks_of(440.0, 4));
    pipeline.reset();
    assert!(pipeline.smoother().is_empty());
    assert!(pipeline.history().is_empty());
}

#[test]
fn display_slot_mirrors_the_pipeline() {
    let slot = DisplaySlot::shared();
    let mut pipeline = PitchPipeline::new(PitchConfig::default()).unwrap();
    for mut block in blocks_of(446.0, 12) {
        let reading = pipeline.process(&mut block, SAMPLE_RATE, 100.0);
        slot.publish(&reading);
    }
    let shown = slot.latest();
    assert_eq!(shown.note.unwrap().name(), "A4");
    assert_eq!(shown.nearest_in_tune, Some(440.0));
}

#[test]
fn every_estimator_runs_in_the_pipeline() {
    for kind in EstimatorKind::ALL {
        let config = PitchConfig {
            estimator: kind,
            block_size: 4096,
            ..PitchConfig::default()
        };
        let mut pipeline = PitchPipeline::new(config).unwrap();
        assert_eq!(pipeline.estimator_name(), kind.as_str());
        let mut tone = SampleBlock::mono(signal::sine_with_harmonics(220.0, 4096, SAMPLE_RATE, 4));
        let reading = pipeline.process(&mut tone, SAMPLE_RATE, 100.0);
        if kind != EstimatorKind::Cepstrum {
            let frequency = reading.frequency.unwrap();
            assert!((frequency - 220.0).abs() / 220.0 < 0.05, "{}: {}", kind, frequency);
        }
    }
}
