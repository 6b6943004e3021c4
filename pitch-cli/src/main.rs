// pitch-cli/src/main.rs

//! # pitchcontrol
//!
//! Terminal front end for the live pitch estimator.
//!
//! ## Architecture
//! - **Audio thread**: owns the CPAL stream and the `PitchPipeline`, runs one
//!   processing cycle per captured block and publishes into a `DisplaySlot`
//! - **Main thread**: display subscriber, redraws the latest reading on a
//!   fixed tick until Enter is pressed or the duration elapses
//! - **Communication**: crossbeam channels for audio blocks and shutdown

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use cpal::traits::StreamTrait;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use pitch_core::accuracy::{self, AccuracySummary};
use pitch_core::pipeline::{PitchPipeline, PitchReading, SampleBlock};
use pitch_core::{DisplaySlot, EstimatorKind, Instrument, PitchConfig, audio, signal, tuning};

/// Blocks the capture callback may queue before it starts dropping them.
const AUDIO_QUEUE_DEPTH: usize = 8;

#[derive(Debug, Parser)]
#[command(name = "pitchcontrol", version, about = "Live pitch estimation from the default input device")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Track the pitch of the default input device.
    Listen(ListenArgs),
    /// Run the pipeline over a generated test signal.
    Simulate(SimulateArgs),
    /// Show the nearest note for a frequency, or the frequency of a note name.
    Note {
        /// A frequency in Hz ("446") or a note name ("A4", "C#3", "Bb2").
        value: String,
    },
}

#[derive(Debug, Args)]
struct PipelineArgs {
    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Estimator to use, overriding the configuration.
    #[arg(long)]
    estimator: Option<EstimatorKind>,
    /// Search band preset: piano, guitar, cello, violin, voice, bass_guitar or trumpet.
    #[arg(long)]
    instrument: Option<Instrument>,
}

#[derive(Debug, Args)]
struct ListenArgs {
    #[command(flatten)]
    pipeline: PipelineArgs,
    /// Gain applied to the captured audio, in percent.
    #[arg(long)]
    gain: Option<f64>,
    /// Display refresh interval.
    #[arg(long, default_value_t = 100)]
    refresh_ms: u64,
    /// Stop after this many seconds instead of waiting for Enter.
    #[arg(long)]
    duration_secs: Option<f64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Waveform {
    Sine,
    Saw,
    Square,
    Triangle,
    Harmonics,
}

#[derive(Debug, Args)]
struct SimulateArgs {
    #[command(flatten)]
    pipeline: PipelineArgs,
    #[arg(long, value_enum, default_value_t = Waveform::Sine)]
    waveform: Waveform,
    /// Frequency of the generated tone in Hz.
    #[arg(long)]
    frequency: f64,
    #[arg(long, default_value_t = 1.0)]
    seconds: f64,
    /// Overrides the configured sample rate.
    #[arg(long)]
    sample_rate: Option<u32>,
}

/// Audio worker thread management structure.
///
/// Owns the handle of the capture thread and the channel used to stop it.
struct AudioWorker {
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

impl AudioWorker {
    /// Spawns the capture thread. The CPAL stream is created on that thread
    /// and never leaves it.
    fn start(config: PitchConfig, gain_percent: f64, slot: Arc<DisplaySlot>) -> Result<Self> {
        let mut pipeline = PitchPipeline::new(config.clone())?;
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);

        let thread_handle = thread::spawn(move || {
            log::info!("[AUDIO-THREAD] Starting audio thread...");
            let (block_tx, block_rx) = crossbeam_channel::bounded::<SampleBlock>(AUDIO_QUEUE_DEPTH);

            let (stream, sample_rate) = match audio::start_audio_capture(block_tx, &config) {
                Ok(tuple) => tuple,
                Err(e) => {
                    log::error!("[AUDIO-THREAD] Fatal error starting audio: {:#}", e);
                    return;
                }
            };

            run_processing_loop(&mut pipeline, &block_rx, &shutdown_rx, sample_rate as f64, gain_percent, &slot);

            log::info!("[AUDIO-THREAD] Stopping stream and exiting...");
            if let Err(e) = stream.pause() {
                log::warn!("[AUDIO-THREAD] Error pausing stream: {}", e);
            }
            drop(stream);
            slot.clear();
            log::info!("[AUDIO-THREAD] Audio thread finished");
        });

        Ok(Self {
            shutdown_tx,
            thread_handle: Some(thread_handle),
        })
    }

    /// True once the thread has exited, e.g. because capture failed to start.
    fn is_finished(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_none_or(|handle| handle.is_finished())
    }

    fn stop(mut self) {
        let _ = self.shutdown_tx.try_send(());
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::error!("[MAIN] Audio thread panicked");
            }
        }
    }
}

fn run_processing_loop(
    pipeline: &mut PitchPipeline,
    block_rx: &Receiver<SampleBlock>,
    shutdown_rx: &Receiver<()>,
    sample_rate: f64,
    gain_percent: f64,
    slot: &DisplaySlot,
) {
    loop {
        crossbeam_channel::select! {
            recv(block_rx) -> msg => match msg {
                Ok(mut block) => {
                    let reading = pipeline.process(&mut block, sample_rate, gain_percent);
                    slot.publish(&reading);
                }
                Err(_) => {
                    log::warn!("[AUDIO-THREAD] Audio channel closed");
                    break;
                }
            },
            recv(shutdown_rx) -> _ => {
                log::info!("[AUDIO-THREAD] Received shutdown signal");
                break;
            },
        }
    }
}

/// Loads the configuration file (if any) and applies command-line overrides.
fn load_config(args: &PipelineArgs) -> Result<PitchConfig> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => PitchConfig::default(),
    };
    if let Some(estimator) = args.estimator {
        config.estimator = estimator;
    }
    if let Some(instrument) = args.instrument {
        config.set_instrument(instrument);
    }
    Ok(config)
}

fn read_config(path: &Path) -> Result<PitchConfig> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: PitchConfig = serde_json::from_str(&data)
        .with_context(|| format!("parsing config {}", path.display()))?;
    log::info!("[MAIN] Loaded config from {}", path.display());
    Ok(config)
}

/// One display line for a reading.
fn format_reading(reading: &PitchReading) -> String {
    match (reading.frequency, reading.note, reading.nearest_in_tune) {
        (Some(frequency), Some(note), Some(in_tune)) => {
            format!("{:9.2} Hz  {:<10} in tune: {:.2} Hz", frequency, note.to_string(), in_tune)
        }
        _ => format!("{:>9} Hz  {:<10} in tune: --", "--", "--"),
    }
}

/// Sends on the returned channel when a line arrives on stdin.
///
/// The channel disconnects without a message if stdin is closed.
fn spawn_enter_listener() -> Receiver<()> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let mut line = String::new();
        if matches!(std::io::stdin().read_line(&mut line), Ok(n) if n > 0) {
            let _ = tx.send(());
        }
    });
    rx
}

fn listen(args: ListenArgs) -> Result<()> {
    let config = load_config(&args.pipeline)?;
    let gain = args.gain.unwrap_or(config.gain_percent);
    let slot = DisplaySlot::shared();

    let worker = AudioWorker::start(config, gain, Arc::clone(&slot))?;
    let mut enter_rx = spawn_enter_listener();
    let refresh = Duration::from_millis(args.refresh_ms.max(1));
    let deadline = args
        .duration_secs
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .map(|duration| Instant::now() + duration);

    eprintln!("Listening... press Enter to stop.");
    let mut stdout = std::io::stdout();
    loop {
        match enter_rx.recv_timeout(refresh) {
            Ok(()) => break,
            Err(RecvTimeoutError::Timeout) => {}
            // No terminal to wait on; rely on the duration or Ctrl-C.
            Err(RecvTimeoutError::Disconnected) => enter_rx = crossbeam_channel::never(),
        }

        write!(stdout, "\r{}", format_reading(&slot.latest()))?;
        stdout.flush()?;
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            break;
        }
        if worker.is_finished() {
            writeln!(stdout)?;
            bail!("audio capture stopped unexpectedly");
        }
    }
    writeln!(stdout)?;

    log::info!("[MAIN] Shutting down audio worker");
    worker.stop();
    Ok(())
}

fn simulate(args: SimulateArgs) -> Result<()> {
    let mut config = load_config(&args.pipeline)?;
    if let Some(rate) = args.sample_rate {
        config.sample_rate = rate;
    }
    if !(args.frequency.is_finite() && args.frequency > 0.0) {
        bail!("frequency must be positive, got {}", args.frequency);
    }
    if !(args.seconds.is_finite() && args.seconds >= 0.0) {
        bail!("seconds must be finite and non-negative, got {}", args.seconds);
    }

    let sample_rate = config.sample_rate as f64;
    let length = (args.seconds * sample_rate) as usize;
    let samples = match args.waveform {
        Waveform::Sine => signal::sine(args.frequency, length, sample_rate),
        Waveform::Saw => signal::sawtooth(args.frequency, length, sample_rate),
        Waveform::Square => signal::square(args.frequency, length, sample_rate),
        Waveform::Triangle => signal::triangle(args.frequency, length, sample_rate),
        Waveform::Harmonics => signal::sine_with_harmonics(args.frequency, length, sample_rate, 8),
    };

    let block_size = config.block_size;
    let gain = config.gain_percent;
    let mut pipeline = PitchPipeline::new(config)?;
    let mut raw_summary = AccuracySummary::default();
    let mut reading = PitchReading::default();
    for chunk in samples.chunks_exact(block_size) {
        let mut block = SampleBlock::mono(chunk.to_vec());
        reading = pipeline.process(&mut block, sample_rate, gain);
        raw_summary.record(args.frequency, reading.raw);
    }

    println!(
        "{:?} {:.2} Hz, {} blocks of {} frames, estimator {}",
        args.waveform,
        args.frequency,
        raw_summary.trials,
        block_size,
        pipeline.estimator_name()
    );
    println!("final: {}", format_reading(&reading));

    if let Some(frequency) = reading.frequency {
        println!(
            "smoothed error: {:.3}% ({:.3} semitones), correct note: {}",
            accuracy::percentage_error(args.frequency, frequency) * 100.0,
            accuracy::midi_error(args.frequency, frequency).unwrap_or(f64::NAN),
            accuracy::within_100_cents(args.frequency, frequency)
        );
    }
    println!(
        "per block: {} misses, mean error {}, correct note {:.1}%, with octave errors {:.1}%",
        raw_summary.misses,
        raw_summary
            .mean_percentage_error()
            .map_or_else(|| "--".to_string(), |e| format!("{:.3}%", e * 100.0)),
        raw_summary.correct_note_rate() * 100.0,
        raw_summary.correct_with_octave_rate() * 100.0
    );
    Ok(())
}

fn note(value: &str) -> Result<()> {
    if let Ok(frequency) = value.parse::<f64>() {
        let Some(note) = tuning::to_note(frequency) else {
            bail!("{} Hz has no note; the frequency must be positive", value);
        };
        println!(
            "{:.2} Hz -> {} (MIDI {}), in tune at {:.2} Hz",
            frequency,
            note,
            note.midi,
            note.in_tune_frequency()
        );
        return Ok(());
    }

    let Some(midi) = tuning::midi_from_note_name(value) else {
        bail!("'{}' is neither a frequency nor a note name", value);
    };
    println!(
        "{} (MIDI {}) = {:.2} Hz",
        value.trim(),
        midi,
        tuning::frequency_from_midi(midi as f64)
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Listen(args) => listen(args),
        Command::Simulate(args) => simulate(args),
        Command::Note { value } => note(&value),
    }
}
